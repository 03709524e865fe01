//! Slack Log Transport 主程序入口
//!
//! 从命令行把日志事件转发到 Slack

use anyhow::{Context, Result};
use clap::Parser;
use slack_log_transport::cli::args::{Args, Commands};
use slack_log_transport::cli::commands::{
    ChannelsCommand, Command, InitCommand, SendCommand, ValidateCommand, VersionCommand,
};
use slack_log_transport::config::{ConfigLoader, TomlConfigLoader};
use slack_log_transport::logging::{LogConfig, LoggingSystem};
use tracing::{debug, error};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 初始化日志系统
    let log_config = build_log_config(&args).await;
    let _logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    debug!("{} v{} 启动", slack_log_transport::APP_NAME, slack_log_transport::VERSION);

    // 执行命令
    if let Err(e) = execute_command(&args).await {
        error!("命令执行失败: {:#}", e);
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

/// 构建日志配置
///
/// 配置文件中的 `[logging]` 作为基础，命令行参数优先。
/// 配置文件缺失或无效时使用默认值，具体错误由命令本身报告。
async fn build_log_config(args: &Args) -> LogConfig {
    let mut log_config = match &args.command {
        Commands::Init { .. } | Commands::Version { .. } => LogConfig::default(),
        _ => TomlConfigLoader::new(true)
            .load_from_file(args.get_config_path())
            .await
            .map(|config| LogConfig::from_settings(&config.logging))
            .unwrap_or_default(),
    };

    if let Some(level) = args.log_level {
        log_config.level = level.into();
    } else if args.verbose {
        log_config.level = log::LevelFilter::Debug;
    }

    log_config
}

/// 执行CLI命令
async fn execute_command(args: &Args) -> Result<()> {
    let command: &dyn Command = match &args.command {
        Commands::Send { .. } => &SendCommand,
        Commands::Channels { .. } => &ChannelsCommand,
        Commands::Init { .. } => &InitCommand,
        Commands::Validate { .. } => &ValidateCommand,
        Commands::Version { .. } => &VersionCommand,
    };

    command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
}
