//! 频道解析模块
//!
//! 根据默认频道、级别主题和显式主题解析目标频道列表

use crate::config::types::SlackConfig;
use crate::notification::level::Level;

/// 频道的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// 配置的默认频道，受级别过滤
    Default,
    /// 主题映射的频道，不受级别过滤
    Topic,
}

/// 解析出的目标频道
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChannel {
    /// 频道名称
    pub name: String,
    /// 来源
    pub route: Route,
}

/// 解析目标频道及其来源
///
/// 顺序为：默认频道、与级别同名的主题频道、显式主题频道。
/// 同名频道只保留一个，只要有一种方式是主题路由就标记为 [`Route::Topic`]。
pub fn resolve_routes(
    config: &SlackConfig,
    level: Level,
    topic: Option<&str>,
) -> Vec<ResolvedChannel> {
    let mut resolved: Vec<ResolvedChannel> = Vec::new();

    let candidates = [
        (config.channel.as_deref(), Route::Default),
        (config.topics.get(level.as_str()).map(String::as_str), Route::Topic),
        (
            topic.and_then(|t| config.topics.get(t)).map(String::as_str),
            Route::Topic,
        ),
    ];

    for (name, route) in candidates {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };

        match resolved.iter_mut().find(|c| c.name == name) {
            Some(existing) => {
                if route == Route::Topic {
                    existing.route = Route::Topic;
                }
            }
            None => resolved.push(ResolvedChannel {
                name: name.to_string(),
                route,
            }),
        }
    }

    resolved
}

/// 解析目标频道名称（去重，保持顺序）
pub fn resolve_channels(config: &SlackConfig, level: Level, topic: Option<&str>) -> Vec<String> {
    resolve_routes(config, level, topic)
        .into_iter()
        .map(|c| c.name)
        .collect()
}
