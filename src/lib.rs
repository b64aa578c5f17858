// lib.rs
//
// ================================================================================
// jd-rebate - 京东商品转链返利插件
//
// 入站消息 -> 来源过滤 -> 链接提取 (文本/XML 卡片) -> 转链 API -> 回复并拦截
// ================================================================================

pub mod log;

pub mod adapters;
pub mod bot;
pub mod config;
pub mod event;
pub mod plugins;

pub mod prelude {
    pub use crate::bot::{Bot, BotError};
    pub use crate::config::{AppConfig, RebateConfig};
    pub use crate::event::{InboundMessage, MessageKind};
    pub use crate::plugins::jd_rebate::JdRebate;
    pub use crate::plugins::logger::ChatLogger;
    pub use crate::plugins::{EventResult, Pipeline, Plugin};
}
