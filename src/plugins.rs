use crate::bot::Bot;
use crate::event::{InboundMessage, MessageKind};
use crate::{debug, info};
use futures_util::future::BoxFuture;

pub mod jd_rebate;
pub mod logger;

/// 事件处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventResult {
    /// 继续传递事件给后续插件
    #[default]
    Continue,
    /// 停止传递事件（事件已被处理）
    Stop,
}

impl EventResult {
    /// 宿主约定：true 允许后续插件处理，false 阻止
    pub fn from_continue(flag: bool) -> Self {
        if flag {
            EventResult::Continue
        } else {
            EventResult::Stop
        }
    }

    pub fn should_continue(self) -> bool {
        self == EventResult::Continue
    }
}

/// 业务逻辑插件接口
pub trait Plugin: Send + Sync {
    /// 插件唯一标识
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn author(&self) -> &str {
        ""
    }

    /// 插件优先级（数字越小越先执行）
    fn priority(&self) -> i32 {
        100
    }

    /// 文本消息
    fn on_text<'a>(
        &'a self,
        _bot: &'a dyn Bot,
        _msg: &'a InboundMessage,
    ) -> BoxFuture<'a, EventResult> {
        Box::pin(async { EventResult::Continue })
    }

    /// XML 消息 (卡片分享、小程序等)
    fn on_xml<'a>(
        &'a self,
        _bot: &'a dyn Bot,
        _msg: &'a InboundMessage,
    ) -> BoxFuture<'a, EventResult> {
        Box::pin(async { EventResult::Continue })
    }
}

/// 按优先级排列的插件流水线
#[derive(Default)]
pub struct Pipeline {
    plugins: Vec<Box<dyn Plugin>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册插件；同优先级保持注册顺序
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self.plugins.sort_by_key(|p| p.priority());
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn log_summary(&self) {
        info!(target: "System", "正在加载插件系统 (共 {} 个)", self.plugins.len());
        for plugin in &self.plugins {
            info!(
                target: "Plugin",
                "✅ [{}] v{} 就绪 (priority {})",
                plugin.name(),
                plugin.version(),
                plugin.priority()
            );
            if !plugin.description().is_empty() {
                info!(target: "Plugin", "   {}", plugin.description());
            }
            if !plugin.author().is_empty() {
                info!(target: "Plugin", "   作者: {}", plugin.author());
            }
        }
    }

    /// 运行插件流水线，遇到 Stop 立即结束
    pub async fn dispatch(&self, bot: &dyn Bot, msg: &InboundMessage) -> EventResult {
        for plugin in &self.plugins {
            let result = match msg.kind {
                MessageKind::Text => plugin.on_text(bot, msg).await,
                MessageKind::Xml => plugin.on_xml(bot, msg).await,
            };
            if result == EventResult::Stop {
                debug!(target: "System", "[{}] 已处理消息，停止后续插件", plugin.name());
                return EventResult::Stop;
            }
        }
        EventResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::BotError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullBot;

    impl Bot for NullBot {
        fn send_text_message<'a>(
            &'a self,
            _to_wxid: &'a str,
            _content: &'a str,
        ) -> BoxFuture<'a, Result<(), BotError>> {
            Box::pin(async { Ok(()) })
        }
    }

    struct Probe {
        name: &'static str,
        priority: i32,
        result: EventResult,
        hits: Arc<AtomicUsize>,
    }

    impl Plugin for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn on_text<'a>(
            &'a self,
            _bot: &'a dyn Bot,
            _msg: &'a InboundMessage,
        ) -> BoxFuture<'a, EventResult> {
            Box::pin(async move {
                self.hits.fetch_add(1, Ordering::SeqCst);
                self.result
            })
        }
    }

    fn probe(name: &'static str, priority: i32, result: EventResult) -> (Probe, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        (
            Probe {
                name,
                priority,
                result,
                hits: hits.clone(),
            },
            hits,
        )
    }

    #[test]
    fn orders_by_priority() {
        let (a, _) = probe("late", 200, EventResult::Continue);
        let (b, _) = probe("early", 10, EventResult::Continue);
        let pipeline = Pipeline::new().plugin(a).plugin(b);
        assert_eq!(pipeline.names(), vec!["early", "late"]);
    }

    #[tokio::test]
    async fn stop_short_circuits() {
        let (first, first_hits) = probe("first", 10, EventResult::Stop);
        let (second, second_hits) = probe("second", 20, EventResult::Continue);
        let pipeline = Pipeline::new().plugin(second).plugin(first);

        let msg = InboundMessage::text("wxid_a", "hi");
        let result = pipeline.dispatch(&NullBot, &msg).await;

        assert_eq!(result, EventResult::Stop);
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn xml_messages_skip_text_handlers() {
        let (p, hits) = probe("text_only", 10, EventResult::Stop);
        let pipeline = Pipeline::new().plugin(p);

        let msg = InboundMessage::xml("wxid_a", "<msg/>");
        let result = pipeline.dispatch(&NullBot, &msg).await;

        assert_eq!(result, EventResult::Continue);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn bool_contract() {
        assert!(EventResult::from_continue(true).should_continue());
        assert!(!EventResult::from_continue(false).should_continue());
    }
}
