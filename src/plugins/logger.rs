use crate::bot::Bot;
use crate::event::{InboundMessage, MessageKind};
use crate::info;
use crate::plugins::{EventResult, Plugin};
use futures_util::future::BoxFuture;

/// XML 内容在日志中只显示前若干字符
const XML_PREVIEW_CHARS: usize = 60;

/// 聊天日志插件：记录所有入站消息，始终放行
pub struct ChatLogger;

fn preview(msg: &InboundMessage) -> String {
    match msg.kind {
        MessageKind::Text => msg.content.clone(),
        MessageKind::Xml => {
            let compact: String = msg
                .content
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            let mut chars = compact.chars();
            let head: String = chars.by_ref().take(XML_PREVIEW_CHARS).collect();
            if chars.next().is_some() {
                format!("[XML] {}...", head)
            } else {
                format!("[XML] {}", head)
            }
        }
    }
}

fn log_inbound(msg: &InboundMessage) {
    if msg.is_group() {
        // 格式: 接收 <- 群聊 [Group] Content
        info!(target: "Chat", "接收 <- 群聊 [{}] {}", msg.from_wxid, preview(msg));
    } else {
        info!(target: "Chat", "接收 <- 私聊 [{}] {}", msg.from_wxid, preview(msg));
    }
}

impl Plugin for ChatLogger {
    fn name(&self) -> &str {
        "logger"
    }

    fn description(&self) -> &str {
        "记录收到的消息"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn on_text<'a>(
        &'a self,
        _bot: &'a dyn Bot,
        msg: &'a InboundMessage,
    ) -> BoxFuture<'a, EventResult> {
        log_inbound(msg);
        Box::pin(async { EventResult::Continue })
    }

    fn on_xml<'a>(
        &'a self,
        _bot: &'a dyn Bot,
        msg: &'a InboundMessage,
    ) -> BoxFuture<'a, EventResult> {
        log_inbound(msg);
        Box::pin(async { EventResult::Continue })
    }
}
