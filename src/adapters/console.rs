use crate::bot::{Bot, BotError};
use crate::event::{InboundMessage, MSG_TYPE_APPMSG};
use crate::plugins::Pipeline;
use crate::{info, warn};
use futures_util::future::BoxFuture;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

/// 默认模拟的私聊会话
const DEFAULT_WXID: &str = "wxid_console";

const MSG_TYPE_TEXT: i64 = 1;

// ================= 定义模拟数据结构 =================

#[derive(Serialize)]
struct MockMessage<'a> {
    #[serde(rename = "FromWxid")]
    from_wxid: &'a str,
    #[serde(rename = "Content")]
    content: &'a str,
    #[serde(rename = "MsgType")]
    msg_type: i64,
}

/// 将回复打印到控制台
pub struct ConsoleBot;

impl Bot for ConsoleBot {
    fn send_text_message<'a>(
        &'a self,
        to_wxid: &'a str,
        content: &'a str,
    ) -> BoxFuture<'a, Result<(), BotError>> {
        Box::pin(async move {
            println!("\x1b[36m[Bot Reply -> {}] >\x1b[0m\n{}", to_wxid, content);
            Ok(())
        })
    }
}

/// 构造与宿主一致的消息结构，再解析回 InboundMessage
fn mock_event(from_wxid: &str, line: &str) -> Result<InboundMessage, BotError> {
    let msg_type = if line.starts_with('<') {
        MSG_TYPE_APPMSG
    } else {
        MSG_TYPE_TEXT
    };
    let mock = MockMessage {
        from_wxid,
        content: line,
        msg_type,
    };

    let mut json_bytes = simd_json::to_vec(&mock)?;
    let event = simd_json::to_owned_value(&mut json_bytes)?;
    InboundMessage::from_event(&event).ok_or_else(|| "模拟消息缺少 FromWxid".into())
}

/// 解析 `/from <wxid>` 指令，返回去除空白后的 wxid；非该指令返回 None
fn parse_from_command(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("/from")?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

/// 控制台适配器：逐行读取标准输入并送入插件流水线
/// - `/from <wxid>` 切换模拟会话 (以 @chatroom 结尾视为群聊)
/// - 以 `<` 开头的行视为 XML 消息
pub async fn run(pipeline: Pipeline) -> std::io::Result<()> {
    info!(target: "Console", "已启动控制台模式。直接输入消息，或 /from <wxid> 切换会话");
    info!(target: "Console", "当前会话: {}", DEFAULT_WXID);

    let bot = ConsoleBot;
    let mut from_wxid = DEFAULT_WXID.to_string();
    let mut reader = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = reader.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(wxid) = parse_from_command(line) {
            if wxid.is_empty() {
                warn!(target: "Console", "用法: /from <wxid>");
            } else {
                from_wxid = wxid.to_string();
                info!(target: "Console", "当前会话: {}", from_wxid);
            }
            continue;
        }

        let msg = match mock_event(&from_wxid, line) {
            Ok(m) => m,
            Err(e) => {
                warn!(target: "Console", "构造模拟消息失败: {}", e);
                continue;
            }
        };

        if pipeline.dispatch(&bot, &msg).await.should_continue() {
            info!(target: "Console", "消息未被插件处理");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MessageKind;

    #[test]
    fn plain_line_becomes_text_message() {
        let msg = mock_event("wxid_a", "看看 https://item.jd.com/1.html").unwrap();
        assert_eq!(msg.kind, MessageKind::Text);
        assert_eq!(msg.from_wxid, "wxid_a");
    }

    #[test]
    fn angle_bracket_line_becomes_xml_message() {
        let msg = mock_event("1@chatroom", "<msg><appmsg><type>33</type></appmsg></msg>").unwrap();
        assert_eq!(msg.kind, MessageKind::Xml);
        assert!(msg.is_group());
    }

    #[test]
    fn from_command_needs_whitespace_boundary() {
        assert_eq!(parse_from_command("/from 1@chatroom"), Some("1@chatroom"));
        assert_eq!(parse_from_command("/from"), Some(""));
        assert_eq!(parse_from_command("/fromxyz"), None);
        assert_eq!(parse_from_command("hello /from x"), None);
    }
}
