use simd_json::OwnedValue;
use simd_json::derived::ValueObjectAccessAsScalar;

/// 宿主推送的原始消息 (至少包含 Content 与 FromWxid)
pub type Event = OwnedValue;

/// 微信 appmsg (卡片/小程序/链接分享) 的消息类型
pub const MSG_TYPE_APPMSG: i64 = 49;

/// 群聊会话 ID 后缀
pub const GROUP_SUFFIX: &str = "@chatroom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Xml,
}

/// 入站消息，仅在单次处理中存在
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub from_wxid: String,
    pub content: String,
    pub kind: MessageKind,
}

impl InboundMessage {
    pub fn text(from_wxid: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            from_wxid: from_wxid.into(),
            content: content.into(),
            kind: MessageKind::Text,
        }
    }

    pub fn xml(from_wxid: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            from_wxid: from_wxid.into(),
            content: content.into(),
            kind: MessageKind::Xml,
        }
    }

    /// 从宿主事件构建消息；缺少 FromWxid 时返回 None
    /// MsgType 为 49 视为 XML 消息，其余按文本处理
    pub fn from_event(event: &Event) -> Option<Self> {
        let from_wxid = event.get_str("FromWxid").filter(|s| !s.is_empty())?;
        let content = event.get_str("Content").unwrap_or("");
        let msg_type = event
            .get_i64("MsgType")
            .or_else(|| event.get_u64("MsgType").map(|v| v as i64));

        let kind = if msg_type == Some(MSG_TYPE_APPMSG) {
            MessageKind::Xml
        } else {
            MessageKind::Text
        };

        Some(Self {
            from_wxid: from_wxid.to_string(),
            content: content.to_string(),
            kind,
        })
    }

    /// 是否为群聊消息
    pub fn is_group(&self) -> bool {
        is_group_id(&self.from_wxid)
    }
}

pub fn is_group_id(wxid: &str) -> bool {
    wxid.ends_with(GROUP_SUFFIX)
}
