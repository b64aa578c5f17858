use futures_util::future::BoxFuture;

pub type BotError = Box<dyn std::error::Error + Send + Sync>;

/// 宿主提供的发送能力
pub trait Bot: Send + Sync {
    /// 向指定会话发送一条文本消息
    fn send_text_message<'a>(
        &'a self,
        to_wxid: &'a str,
        content: &'a str,
    ) -> BoxFuture<'a, Result<(), BotError>>;
}
