//! 京东商品转链返利插件
//!
//! 识别文本与 XML 卡片消息中的京东商品链接，调用折京客转链接口生成带返利的推广文案并回复。
//! 处理成功时阻止后续插件；任何失败都只记录日志并放行原消息。

use crate::bot::Bot;
use crate::config::{AppConfig, RebateConfig};
use crate::event::{InboundMessage, is_group_id};
use crate::plugins::{EventResult, Plugin};
use crate::{debug, error, info, warn};
use anyhow::{Context as _, Result};
use futures_util::future::BoxFuture;
use regex::Regex;
use std::collections::HashMap;

pub mod card;
pub mod client;
pub mod extract;
pub mod format;

use client::RebateClient;

const TARGET: &str = "Plugin/JdRebate";

const AUTHOR: &str = "wspzf";

/// 先于普通插件执行
const PRIORITY: i32 = 10;

pub struct JdRebate {
    active: Option<Active>,
}

/// 已启用插件的运行时状态，构建后只读
struct Active {
    config: RebateConfig,
    link_regex: Regex,
    client: RebateClient,
}

/// 群消息需在允许列表中 (列表为空时不限制)，私聊始终允许
pub fn is_allowed_source(allowed_groups: &[String], from_wxid: &str) -> bool {
    if is_group_id(from_wxid)
        && !allowed_groups.is_empty()
        && !allowed_groups.iter().any(|g| g == from_wxid)
    {
        debug!(target: TARGET, "群组 {} 不在允许列表中，不处理", from_wxid);
        return false;
    }
    debug!(target: TARGET, "消息来源 {} 允许处理", from_wxid);
    true
}

impl JdRebate {
    pub fn new(config: RebateConfig) -> Self {
        if !config.enable {
            info!(target: TARGET, "京东转链插件未启用");
            return Self::disabled();
        }

        match Active::build(config) {
            Ok(active) => {
                info!(target: TARGET, "京东商品转链返利插件配置加载成功");
                info!(target: TARGET, "允许的群组列表: {:?}", active.config.allowed_groups);
                info!(target: TARGET, "京东链接匹配模式: {}", active.link_regex.as_str());
                info!(target: TARGET, "是否显示返利金额: {}", active.config.show_commission);
                Self {
                    active: Some(active),
                }
            }
            Err(e) => {
                error!(target: TARGET, "加载京东商品转链返利插件配置失败: {:#}", e);
                Self::disabled()
            }
        }
    }

    /// 配置加载失败时插件整体禁用
    pub fn from_load_result(result: Result<AppConfig>) -> Self {
        match result {
            Ok(cfg) => Self::new(cfg.basic),
            Err(e) => {
                error!(target: TARGET, "加载京东商品转链返利插件配置失败: {:#}", e);
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { active: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.active.is_some()
    }

    /// 处理文本消息；返回 true 允许后续插件处理，false 表示已处理
    pub async fn handle_text(&self, bot: &dyn Bot, message: &InboundMessage) -> bool {
        let Some(active) = &self.active else {
            debug!(target: TARGET, "京东转链插件未启用");
            return true;
        };
        debug!(target: TARGET, "收到文本消息: {}", message.content);

        if !is_allowed_source(&active.config.allowed_groups, &message.from_wxid) {
            return true;
        }
        active
            .process_text(bot, &message.from_wxid, &message.content)
            .await
    }

    /// 处理 XML 消息；返回值含义同 handle_text
    pub async fn handle_xml(&self, bot: &dyn Bot, message: &InboundMessage) -> bool {
        let Some(active) = &self.active else {
            debug!(target: TARGET, "京东转链插件未启用");
            return true;
        };
        debug!(target: TARGET, "收到XML消息");

        if !is_allowed_source(&active.config.allowed_groups, &message.from_wxid) {
            return true;
        }
        active
            .process_xml(bot, &message.from_wxid, &message.content)
            .await
    }

    /// 转换链接，返回完整转链文案
    pub async fn convert_link(&self, link: &str) -> Option<String> {
        self.active.as_ref()?.convert_link(link).await
    }

    /// 转换链接，只返回推广链接
    pub async fn convert_link_short(&self, link: &str) -> Option<String> {
        self.active.as_ref()?.convert_link_short(link).await
    }
}

impl Active {
    fn build(config: RebateConfig) -> Result<Self> {
        config.validate()?;
        let link_regex = Regex::new(&config.link_pattern)
            .with_context(|| format!("链接匹配模式无效: {}", config.link_pattern))?;
        let client = RebateClient::new(&config)?;
        Ok(Self {
            config,
            link_regex,
            client,
        })
    }

    /// 链接需从开头即匹配京东链接模式
    fn is_retailer_link(&self, url: &str) -> bool {
        self.link_regex.find(url).is_some_and(|m| m.start() == 0)
    }

    async fn process_text(&self, bot: &dyn Bot, from_wxid: &str, content: &str) -> bool {
        let candidates = extract::extract_links(&self.link_regex, content);
        if candidates.is_empty() {
            debug!(target: TARGET, "没有找到有效的京东链接，不处理");
            return true;
        }

        info!(target: TARGET, "检测到{}个京东链接，准备转链", candidates.len());

        if let [candidate] = candidates.as_slice() {
            debug!(target: TARGET, "处理单个链接: {}", candidate.cleaned);
            return match self.convert_link(&candidate.cleaned).await {
                Some(text) => !reply(bot, from_wxid, &text).await,
                None => true,
            };
        }

        // 重复链接只请求一次，原文中每处出现都会被替换
        let links = extract::distinct_links(&candidates);
        debug!(target: TARGET, "处理多个链接: {:?}", links);
        let mut converted: HashMap<String, String> = HashMap::new();
        for link in links {
            let result = self.convert_link_short(link).await;
            debug!(target: TARGET, "链接 {} 转换结果: {:?}", link, result);
            if let Some(short) = result {
                converted.insert(link.to_string(), short);
            }
        }

        if converted.is_empty() {
            return true;
        }

        let replaced = extract::replace_links(content, &candidates, &converted);
        !reply(bot, from_wxid, &replaced).await
    }

    async fn process_xml(&self, bot: &dyn Bot, from_wxid: &str, content: &str) -> bool {
        let card = match card::parse_appmsg(content) {
            Ok(Some(card)) => card,
            Ok(None) => {
                debug!(target: TARGET, "非商品分享XML消息，跳过处理");
                return true;
            }
            Err(e) => {
                error!(target: TARGET, "处理XML消息时出错: {:#}", e);
                return true;
            }
        };
        debug!(target: TARGET, "解析到的 XML 类型: {:?}", card.msg_type);

        let url = match card::extract_card_link(&card) {
            Some(url) if self.is_retailer_link(&url) => url,
            _ => {
                debug!(target: TARGET, "未能提取有效的京东链接或非京东链接");
                return true;
            }
        };
        info!(target: TARGET, "从XML消息中提取到京东商品链接: {}", url);

        match self.convert_link(&url).await {
            Some(text) => !reply(bot, from_wxid, &text).await,
            None => true,
        }
    }

    async fn convert_link(&self, link: &str) -> Option<String> {
        debug!(target: TARGET, "开始转换链接: {}", link);
        let item = self.fetch(link).await?;

        let short_url = item.short_url.trim();
        if short_url.is_empty() {
            warn!(target: TARGET, "API返回结果中无短链接");
            return None;
        }
        debug!(
            target: TARGET,
            "商品信息提取成功: 标题={}, 价格={}, 短链接={}",
            item.title, item.final_price, short_url
        );
        Some(format::format_product(
            &item,
            short_url,
            self.config.show_commission,
        ))
    }

    async fn convert_link_short(&self, link: &str) -> Option<String> {
        debug!(target: TARGET, "开始转换链接(短链): {}", link);
        let item = self.fetch(link).await?;
        let best = item.best_link().map(str::to_string);
        if best.is_none() {
            warn!(target: TARGET, "API返回结果中无有效链接");
        }
        best
    }

    async fn fetch(&self, link: &str) -> Option<client::ProductInfo> {
        match self.client.fetch_product(link).await {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(target: TARGET, "转链失败 [{}]: {:#}", link, e);
                None
            }
        }
    }
}

/// 发送回复，返回是否发送成功
async fn reply(bot: &dyn Bot, to_wxid: &str, content: &str) -> bool {
    match bot.send_text_message(to_wxid, content).await {
        Ok(()) => {
            info!(target: TARGET, "成功发送转链文案到 {}", to_wxid);
            true
        }
        Err(e) => {
            error!(target: TARGET, "发送转链文案到 {} 失败: {}", to_wxid, e);
            false
        }
    }
}

impl Plugin for JdRebate {
    fn name(&self) -> &str {
        "jd_rebate"
    }

    fn description(&self) -> &str {
        "京东商品转链返利插件 - 自动识别京东链接并生成带返利的推广链接"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn author(&self) -> &str {
        AUTHOR
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn on_text<'a>(
        &'a self,
        bot: &'a dyn Bot,
        msg: &'a InboundMessage,
    ) -> BoxFuture<'a, EventResult> {
        Box::pin(async move { EventResult::from_continue(self.handle_text(bot, msg).await) })
    }

    fn on_xml<'a>(
        &'a self,
        bot: &'a dyn Bot,
        msg: &'a InboundMessage,
    ) -> BoxFuture<'a, EventResult> {
        Box::pin(async move { EventResult::from_continue(self.handle_xml(bot, msg).await) })
    }
}
