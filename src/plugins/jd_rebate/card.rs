use super::extract::clean_url;
use crate::debug;
use anyhow::{Result, bail};
use quick_xml::events::Event as XmlEvent;
use quick_xml::reader::Reader;
use regex::Regex;
use std::sync::OnceLock;

/// 京东商品详情页域名
const ITEM_HOSTS: [&str; 2] = ["item.jd.com", "item.m.jd.com"];

/// 小程序分享对应的 appmsg type
const MINI_PROGRAM_TYPES: [&str; 2] = ["33", "36"];

static SKU_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_sku_regex() -> &'static Regex {
    SKU_REGEX.get_or_init(|| Regex::new(r"sku=(\d+)").expect("Invalid Regex"))
}

/// appmsg 节点中与转链相关的字段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppMsg {
    pub msg_type: Option<String>,
    pub url: Option<String>,
    /// weappinfo/pagepath
    pub pagepath: Option<String>,
}

impl AppMsg {
    pub fn is_mini_program(&self) -> bool {
        self.msg_type
            .as_deref()
            .is_some_and(|t| MINI_PROGRAM_TYPES.contains(&t))
    }
}

/// 解析 XML 并返回第一个 appmsg 节点；没有 appmsg 时返回 Ok(None)
pub fn parse_appmsg(xml: &str) -> Result<Option<AppMsg>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // 当前所在的标签路径
    let mut path: Vec<String> = Vec::new();
    // appmsg 所在层级 (path 长度)
    let mut appmsg_depth: Option<usize> = None;
    let mut card: Option<AppMsg> = None;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                path.push(name);
                if card.is_none() && path.last().is_some_and(|n| n == "appmsg") {
                    appmsg_depth = Some(path.len());
                    card = Some(AppMsg::default());
                }
            }
            Ok(XmlEvent::Empty(e)) => {
                if card.is_none() && e.local_name().as_ref() == b"appmsg" {
                    card = Some(AppMsg::default());
                }
            }
            Ok(XmlEvent::End(_)) => {
                if appmsg_depth == Some(path.len()) {
                    appmsg_depth = None;
                }
                path.pop();
            }
            Ok(XmlEvent::Text(e)) => {
                let text = e.unescape()?;
                capture(&path, appmsg_depth, card.as_mut(), &text);
            }
            Ok(XmlEvent::CData(e)) => {
                let raw = e.into_inner();
                let text = String::from_utf8_lossy(&raw);
                capture(&path, appmsg_depth, card.as_mut(), &text);
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => bail!("XML 解析失败 (位置 {}): {}", reader.error_position(), e),
            _ => {}
        }
    }

    if !path.is_empty() {
        bail!("XML 标签未闭合: {}", path.join("/"));
    }

    Ok(card)
}

/// 记录 appmsg 直接子节点 type/url 以及 weappinfo/pagepath 的文本
fn capture(path: &[String], appmsg_depth: Option<usize>, card: Option<&mut AppMsg>, text: &str) {
    let (Some(depth), Some(card)) = (appmsg_depth, card) else {
        return;
    };
    if text.is_empty() || path.len() < depth {
        return;
    }

    let relative: Vec<&str> = path[depth..].iter().map(String::as_str).collect();
    let slot = match relative.as_slice() {
        ["type"] => &mut card.msg_type,
        ["url"] => &mut card.url,
        ["weappinfo", "pagepath"] => &mut card.pagepath,
        _ => return,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

// =============================
//      Extraction strategies
// =============================

type Strategy = fn(&AppMsg) -> Option<String>;

/// 按优先级排列，第一个返回链接的策略生效
const STRATEGIES: [(&str, Strategy); 3] = [
    ("item_url", item_url),
    ("mini_program_sku", mini_program_sku),
    ("card_url", card_url),
];

/// 常规商品链接分享
fn item_url(card: &AppMsg) -> Option<String> {
    let url = card.url.as_deref()?.trim();
    ITEM_HOSTS
        .iter()
        .any(|h| url.contains(h))
        .then(|| clean_url(url).to_string())
}

/// 京东小程序分享 (type 33/36)，从 pagepath 中提取 SKU 并构建标准商品链接
fn mini_program_sku(card: &AppMsg) -> Option<String> {
    if !card.is_mini_program() {
        return None;
    }
    let pagepath = card.pagepath.as_deref()?;
    let sku = get_sku_regex().captures(pagepath)?.get(1)?.as_str();
    Some(sku_to_url(sku))
}

/// 其它卡片：原样使用卡片 URL，后续再由链接模式校验
fn card_url(card: &AppMsg) -> Option<String> {
    let url = card.url.as_deref()?.trim();
    (!url.is_empty()).then(|| url.to_string())
}

pub fn sku_to_url(sku: &str) -> String {
    format!("https://item.jd.com/{}.html", sku)
}

/// 依次尝试各提取策略
pub fn extract_card_link(card: &AppMsg) -> Option<String> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let url = strategy(card)?;
        debug!(target: "Plugin/JdRebate", "XML 提取策略 [{}] 命中: {}", name, url);
        Some(url)
    })
}
