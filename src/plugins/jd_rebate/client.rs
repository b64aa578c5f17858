use crate::config::RebateConfig;
use crate::debug;
use anyhow::{Context as _, Result, bail};
use http::StatusCode;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 转链 API 成功状态码
const API_STATUS_OK: i64 = 200;

/// 转链 API 返回的商品信息
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ProductInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    /// 原价
    #[serde(rename = "size", default, deserialize_with = "lenient_string")]
    pub original_price: String,
    /// 券后价
    #[serde(rename = "quanhou_jiage", default, deserialize_with = "lenient_string")]
    pub final_price: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub coupon_info: String,
    #[serde(rename = "coupon_info_money", default, deserialize_with = "lenient_string")]
    pub coupon_amount: String,
    /// 佣金
    #[serde(rename = "tkfee3", default, deserialize_with = "lenient_string")]
    pub commission: String,
    #[serde(rename = "shorturl", default, deserialize_with = "lenient_string")]
    pub short_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub coupon_click_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_url: String,
}

impl ProductInfo {
    /// 依次取短链接、优惠券链接、商品链接中第一个非空值
    pub fn best_link(&self) -> Option<&str> {
        [&self.short_url, &self.coupon_click_url, &self.item_url]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

/// 字符串/数字/空值统一转为字符串
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// 折京客转链接口客户端
pub struct RebateClient {
    http: reqwest::Client,
    api_url: String,
    appkey: String,
    union_id: String,
    chain_type: String,
    signurl: String,
}

impl RebateClient {
    pub fn new(config: &RebateConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            api_url: config.api_url.trim().to_string(),
            appkey: config.appkey.clone(),
            union_id: config.union_id.clone(),
            chain_type: config.chain_type.clone(),
            signurl: config.signurl.clone(),
        })
    }

    /// 请求转链接口并返回第一个商品
    pub async fn fetch_product(&self, link: &str) -> Result<ProductInfo> {
        // materialId 需预先 URL 编码，查询串序列化时会再编码一次
        let encoded_link: String = url::form_urlencoded::byte_serialize(link.as_bytes()).collect();
        let params = [
            ("appkey", self.appkey.as_str()),
            ("materialId", encoded_link.as_str()),
            ("unionId", self.union_id.as_str()),
            ("chainType", self.chain_type.as_str()),
            ("signurl", self.signurl.as_str()),
        ];
        debug!(target: "Plugin/JdRebate", "请求转链: {} (materialId={})", link, encoded_link);

        let resp = self
            .http
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .context("转链 API 请求失败")?;

        let status = resp.status();
        if status != StatusCode::OK {
            bail!("转链 API 请求失败: HTTP {}", status);
        }

        let text = resp.text().await.context("读取 API 响应失败")?;
        parse_response(&text)
    }
}

/// 校验响应结构，返回第一个商品信息
pub fn parse_response(text: &str) -> Result<ProductInfo> {
    let body: Value = serde_json::from_str(text).context("解析 API 响应失败")?;

    match body.get("status").and_then(Value::as_i64) {
        Some(API_STATUS_OK) => {}
        Some(other) => bail!("API 返回无效结果: status={}", other),
        None => bail!("API 返回无效结果: 缺少 status"),
    }

    let first = body
        .get("content")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .context("API 返回的商品列表为空")?;

    ProductInfo::deserialize(first).context("商品信息格式错误")
}
