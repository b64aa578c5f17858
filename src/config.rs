use anyhow::{Context as _, Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// 默认京东链接匹配模式 (非捕获组，保证返回完整链接)
pub const DEFAULT_LINK_PATTERN: &str = r"https?://[^\s<>]*(?:3\.cn|jd\.|jingxi|u\.jd\.com)[^\s<>]+";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    // 插件基础配置
    #[serde(default)]
    pub basic: RebateConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RebateConfig {
    // 是否启用插件
    #[serde(default)]
    pub enable: bool,

    // 折京客 appkey
    #[serde(default)]
    pub appkey: String,

    // 联盟 ID
    #[serde(default)]
    pub union_id: String,

    // 允许的群组列表 (为空时不限制)
    #[serde(default)]
    pub allowed_groups: Vec<String>,

    // signurl 参数，5 返回更详细信息
    #[serde(default = "default_signurl")]
    pub signurl: String,

    // chainType 参数，2 返回短链接
    #[serde(default = "default_chain_type")]
    pub chain_type: String,

    // 是否显示返利金额
    #[serde(default = "default_true")]
    pub show_commission: bool,

    // 转链 API 接口地址
    #[serde(default)]
    pub api_url: String,

    #[serde(default = "default_link_pattern")]
    pub link_pattern: String,

    // 转链请求超时 (秒)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_signurl() -> String {
    "5".to_string()
}

fn default_chain_type() -> String {
    "2".to_string()
}

fn default_true() -> bool {
    true
}

fn default_link_pattern() -> String {
    DEFAULT_LINK_PATTERN.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for RebateConfig {
    fn default() -> Self {
        Self {
            enable: false,
            appkey: String::new(),
            union_id: String::new(),
            allowed_groups: Vec::new(),
            signurl: default_signurl(),
            chain_type: default_chain_type(),
            show_commission: default_true(),
            api_url: String::new(),
            link_pattern: default_link_pattern(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RebateConfig {
    /// 校验启用状态下的必填项
    pub fn validate(&self) -> Result<()> {
        Regex::new(&self.link_pattern)
            .with_context(|| format!("链接匹配模式无效: {}", self.link_pattern))?;

        if !self.enable {
            return Ok(());
        }
        if self.api_url.trim().is_empty() {
            bail!("已启用插件但未配置 api_url");
        }
        if self.appkey.trim().is_empty() {
            bail!("已启用插件但未配置 appkey");
        }
        Ok(())
    }
}

impl AppConfig {
    /// 加载配置，如果文件不存在则写入默认配置 (插件默认关闭)
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !fs::try_exists(path).await.unwrap_or(false) {
            let default_cfg = AppConfig::default();
            default_cfg
                .save(path)
                .await
                .with_context(|| format!("无法写入默认配置: {}", path.display()))?;
            return Ok(default_cfg);
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(content).context("配置文件格式错误")?;
        cfg.basic.validate()?;
        Ok(cfg)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string).await?;
        Ok(())
    }
}
