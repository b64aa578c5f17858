use jd_rebate::adapters::console;
use jd_rebate::info;
use jd_rebate::prelude::*;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    jd_rebate::log::init_from_env();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    info!(target: "System", "使用配置文件: {}", config_path);

    let rebate = JdRebate::from_load_result(AppConfig::load(&config_path).await);

    let pipeline = Pipeline::new().plugin(ChatLogger).plugin(rebate);
    pipeline.log_summary();

    console::run(pipeline).await?;
    Ok(())
}
