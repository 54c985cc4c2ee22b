use anyhow::Result;
use auto_publisher::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init(config.verbose_logging);

    // 初始化并运行应用
    let outcome = App::initialize(config).await?.run().await?;

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
