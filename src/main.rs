use anyhow::Result;

use auto_job_apply::config::Config;
use auto_job_apply::orchestrator::App;
use auto_job_apply::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    let mut app = App::initialize(config).await?;
    app.run().await?;

    Ok(())
}
