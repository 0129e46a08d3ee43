use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, BrowserError};

/// 注入到每个新文档的反检测脚本
///
/// 目标站点会把 webdriver 标记视为自动化信号
const STEALTH_INIT_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3] });
    window.chrome = { runtime: {} };
"#;

/// 启动浏览器并创建初始页面
///
/// # 参数
/// - `headless`: 是否无头模式（投递流程建议保持可见，便于操作员介入验证码）
pub async fn launch_browser(headless: bool) -> Result<(Browser, Page)> {
    info!("🚀 启动浏览器 (无头: {})...", headless);

    let mut builder = BrowserConfig::builder()
        .window_size(1920, 1080)
        .args(vec![
            "--no-sandbox",
            "--disable-blink-features=AutomationControlled",
            "--disable-dev-shm-usage",
        ]);

    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        anyhow::anyhow!("配置浏览器失败: {}", e)
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(BrowserError::LaunchFailed {
            source: Box::new(e),
        })
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        AppError::Browser(BrowserError::PageCreationFailed {
            source: Box::new(e),
        })
    })?;

    page.evaluate_on_new_document(STEALTH_INIT_SCRIPT)
        .await
        .map_err(|e| {
            error!("注入反检测脚本失败: {}", e);
            anyhow::anyhow!("注入反检测脚本失败: {}", e)
        })?;

    info!("✅ 浏览器就绪");
    Ok((browser, page))
}
