use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, BrowserError};

/// 附加到已在调试端口上运行的浏览器并获取页面
///
/// 操作员可以提前手工打开浏览器完成登录，引擎直接复用该会话。
/// 指定了 `url_marker` 时优先复用地址包含该标记的已有页面。
pub async fn connect_to_browser_and_page(
    port: u16,
    url_marker: Option<&str>,
) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::browser_connection_failed(port, e)
    })?;
    debug!("浏览器连接成功");

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

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    if let Some(marker) = url_marker {
        for p in pages.iter() {
            if let Ok(Some(url)) = p.url().await {
                if url.contains(marker) {
                    info!("✓ 复用已有页面: {}", url);
                    return Ok((browser, p.clone()));
                }
            }
        }
        debug!("未找到地址包含 '{}' 的页面，创建新页面", marker);
    }

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        AppError::Browser(BrowserError::PageCreationFailed {
            source: Box::new(e),
        })
    })?;

    Ok((browser, page))
}
