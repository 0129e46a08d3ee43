//! 页面驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS / 导航 / 截图"的能力。
//! 不认识 JobRecord / FormField，不处理业务流程。

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::error::AppError;

/// 页面驱动
pub struct PageDriver {
    page: Page,
    navigation_timeout: Duration,
}

impl PageDriver {
    /// 创建新的页面驱动
    pub fn new(page: Page, navigation_timeout_ms: u64) -> Self {
        Self {
            page,
            navigation_timeout: Duration::from_millis(navigation_timeout_ms),
        }
    }

    /// 获取 page 的引用（用于元素级操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 带超时的导航
    ///
    /// 所有导航等待都有界，超时转换为可恢复的导航错误
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        match timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(AppError::navigation_timeout(
                url,
                self.navigation_timeout.as_millis() as u64,
            )
            .into()),
        }
    }

    /// 当前页面地址
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    /// 当前页面标题
    pub async fn title(&self) -> Result<String> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 滚动到页面底部（触发增量加载）
    pub async fn scroll_to_bottom(&self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }

    /// 后退到上一页
    pub async fn go_back(&self) -> Result<()> {
        self.page.evaluate("history.back()").await?;
        Ok(())
    }

    /// 按下 Escape 键（关闭弹窗的兜底手段）
    pub async fn press_escape(&self) -> Result<()> {
        self.page
            .evaluate(
                "document.activeElement && document.activeElement.dispatchEvent(\
                 new KeyboardEvent('keydown', { key: 'Escape', bubbles: true }))",
            )
            .await?;
        Ok(())
    }

    /// 固定稳定等待：给异步渲染留出时间
    pub async fn settle(&self, ms: u64) {
        sleep(Duration::from_millis(ms)).await;
    }

    /// 保存页面截图
    pub async fn save_screenshot(&self, path: impl AsRef<Path>) -> Result<()> {
        self.page
            .save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
                path,
            )
            .await?;
        Ok(())
    }
}
