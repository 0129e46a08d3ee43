//! 截图留存服务 - 业务能力层
//!
//! 外站申请和升级场景留一张现场截图，方便之后人工接手。
//! 截图是尽力而为：任何失败只告警，不影响主流程。

use std::path::PathBuf;

use chrono::Local;
use tracing::{info, warn};

use crate::infrastructure::PageDriver;

/// 截图留存服务
pub struct ScreenshotSink {
    dir: PathBuf,
}

impl ScreenshotSink {
    /// 创建截图服务，图片统一落在指定目录
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 捕获当前页面截图
    ///
    /// # 返回
    /// 成功返回文件路径；失败告警后返回 None
    pub async fn capture(&self, driver: &PageDriver, seq: usize, label: &str) -> Option<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!("⚠️ 创建截图目录失败: {}", e);
            return None;
        }

        let filename = format!(
            "{:03}_{}_{}.png",
            seq,
            sanitize_label(label),
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let path = self.dir.join(filename);

        match driver.save_screenshot(&path).await {
            Ok(()) => {
                info!("📸 截图已保存: {:?}", path);
                Some(path)
            }
            Err(e) => {
                warn!("⚠️ 截图失败: {}", e);
                None
            }
        }
    }
}

/// 文件名里只保留安全字符
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    cleaned.chars().take(40).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_sanitize_strips_path_chars() {
        assert_eq!(sanitize_label("Acme/Corp: 工程师"), "Acme_Corp__工程师");
    }

    #[test]
    fn test_sanitize_truncates_long_labels() {
        let long = "a".repeat(100);
        assert_eq!(sanitize_label(&long).chars().count(), 40);
    }

    #[test]
    fn test_sink_path_layout() {
        let sink = ScreenshotSink::new("shots");
        assert_eq!(sink.dir, Path::new("shots"));
    }
}
