//! 申请审计日志服务 - 业务能力层
//!
//! 单一 JSON 数组文件，只追加不修改。每条结果提交后立即落盘，
//! 中途崩溃时文件仍是合法 JSON，已记录的轨迹不丢失。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::models::outcome::ApplicationOutcome;

/// 申请审计日志
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// 创建审计日志，指向磁盘上的 JSON 数组文件
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条申请结果
    ///
    /// 读整个数组、追加、整体重写到临时文件后改名覆盖，
    /// 任何时刻磁盘上的文件都是完整 JSON
    pub async fn append(&self, outcome: &ApplicationOutcome) -> Result<()> {
        let mut entries = self.load().await?;
        entries.push(outcome.clone());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("创建审计日志目录失败: {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(&entries).context("序列化审计日志失败")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("写入审计日志临时文件失败: {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("覆盖审计日志失败: {:?}", self.path))?;

        info!("💾 审计日志已追加 (累计 {} 条)", entries.len());
        Ok(())
    }

    /// 读取全部历史记录
    ///
    /// 文件不存在视为空数组；内容损坏则报错，不覆盖现场
    pub async fn load(&self) -> Result<Vec<ApplicationOutcome>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                let entries: Vec<ApplicationOutcome> = serde_json::from_str(&content)
                    .with_context(|| format!("审计日志不是合法 JSON 数组: {:?}", self.path))?;
                Ok(entries)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("审计日志不存在，从空数组开始");
                Ok(Vec::new())
            }
            Err(e) => Err(e).with_context(|| format!("读取审计日志失败: {:?}", self.path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{ApplyKind, JobRecord};
    use crate::models::outcome::Decision;

    fn outcome(title: &str, decision: Decision) -> ApplicationOutcome {
        let record = JobRecord {
            id: Some("42".to_string()),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            url: None,
            apply_kind: ApplyKind::EasyApply,
        };
        ApplicationOutcome::new(&record, decision, "测试")
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.json"));
        assert!(log.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_every_append_leaves_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        let log = AuditLog::new(&path);

        for i in 0..3 {
            log.append(&outcome("Rust Engineer", Decision::Submitted))
                .await
                .unwrap();

            // 每次追加后文件都必须是可解析的完整数组
            let raw = std::fs::read_to_string(&path).unwrap();
            let parsed: Vec<ApplicationOutcome> = serde_json::from_str(&raw).unwrap();
            assert_eq!(parsed.len(), i + 1);
        }
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.json"));

        log.append(&outcome("First", Decision::Submitted)).await.unwrap();
        log.append(&outcome("Second", Decision::Skipped)).await.unwrap();

        let entries = log.load().await.unwrap();
        assert_eq!(entries[0].title, "First");
        assert_eq!(entries[1].title, "Second");
    }

    #[tokio::test]
    async fn test_corrupted_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        std::fs::write(&path, "{ 不是数组").unwrap();

        let log = AuditLog::new(&path);
        assert!(log.load().await.is_err());
        // 损坏现场保持原样
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ 不是数组");
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.json");
        let log = AuditLog::new(&path);

        log.append(&outcome("Rust Engineer", Decision::Failed))
            .await
            .unwrap();

        assert!(!path.with_extension("json.tmp").exists());
    }
}
