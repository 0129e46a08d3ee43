//! 会话状态模型
//!
//! 认证产物（Cookie + localStorage 快照）由会话管理器独占读写：
//! 登录成功时写入，进程启动时读取，验证探测失败时作废。

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

/// 引擎关心的 Cookie 字段子集
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

/// 持久化的会话状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub cookies: Vec<CookieRecord>,
    /// localStorage 快照
    #[serde(default)]
    pub storage: BTreeMap<String, String>,
    pub saved_at: DateTime<Local>,
}

impl SessionState {
    pub fn new(cookies: Vec<CookieRecord>, storage: BTreeMap<String, String>) -> Self {
        Self {
            cookies,
            storage,
            saved_at: Local::now(),
        }
    }

    /// 从文件加载会话状态
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取会话文件: {}", path.display()))?;
        let state: SessionState = serde_json::from_str(&content)
            .with_context(|| format!("无法解析会话文件: {}", path.display()))?;
        debug!(
            "会话文件已加载: {} 个 Cookie, 保存于 {}",
            state.cookies.len(),
            state.saved_at.format("%Y-%m-%d %H:%M:%S")
        );
        Ok(state)
    }

    /// 原子写入会话状态
    ///
    /// 先写临时文件再重命名，进程在写入中途崩溃也不会损坏已有会话
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("无法创建目录: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self).context("序列化会话状态失败")?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &content)
            .await
            .with_context(|| format!("写入临时会话文件失败: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .await
            .with_context(|| format!("重命名会话文件失败: {}", path.display()))?;

        debug!("会话已保存至: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> SessionState {
        let cookies = vec![CookieRecord {
            name: "li_at".to_string(),
            value: "token-value".to_string(),
            domain: ".linkedin.com".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: true,
        }];
        let mut storage = BTreeMap::new();
        storage.insert("key".to_string(), "value".to_string());
        SessionState::new(cookies, storage)
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let state = sample_state();
        state.save(&path).await.unwrap();

        let loaded = SessionState::load(&path).await.unwrap();
        assert_eq!(loaded.cookies.len(), 1);
        assert_eq!(loaded.cookies[0].name, "li_at");
        assert_eq!(loaded.storage.get("key").map(String::as_str), Some("value"));
    }

    #[tokio::test]
    async fn test_save_is_atomic_no_tmp_left() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        sample_state().save(&path).await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/nested/session.json");

        sample_state().save(&path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_err() {
        assert!(SessionState::load("no/such/session.json").await.is_err());
    }
}
