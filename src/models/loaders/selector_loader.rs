//! 选择器配置加载器
//!
//! 从外部 TOML 文件加载角色到选择器列表的映射，按站点版本/日期标注。
//! 文件缺失或解析失败时退回内置默认表，保证引擎总有可用的定位策略。

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::{info, warn};

use crate::models::locator::{LocatorBook, Role};

/// 选择器配置文件结构
///
/// ```toml
/// version = "2025-08"
///
/// [roles]
/// "job-card" = ["li[data-occludable-job-id]", ".job-card-container"]
/// ```
#[derive(Debug, Deserialize)]
struct SelectorFile {
    version: Option<String>,
    #[serde(default)]
    roles: HashMap<String, Vec<String>>,
}

/// 从 TOML 文件加载选择器表
///
/// # 返回
/// 解析成功时返回在内置默认表上叠加覆盖后的表
pub async fn load_selector_book(path: impl AsRef<Path>) -> Result<LocatorBook> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取选择器配置: {}", path.display()))?;

    let file: SelectorFile = toml::from_str(&content)
        .with_context(|| format!("无法解析选择器配置: {}", path.display()))?;

    let mut book = LocatorBook::builtin();
    if let Some(version) = file.version {
        book.version = version;
    }

    let mut applied = 0usize;
    for (key, selectors) in file.roles {
        match Role::from_key(&key) {
            Some(role) => {
                if selectors.is_empty() {
                    warn!("角色 {} 的选择器列表为空，保留内置默认", key);
                    continue;
                }
                book.override_role(role, selectors);
                applied += 1;
            }
            None => warn!("忽略未知角色键: {}", key),
        }
    }

    info!(
        "✓ 选择器配置已加载: {} (版本: {}, 覆盖 {} 个角色)",
        path.display(),
        book.version,
        applied
    );
    Ok(book)
}

/// 加载选择器表，失败时退回内置默认
///
/// 热加载入口：运行中再次调用即可拿到最新配置
pub async fn load_or_builtin(path: impl AsRef<Path>) -> LocatorBook {
    let path = path.as_ref();
    match load_selector_book(path).await {
        Ok(book) => book,
        Err(e) => {
            warn!("⚠️ 选择器配置不可用 ({}), 使用内置默认表", e);
            LocatorBook::builtin()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reload_picks_up_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selectors.toml");

        std::fs::write(&path, "version = \"v1\"").unwrap();
        let book = load_or_builtin(&path).await;
        assert_eq!(book.version, "v1");

        // 运行中改写文件后再次调用，必须拿到新配置
        std::fs::write(
            &path,
            "version = \"v2\"\n\n[roles]\n\"job-card\" = [\".reloaded-card\"]",
        )
        .unwrap();
        let book = load_or_builtin(&path).await;
        assert_eq!(book.version, "v2");
        assert_eq!(book.selectors_for(Role::JobCard)[0].selector, ".reloaded-card");
    }

    #[tokio::test]
    async fn test_load_overrides_single_role() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "version = \"2025-08\"\n\n[roles]\n\"job-card\" = [\"li.fresh-card\", \"div.fresh-card\"]"
        )
        .unwrap();

        let book = load_selector_book(file.path()).await.unwrap();
        assert_eq!(book.version, "2025-08");
        let entries = book.selectors_for(Role::JobCard);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].selector, "li.fresh-card");
        // 未覆盖的角色保留内置默认
        assert!(!book.selectors_for(Role::EasyApplyButton).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_role_key_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[roles]\n\"flying-saucer\" = [\".ufo\"]").unwrap();

        let book = load_selector_book(file.path()).await.unwrap();
        assert_eq!(book.version, "builtin-2025");
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_builtin() {
        let book = load_or_builtin("definitely/not/here.toml").await;
        assert_eq!(book.version, "builtin-2025");
        assert!(!book.selectors_for(Role::JobCard).is_empty());
    }

    #[tokio::test]
    async fn test_broken_file_falls_back_to_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is {{ not toml").unwrap();

        let book = load_or_builtin(file.path()).await;
        assert_eq!(book.version, "builtin-2025");
    }
}
