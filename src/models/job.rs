//! 职位记录模型

use serde::{Deserialize, Serialize};

/// 申请路径类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyKind {
    /// 站内快速申请（优先：可以端到端安全自动化）
    EasyApply,
    /// 跳转第三方站点申请（一律升级人工处理）
    External,
    /// 尚未检查
    Unknown,
}

impl std::fmt::Display for ApplyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApplyKind::EasyApply => "站内快速申请",
            ApplyKind::External => "外部申请",
            ApplyKind::Unknown => "未知",
        };
        write!(f, "{}", s)
    }
}

/// 发现阶段产出的职位记录
///
/// 除 `apply_kind` 在申请流程检查后细化一次外，发现之后不再修改。
/// 生命周期为一轮发现。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// 站点分配的职位 ID（可能缺失）
    pub id: Option<String>,
    /// 职位标题
    pub title: String,
    /// 公司名称
    pub company: String,
    /// 工作地点
    pub location: String,
    /// 职位详情链接（可能缺失）
    pub url: Option<String>,
    /// 申请路径类型
    pub apply_kind: ApplyKind,
}

impl JobRecord {
    /// 去重身份键
    ///
    /// 有站点 ID 时用 ID；否则用标准化后的 (标题, 公司) 组合键
    pub fn identity_key(&self) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => format!("id:{}", id),
            _ => format!(
                "tc:{}|{}",
                normalize_text(&self.title),
                normalize_text(&self.company)
            ),
        }
    }
}

/// 标准化文本：小写、压缩空白
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: Option<&str>, title: &str, company: &str) -> JobRecord {
        JobRecord {
            id: id.map(|s| s.to_string()),
            title: title.to_string(),
            company: company.to_string(),
            location: "Remote".to_string(),
            url: None,
            apply_kind: ApplyKind::Unknown,
        }
    }

    #[test]
    fn test_identity_prefers_site_id() {
        let a = record(Some("4001"), "Rust Engineer", "Acme");
        let b = record(Some("4001"), "Totally Different", "Other");
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_identity_composite_key_normalized() {
        let a = record(None, "Senior  Rust Engineer", "ACME Corp");
        let b = record(None, "senior rust engineer", "acme  corp");
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_empty_id_falls_back_to_composite() {
        let a = record(Some(""), "Rust Engineer", "Acme");
        assert!(a.identity_key().starts_with("tc:"));
    }

    #[test]
    fn test_different_company_different_key() {
        let a = record(None, "Rust Engineer", "Acme");
        let b = record(None, "Rust Engineer", "Globex");
        assert_ne!(a.identity_key(), b.identity_key());
    }
}
