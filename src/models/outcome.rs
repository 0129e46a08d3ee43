//! 申请结果模型

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::job::JobRecord;

/// 申请决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// 已提交
    Submitted,
    /// 已跳过（含升级人工处理）
    Skipped,
    /// 处理失败
    Failed,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Decision::Submitted => "已提交",
            Decision::Skipped => "已跳过",
            Decision::Failed => "失败",
        };
        write!(f, "{}", s)
    }
}

/// 单个职位的申请结果
///
/// 每个职位只追加一条到审计日志，之后不再修改或删除
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationOutcome {
    pub job_id: Option<String>,
    pub title: String,
    pub company: String,
    pub url: Option<String>,
    pub decision: Decision,
    pub reason: String,
    pub timestamp: DateTime<Local>,
}

impl ApplicationOutcome {
    /// 从职位记录创建结果
    pub fn new(job: &JobRecord, decision: Decision, reason: impl Into<String>) -> Self {
        Self {
            job_id: job.id.clone(),
            title: job.title.clone(),
            company: job.company.clone(),
            url: job.url.clone(),
            decision,
            reason: reason.into(),
            timestamp: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::ApplyKind;

    #[test]
    fn test_outcome_serializes_decision_snake_case() {
        let job = JobRecord {
            id: Some("42".to_string()),
            title: "Rust Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            url: None,
            apply_kind: ApplyKind::EasyApply,
        };
        let outcome = ApplicationOutcome::new(&job, Decision::Skipped, "演示模式");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["decision"], "skipped");
        assert_eq!(json["job_id"], "42");
        assert_eq!(json["reason"], "演示模式");
    }
}
