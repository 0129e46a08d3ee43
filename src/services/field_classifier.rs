//! 字段分类服务 - 业务能力层
//!
//! 复杂表单升级前征询外部分类端点，获取更有信息量的升级原因。
//! 端点未配置或请求失败都不阻断流程，退回本地生成的说明。

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::job::JobRecord;
use crate::services::form_inspector::FormReport;

/// 分类请求载荷
#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    title: &'a str,
    company: &'a str,
    field_count: usize,
    census: String,
}

/// 分类响应
#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    reason: String,
}

/// 升级建议
#[derive(Debug)]
pub struct ClassifierAdvice {
    pub reason: String,
}

/// 字段分类服务
pub struct FieldClassifier {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl FieldClassifier {
    /// 创建新的分类服务
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            endpoint: config.classifier_endpoint.clone(),
            client,
        }
    }

    /// 为复杂表单生成升级建议
    ///
    /// 永不失败：端点缺失或出错时退回本地说明
    pub async fn advise(&self, job: &JobRecord, report: &FormReport) -> ClassifierAdvice {
        let local = local_reason(report.field_count(), &report.census_summary());

        let endpoint = match &self.endpoint {
            Some(url) => url,
            None => {
                debug!("未配置分类端点，使用本地升级说明");
                return ClassifierAdvice { reason: local };
            }
        };

        let request = ClassifyRequest {
            title: &job.title,
            company: &job.company,
            field_count: report.field_count(),
            census: report.census_summary(),
        };

        match self.post_classify(endpoint, &request).await {
            Ok(reason) if !reason.trim().is_empty() => ClassifierAdvice { reason },
            Ok(_) => ClassifierAdvice { reason: local },
            Err(e) => {
                warn!("⚠️ 分类端点请求失败: {}", e);
                ClassifierAdvice { reason: local }
            }
        }
    }

    async fn post_classify(
        &self,
        endpoint: &str,
        request: &ClassifyRequest<'_>,
    ) -> Result<String, reqwest::Error> {
        let response = self
            .client
            .post(endpoint)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<ClassifyResponse>()
            .await?;
        Ok(response.reason)
    }
}

/// 本地升级说明：必须点明字段数量
fn local_reason(field_count: usize, census: &str) -> String {
    format!("复杂表单: {} 个字段待人工处理 ({})", field_count, census)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_reason_names_field_count() {
        let reason = local_reason(5, "文本×3, 下拉选择×2");
        assert!(reason.contains("5 个字段"));
        assert!(reason.contains("下拉选择×2"));
    }
}
