//! 表单检查服务 - 业务能力层
//!
//! 在申请弹窗范围内按字段类型做一次普查，产出字段清单和复杂度
//! 分级。普查同时清点弹窗里的全部表单控件：单选框、复选框这类
//! 引擎不认识的控件不能当作不存在。检查是只读的，不触碰任何
//! 字段的值。

use anyhow::Result;
use chromiumoxide::Element;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::ElementResolver;
use crate::models::form::{classify_complexity, FieldKind, FormComplexity, FormField};

/// 弹窗内全部可交互表单控件，hidden 和按钮类 input 除外
const ALL_CONTROLS_SELECTOR: &str =
    "input:not([type=\"hidden\"]):not([type=\"submit\"]):not([type=\"button\"]), select, textarea";

/// 表单检查报告
#[derive(Debug)]
pub struct FormReport {
    pub fields: Vec<FormField>,
    /// 弹窗里存在但类型不在已识别清单内的控件数
    pub unrecognized: usize,
    pub complexity: FormComplexity,
}

impl FormReport {
    /// 弹窗内控件总数，含未识别类型
    pub fn field_count(&self) -> usize {
        self.fields.len() + self.unrecognized
    }

    /// 清单里是否只有指定类型的字段，且没有任何未识别控件
    pub fn only_kind(&self, kind: FieldKind) -> bool {
        self.unrecognized == 0
            && !self.fields.is_empty()
            && self.fields.iter().all(|f| f.kind == kind)
    }

    /// 按类型汇总的人类可读描述，用于升级原因
    pub fn census_summary(&self) -> String {
        let mut parts = Vec::new();
        for kind in FieldKind::ALL {
            let n = self.fields.iter().filter(|f| f.kind == kind).count();
            if n > 0 {
                parts.push(format!("{}×{}", kind.name(), n));
            }
        }
        if self.unrecognized > 0 {
            parts.push(format!("未识别×{}", self.unrecognized));
        }
        if parts.is_empty() {
            "无字段".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// 表单检查服务
pub struct FormInspector {
    complexity_threshold: usize,
}

impl FormInspector {
    /// 创建新的检查服务
    pub fn new(config: &Config) -> Self {
        Self {
            complexity_threshold: config.form_complexity_threshold,
        }
    }

    /// 对弹窗范围做字段普查
    ///
    /// 逐类型解析输入元素，读取 required 标记；再清点弹窗内全部
    /// 控件，多出来的就是未识别类型，任何未识别控件都直接升级。
    /// 字段元素是瞬态句柄，报告只在当前弹窗存活期间有效。
    pub async fn inspect(
        &self,
        resolver: &ElementResolver,
        modal: &Element,
    ) -> Result<FormReport> {
        let mut fields = Vec::new();

        for kind in FieldKind::ALL {
            let elements = resolver.try_resolve_all_in(modal, kind.role()).await;
            for element in elements {
                let required = is_required(&element).await;
                debug!("🔍 字段: {} (必填: {})", kind.name(), required);
                fields.push(FormField {
                    kind,
                    required,
                    element,
                });
            }
        }

        let total = match modal.find_elements(ALL_CONTROLS_SELECTOR).await {
            Ok(elements) => elements.len(),
            Err(_) => fields.len(),
        };
        let unrecognized = total.saturating_sub(fields.len());
        if unrecognized > 0 {
            warn!("⚠️ 弹窗含 {} 个未识别类型的控件", unrecognized);
        }

        let complexity = grade_complexity(fields.len(), unrecognized, self.complexity_threshold);
        info!(
            "📋 表单普查: {} 个已识别字段, {} 个未识别, 复杂度 {:?}",
            fields.len(),
            unrecognized,
            complexity
        );

        Ok(FormReport {
            fields,
            unrecognized,
            complexity,
        })
    }
}

/// 复杂度定级
///
/// 引擎不猜它不认识的控件：只要有未识别类型就升级人工
fn grade_complexity(recognized: usize, unrecognized: usize, threshold: usize) -> FormComplexity {
    if unrecognized > 0 {
        FormComplexity::Complex
    } else {
        classify_complexity(recognized, threshold)
    }
}

/// 读取必填标记（required 或 aria-required）
async fn is_required(element: &Element) -> bool {
    if let Ok(Some(_)) = element.attribute("required").await {
        return true;
    }
    matches!(
        element.attribute("aria-required").await,
        Ok(Some(v)) if v == "true"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_census_summary_empty() {
        let report = FormReport {
            fields: Vec::new(),
            unrecognized: 0,
            complexity: FormComplexity::OneClick,
        };
        assert_eq!(report.census_summary(), "无字段");
        assert!(!report.only_kind(FieldKind::Phone));
        assert_eq!(report.field_count(), 0);
    }

    #[test]
    fn test_census_summary_names_unrecognized_controls() {
        let report = FormReport {
            fields: Vec::new(),
            unrecognized: 3,
            complexity: FormComplexity::Complex,
        };
        assert_eq!(report.census_summary(), "未识别×3");
        assert_eq!(report.field_count(), 3);
    }

    #[test]
    fn test_unrecognized_controls_escalate() {
        // 只有单选框/复选框的表单绝不能定级为一键申请
        assert_eq!(grade_complexity(0, 2, 3), FormComplexity::Complex);
        assert_eq!(grade_complexity(1, 1, 3), FormComplexity::Complex);
        assert_eq!(grade_complexity(3, 5, 3), FormComplexity::Complex);
    }

    #[test]
    fn test_fully_recognized_forms_grade_by_count() {
        assert_eq!(grade_complexity(0, 0, 3), FormComplexity::OneClick);
        assert_eq!(grade_complexity(2, 0, 3), FormComplexity::Simple);
        assert_eq!(grade_complexity(4, 0, 3), FormComplexity::Complex);
    }
}
