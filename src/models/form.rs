//! 申请表单字段模型
//!
//! 字段对象只在单次表单检查中存活，表单提交、跳过或关闭后即丢弃。

use chromiumoxide::Element;

use crate::models::locator::Role;

/// 表单字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Textarea,
    Select,
    File,
}

impl FieldKind {
    /// 全部已识别的字段类型
    pub const ALL: [FieldKind; 6] = [
        FieldKind::Text,
        FieldKind::Email,
        FieldKind::Phone,
        FieldKind::Textarea,
        FieldKind::Select,
        FieldKind::File,
    ];

    /// 对应的定位角色
    pub fn role(self) -> Role {
        match self {
            FieldKind::Text => Role::FormTextInput,
            FieldKind::Email => Role::FormEmailInput,
            FieldKind::Phone => Role::FormPhoneInput,
            FieldKind::Textarea => Role::FormTextarea,
            FieldKind::Select => Role::FormSelect,
            FieldKind::File => Role::FormFileInput,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::Text => "文本",
            FieldKind::Email => "邮箱",
            FieldKind::Phone => "电话",
            FieldKind::Textarea => "多行文本",
            FieldKind::Select => "下拉选择",
            FieldKind::File => "文件上传",
        }
    }
}

/// 检查到的单个表单字段
#[derive(Debug)]
pub struct FormField {
    pub kind: FieldKind,
    pub required: bool,
    /// 页面元素引用（瞬态，随表单关闭失效）
    pub element: Element,
}

/// 表单复杂度分类
///
/// 分级策略把自动填写的影响范围限制在零字段或少量低风险字段，
/// 复杂表单一律升级给外部分类器/人工处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormComplexity {
    /// 零字段：一键申请
    OneClick,
    /// 字段数不超过阈值且类型全部可识别
    Simple,
    /// 字段数超过阈值，升级处理
    Complex,
}

/// 按字段数和阈值分类表单复杂度
pub fn classify_complexity(field_count: usize, threshold: usize) -> FormComplexity {
    if field_count == 0 {
        FormComplexity::OneClick
    } else if field_count <= threshold {
        FormComplexity::Simple
    } else {
        FormComplexity::Complex
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_fields_is_one_click() {
        assert_eq!(classify_complexity(0, 3), FormComplexity::OneClick);
    }

    #[test]
    fn test_at_threshold_is_simple() {
        assert_eq!(classify_complexity(1, 3), FormComplexity::Simple);
        assert_eq!(classify_complexity(3, 3), FormComplexity::Simple);
    }

    #[test]
    fn test_above_threshold_is_complex() {
        assert_eq!(classify_complexity(4, 3), FormComplexity::Complex);
        assert_eq!(classify_complexity(10, 3), FormComplexity::Complex);
    }

    #[test]
    fn test_field_kind_roles_distinct() {
        let mut roles: Vec<_> = FieldKind::ALL.iter().map(|k| k.role()).collect();
        roles.dedup();
        assert_eq!(roles.len(), FieldKind::ALL.len());
    }
}
