//! 语义角色与选择器策略模型
//!
//! 目标站点的标记在版本间经常变动，所以元素定位不写死单个选择器，
//! 而是为每个语义角色维护一组按置信度排序的候选选择器。
//! 属性类选择器排在前面，类名类选择器排在后面，因为属性在改版中更稳定。

use std::collections::HashMap;

/// 语义角色
///
/// 每个角色对应页面上一类有业务含义的目标元素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// 登录邮箱输入框
    LoginEmail,
    /// 登录密码输入框
    LoginPassword,
    /// 登录提交按钮
    LoginSubmit,
    /// 登录页内联错误提示
    LoginErrorBanner,
    /// 搜索结果中的职位卡片
    JobCard,
    /// 卡片内的职位标题
    JobTitle,
    /// 卡片内的公司名称
    JobCompany,
    /// 卡片内的工作地点
    JobLocation,
    /// 卡片内的职位详情链接
    JobLink,
    /// 站内快速申请按钮
    EasyApplyButton,
    /// 外部申请按钮
    ExternalApplyButton,
    /// 申请弹窗
    ApplyModal,
    /// 弹窗关闭按钮
    ModalClose,
    /// 申请表单下一步按钮
    NextButton,
    /// 申请提交按钮
    SubmitButton,
    /// 文本输入框
    FormTextInput,
    /// 邮箱输入框
    FormEmailInput,
    /// 电话输入框
    FormPhoneInput,
    /// 多行文本框
    FormTextarea,
    /// 下拉选择框
    FormSelect,
    /// 文件上传框
    FormFileInput,
}

impl Role {
    /// 全部角色（用于配置校验和默认表构建）
    pub const ALL: [Role; 21] = [
        Role::LoginEmail,
        Role::LoginPassword,
        Role::LoginSubmit,
        Role::LoginErrorBanner,
        Role::JobCard,
        Role::JobTitle,
        Role::JobCompany,
        Role::JobLocation,
        Role::JobLink,
        Role::EasyApplyButton,
        Role::ExternalApplyButton,
        Role::ApplyModal,
        Role::ModalClose,
        Role::NextButton,
        Role::SubmitButton,
        Role::FormTextInput,
        Role::FormEmailInput,
        Role::FormPhoneInput,
        Role::FormTextarea,
        Role::FormSelect,
        Role::FormFileInput,
    ];

    /// 配置文件里使用的角色键名
    pub fn as_str(self) -> &'static str {
        match self {
            Role::LoginEmail => "login-email",
            Role::LoginPassword => "login-password",
            Role::LoginSubmit => "login-submit",
            Role::LoginErrorBanner => "login-error-banner",
            Role::JobCard => "job-card",
            Role::JobTitle => "job-title",
            Role::JobCompany => "job-company",
            Role::JobLocation => "job-location",
            Role::JobLink => "job-link",
            Role::EasyApplyButton => "easy-apply-button",
            Role::ExternalApplyButton => "external-apply-button",
            Role::ApplyModal => "apply-modal",
            Role::ModalClose => "modal-close",
            Role::NextButton => "next-button",
            Role::SubmitButton => "submit-button",
            Role::FormTextInput => "form-text-input",
            Role::FormEmailInput => "form-email-input",
            Role::FormPhoneInput => "form-phone-input",
            Role::FormTextarea => "form-textarea",
            Role::FormSelect => "form-select",
            Role::FormFileInput => "form-file-input",
        }
    }

    /// 从配置键名解析角色
    pub fn from_key(key: &str) -> Option<Self> {
        Role::ALL.iter().copied().find(|r| r.as_str() == key)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 单条选择器及其置信度序号（数字越小越优先）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorEntry {
    pub selector: String,
    pub rank: usize,
}

/// 选择器策略表
///
/// 进程级只读配置：运行期不修改，可通过重新加载配置文件整体替换。
/// 外部配置缺失或无法解析时退回内置默认表。
#[derive(Debug, Clone)]
pub struct LocatorBook {
    /// 配置版本（按站点改版日期标注）
    pub version: String,
    roles: HashMap<Role, Vec<SelectorEntry>>,
}

impl LocatorBook {
    /// 内置默认选择器表
    ///
    /// 这是 2025 年版站点实测可用的选择器集合
    pub fn builtin() -> Self {
        let mut roles: HashMap<Role, Vec<SelectorEntry>> = HashMap::new();

        let mut put = |role: Role, selectors: &[&str]| {
            roles.insert(
                role,
                selectors
                    .iter()
                    .enumerate()
                    .map(|(rank, s)| SelectorEntry {
                        selector: (*s).to_string(),
                        rank,
                    })
                    .collect(),
            );
        };

        put(Role::LoginEmail, &["#username", "input[name=\"session_key\"]"]);
        put(
            Role::LoginPassword,
            &["#password", "input[name=\"session_password\"]"],
        );
        put(Role::LoginSubmit, &["button[type=\"submit\"]"]);
        put(
            Role::LoginErrorBanner,
            &["#error-for-username", "#error-for-password", ".form__label--error"],
        );
        put(
            Role::JobCard,
            &[
                "li[data-occludable-job-id]",
                "div[data-job-id]",
                ".job-card-container",
                ".jobs-search-results__list-item",
                ".job-search-card",
            ],
        );
        put(
            Role::JobTitle,
            &[
                ".job-card-list__title",
                ".job-search-card__title",
                ".job-card-container__link strong",
                "h3 a",
            ],
        );
        put(
            Role::JobCompany,
            &[
                ".job-card-container__primary-description",
                ".job-search-card__subtitle",
                ".artdeco-entity-lockup__subtitle",
                "h4",
            ],
        );
        put(
            Role::JobLocation,
            &[
                ".job-card-container__metadata-item",
                ".job-search-card__location",
                ".artdeco-entity-lockup__caption",
            ],
        );
        put(Role::JobLink, &["a[href*=\"/jobs/view/\"]"]);
        put(
            Role::EasyApplyButton,
            &[
                "button[aria-label*=\"Easy Apply\"]",
                ".jobs-apply-button",
                "[data-control-name*=\"jobdetails_topcard_inapply\"]",
            ],
        );
        put(
            Role::ExternalApplyButton,
            &[
                "button[aria-label*=\"company website\"]",
                "[data-control-name*=\"jobdetails_topcard_offsite_apply\"]",
                ".jobs-apply-button--top-card a[target=\"_blank\"]",
            ],
        );
        put(
            Role::ApplyModal,
            &[
                ".jobs-easy-apply-modal",
                ".jobs-easy-apply-content",
                "div[role=\"dialog\"]",
                "[aria-modal=\"true\"]",
            ],
        );
        put(
            Role::ModalClose,
            &[
                "button[aria-label*=\"Dismiss\"]",
                ".artdeco-modal__dismiss",
                "button[data-test-modal-close-btn]",
            ],
        );
        put(
            Role::NextButton,
            &["button[aria-label=\"Next\"]", "button[data-easy-apply-next-button]"],
        );
        put(
            Role::SubmitButton,
            &[
                "button[aria-label*=\"Submit application\"]",
                "button[aria-label*=\"Submit\"]",
                "button[type=\"submit\"]",
            ],
        );
        put(Role::FormTextInput, &["input[type=\"text\"]"]);
        put(Role::FormEmailInput, &["input[type=\"email\"]"]);
        put(Role::FormPhoneInput, &["input[type=\"tel\"]"]);
        put(Role::FormTextarea, &["textarea"]);
        put(Role::FormSelect, &["select"]);
        put(Role::FormFileInput, &["input[type=\"file\"]"]);

        Self {
            version: "builtin-2025".to_string(),
            roles,
        }
    }

    /// 获取角色的候选选择器（已按置信度排序）
    pub fn selectors_for(&self, role: Role) -> &[SelectorEntry] {
        self.roles.get(&role).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// 用外部配置覆盖某个角色的选择器列表
    pub fn override_role(&mut self, role: Role, selectors: Vec<String>) {
        let entries = selectors
            .into_iter()
            .enumerate()
            .map(|(rank, selector)| SelectorEntry { selector, rank })
            .collect();
        self.roles.insert(role, entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_all_roles() {
        let book = LocatorBook::builtin();
        for role in Role::ALL {
            assert!(
                !book.selectors_for(role).is_empty(),
                "角色 {} 缺少内置选择器",
                role
            );
        }
    }

    #[test]
    fn test_rank_order_preserved() {
        let book = LocatorBook::builtin();
        let entries = book.selectors_for(Role::JobCard);
        // 属性选择器排在第一位，置信度序号严格递增
        assert_eq!(entries[0].selector, "li[data-occludable-job-id]");
        for (i, e) in entries.iter().enumerate() {
            assert_eq!(e.rank, i);
        }
    }

    #[test]
    fn test_override_replaces_whole_role() {
        let mut book = LocatorBook::builtin();
        book.override_role(Role::JobCard, vec![".new-card".to_string()]);
        let entries = book.selectors_for(Role::JobCard);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].selector, ".new-card");
        assert_eq!(entries[0].rank, 0);
    }

    #[test]
    fn test_role_key_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_key(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_key("not-a-role"), None);
    }
}
