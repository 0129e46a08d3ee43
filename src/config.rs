/// 提交确认策略
///
/// 提交前的确认闸门，防止意外批量投递
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmPolicy {
    /// 每次提交前都询问操作员
    AlwaysAsk,
    /// 前 N 次提交不询问，之后每次询问
    AutoBelow(usize),
    /// 完全自动（必须同时设置 allow_auto_submit 才生效）
    Automatic,
}

impl ConfirmPolicy {
    /// 从字符串解析确认策略
    ///
    /// 支持 "always" / "auto_below:N" / "automatic"，无法识别时退回 AlwaysAsk
    pub fn parse(value: &str) -> Self {
        let v = value.trim().to_lowercase();
        if v == "always" {
            return ConfirmPolicy::AlwaysAsk;
        }
        if v == "automatic" {
            return ConfirmPolicy::Automatic;
        }
        if let Some(n) = v.strip_prefix("auto_below:") {
            if let Ok(n) = n.parse::<usize>() {
                return ConfirmPolicy::AutoBelow(n);
            }
        }
        ConfirmPolicy::AlwaysAsk
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口（0 表示自行启动浏览器而不是附加）
    pub browser_debug_port: u16,
    /// 是否无头模式（投递流程建议保持可见）
    pub headless: bool,
    /// 目标站点根地址
    pub base_url: String,
    /// 会话文件路径
    pub session_file: String,
    /// 审计日志文件路径
    pub audit_log_file: String,
    /// 选择器配置文件路径（缺失时使用内置默认）
    pub selector_file: String,
    /// 截图输出目录
    pub screenshot_dir: String,
    /// 运行日志文件
    pub output_log_file: String,
    // --- 运行参数默认值（命令面可覆盖） ---
    /// 搜索关键词
    pub keywords: String,
    /// 地点过滤
    pub location: String,
    /// 职位发现上限
    pub results_cap: usize,
    /// 投递上限
    pub submission_cap: usize,
    /// 运行模式（demo / live）
    pub run_mode: String,
    // --- 节流与阈值 ---
    /// 确认策略
    pub confirm_policy: ConfirmPolicy,
    /// 全自动提交的显式开关（确认策略为 automatic 时必须同时打开）
    pub allow_auto_submit: bool,
    /// 滚动加载轮数
    pub scroll_rounds: usize,
    /// 每轮滚动后的稳定等待（毫秒）
    pub scroll_settle_ms: u64,
    /// 元素解析等待预算（毫秒）
    pub resolver_wait_ms: u64,
    /// 元素解析轮询间隔（毫秒）
    pub resolver_poll_ms: u64,
    /// 导航超时（毫秒）
    pub navigation_timeout_ms: u64,
    /// 登录轮询次数（每次 1 秒）
    pub login_poll_attempts: usize,
    /// 表单复杂度阈值：字段数超过该值时升级人工处理
    pub form_complexity_threshold: usize,
    /// 职位标题最小长度（过滤广告/栏目标题卡片）
    pub min_title_len: usize,
    /// 外部表单字段分类服务地址（缺省时一律升级人工）
    pub classifier_endpoint: Option<String>,
    /// 预填充的电话号码（SIMPLE_FILL 唯一允许的低风险字段）
    pub phone_number: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 0,
            headless: false,
            base_url: "https://www.linkedin.com".to_string(),
            session_file: "data/linkedin_session.json".to_string(),
            audit_log_file: "data/applications_submitted.json".to_string(),
            selector_file: "data/selectors.toml".to_string(),
            screenshot_dir: "data/screenshots".to_string(),
            output_log_file: "output.txt".to_string(),
            keywords: "Software Engineer".to_string(),
            location: "United States".to_string(),
            results_cap: 25,
            submission_cap: 3,
            run_mode: "demo".to_string(),
            confirm_policy: ConfirmPolicy::AlwaysAsk,
            allow_auto_submit: false,
            scroll_rounds: 5,
            scroll_settle_ms: 2000,
            resolver_wait_ms: 5000,
            resolver_poll_ms: 250,
            navigation_timeout_ms: 30000,
            login_poll_attempts: 20,
            form_complexity_threshold: 3,
            min_title_len: 6,
            classifier_endpoint: None,
            phone_number: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT", default.browser_debug_port),
            headless: env_parse("BROWSER_HEADLESS", default.headless),
            base_url: env_or("TARGET_BASE_URL", default.base_url),
            session_file: env_or("SESSION_FILE", default.session_file),
            audit_log_file: env_or("AUDIT_LOG_FILE", default.audit_log_file),
            selector_file: env_or("SELECTOR_FILE", default.selector_file),
            screenshot_dir: env_or("SCREENSHOT_DIR", default.screenshot_dir),
            output_log_file: env_or("OUTPUT_LOG_FILE", default.output_log_file),
            keywords: env_or("JOB_KEYWORDS", default.keywords),
            location: env_or("JOB_LOCATION", default.location),
            results_cap: env_parse("RESULTS_CAP", default.results_cap),
            submission_cap: env_parse("SUBMISSION_CAP", default.submission_cap),
            run_mode: env_or("RUN_MODE", default.run_mode),
            confirm_policy: std::env::var("CONFIRM_POLICY")
                .map(|v| ConfirmPolicy::parse(&v))
                .unwrap_or(default.confirm_policy),
            allow_auto_submit: env_parse("ALLOW_AUTO_SUBMIT", default.allow_auto_submit),
            scroll_rounds: env_parse("SCROLL_ROUNDS", default.scroll_rounds),
            scroll_settle_ms: env_parse("SCROLL_SETTLE_MS", default.scroll_settle_ms),
            resolver_wait_ms: env_parse("RESOLVER_WAIT_MS", default.resolver_wait_ms),
            resolver_poll_ms: env_parse("RESOLVER_POLL_MS", default.resolver_poll_ms),
            navigation_timeout_ms: env_parse("NAVIGATION_TIMEOUT_MS", default.navigation_timeout_ms),
            login_poll_attempts: env_parse("LOGIN_POLL_ATTEMPTS", default.login_poll_attempts),
            form_complexity_threshold: env_parse(
                "FORM_COMPLEXITY_THRESHOLD",
                default.form_complexity_threshold,
            ),
            min_title_len: env_parse("MIN_TITLE_LEN", default.min_title_len),
            classifier_endpoint: std::env::var("CLASSIFIER_ENDPOINT").ok(),
            phone_number: std::env::var("APPLY_PHONE_NUMBER").ok(),
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(v) => match v.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                // 解析失败退回默认值，但要让操作员看到
                tracing::warn!(
                    "⚠️ {}",
                    crate::error::ConfigError::EnvVarParseFailed {
                        var_name: name.to_string(),
                        value: v,
                        expected_type: std::any::type_name::<T>().to_string(),
                    }
                );
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_policy_parse() {
        assert_eq!(ConfirmPolicy::parse("always"), ConfirmPolicy::AlwaysAsk);
        assert_eq!(ConfirmPolicy::parse("Automatic"), ConfirmPolicy::Automatic);
        assert_eq!(
            ConfirmPolicy::parse("auto_below:5"),
            ConfirmPolicy::AutoBelow(5)
        );
        // 无法识别时退回最保守的策略
        assert_eq!(ConfirmPolicy::parse("yolo"), ConfirmPolicy::AlwaysAsk);
        assert_eq!(ConfirmPolicy::parse("auto_below:x"), ConfirmPolicy::AlwaysAsk);
    }

    #[test]
    fn test_default_is_safe() {
        let config = Config::default();
        assert_eq!(config.run_mode, "demo");
        assert!(!config.allow_auto_submit);
        assert_eq!(config.confirm_policy, ConfirmPolicy::AlwaysAsk);
    }
}
