use std::fmt;

use thiserror::Error;

/// 元素解析失败
///
/// 记录角色和所有尝试过的选择器，便于排查而无需无限重试
#[derive(Debug, Clone, Error)]
#[error("元素解析失败 (角色: {role}): 已尝试 {} 个选择器 [{}], 等待 {wait_ms}ms", attempted.len(), attempted.join(", "))]
pub struct ResolutionFailure {
    /// 语义角色名称
    pub role: String,
    /// 按置信度顺序尝试过的选择器列表
    pub attempted: Vec<String>,
    /// 等待预算（毫秒）
    pub wait_ms: u64,
}

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 浏览器相关错误
    Browser(BrowserError),
    /// 登录/会话错误（致命，中止整次运行）
    Auth(AuthError),
    /// 元素解析失败（可恢复，只影响单个职位）
    Resolution(ResolutionFailure),
    /// 导航超时（可恢复，只影响单个职位）
    Navigation(NavigationError),
    /// 会话或审计日志持久化失败（大声记录，运行继续）
    Persistence(PersistenceError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Browser(e) => write!(f, "浏览器错误: {}", e),
            AppError::Auth(e) => write!(f, "登录错误: {}", e),
            AppError::Resolution(e) => write!(f, "{}", e),
            AppError::Navigation(e) => write!(f, "导航错误: {}", e),
            AppError::Persistence(e) => write!(f, "持久化错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Browser(e) => Some(e),
            AppError::Auth(e) => Some(e),
            AppError::Resolution(e) => Some(e),
            AppError::Navigation(e) => Some(e),
            AppError::Persistence(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 浏览器相关错误
#[derive(Debug)]
pub enum BrowserError {
    /// 连接浏览器失败
    ConnectionFailed {
        port: u16,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 启动浏览器失败
    LaunchFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    PageCreationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本失败
    ScriptExecutionFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserError::ConnectionFailed { port, source } => {
                write!(f, "无法连接到浏览器 (端口: {}): {}", port, source)
            }
            BrowserError::LaunchFailed { source } => {
                write!(f, "启动浏览器失败: {}", source)
            }
            BrowserError::PageCreationFailed { source } => {
                write!(f, "创建页面失败: {}", source)
            }
            BrowserError::ScriptExecutionFailed { source } => {
                write!(f, "执行脚本失败: {}", source)
            }
        }
    }
}

impl std::error::Error for BrowserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrowserError::ConnectionFailed { source, .. }
            | BrowserError::LaunchFailed { source }
            | BrowserError::PageCreationFailed { source }
            | BrowserError::ScriptExecutionFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 登录/会话错误
///
/// 凭证缺失或站点明确拒绝登录时整次运行中止
#[derive(Debug)]
pub enum AuthError {
    /// 操作员未提供凭证
    MissingCredentials,
    /// 登录页出现错误提示（站点明确拒绝）
    LoginRejected { message: String },
    /// 登录页面加载失败
    LoginPageUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingCredentials => write!(f, "未提供登录凭证"),
            AuthError::LoginRejected { message } => {
                write!(f, "站点拒绝登录: {}", message)
            }
            AuthError::LoginPageUnavailable { source } => {
                write!(f, "登录页面不可用: {}", source)
            }
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::LoginPageUnavailable { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 导航错误
#[derive(Debug)]
pub enum NavigationError {
    /// 导航超时
    Timeout { url: String, timeout_ms: u64 },
    /// 导航失败
    Failed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::Timeout { url, timeout_ms } => {
                write!(f, "导航到 {} 超时 ({}ms)", url, timeout_ms)
            }
            NavigationError::Failed { url, source } => {
                write!(f, "导航到 {} 失败: {}", url, source)
            }
        }
    }
}

impl std::error::Error for NavigationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavigationError::Failed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 持久化错误
#[derive(Debug)]
pub enum PersistenceError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 解析失败
    JsonParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            PersistenceError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            PersistenceError::JsonParseFailed { path, source } => {
                write!(f, "JSON解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::ReadFailed { source, .. }
            | PersistenceError::WriteFailed { source, .. }
            | PersistenceError::JsonParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 运行模式无法识别
    UnknownRunMode { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::UnknownRunMode { value } => {
                write!(f, "无法识别的运行模式: {} (支持 demo / live)", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========

impl From<ResolutionFailure> for AppError {
    fn from(err: ResolutionFailure) -> Self {
        AppError::Resolution(err)
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Persistence(PersistenceError::JsonParseFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Persistence(PersistenceError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建导航超时错误
    pub fn navigation_timeout(url: impl Into<String>, timeout_ms: u64) -> Self {
        AppError::Navigation(NavigationError::Timeout {
            url: url.into(),
            timeout_ms,
        })
    }

    /// 创建文件写入错误
    pub fn write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Persistence(PersistenceError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
