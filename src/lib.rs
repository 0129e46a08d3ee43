//! # Auto Job Apply
//!
//! 一个用于自动化职位投递的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 唯一的 page owner，提供导航/滚动/截图能力
//! - `ElementResolver` - 按角色和候选选择器梯队解析元素
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个关注点
//! - `SessionManager` - 会话恢复与交互式登录能力
//! - `JobDiscovery` - 搜索、滚动加载与去重提取能力
//! - `FormInspector` - 表单普查与复杂度分级能力
//! - `FieldClassifier` - 复杂表单升级建议能力
//! - `AuditLog` - 只追加审计日志能力
//! - `ScreenshotSink` - 现场截图留存能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个职位"的完整申请流程
//! - `ApplyCtx` - 上下文封装（job_index + total + mode）
//! - `ApplyFlow` - 流程编排（打开 → 分类 → 检查 → 确认 → 提交）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用入口，管理浏览器资源
//! - `orchestrator/engine` - 投递引擎，维护上限和中断标志
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, launch_browser};
pub use config::{Config, ConfirmPolicy};
pub use error::{AppError, AppResult};
pub use infrastructure::{ElementResolver, PageDriver};
pub use models::job::JobRecord;
pub use models::run::{RunMode, RunParams, RunSummary};
pub use orchestrator::{App, Engine};
pub use workflow::{ApplyCtx, ApplyFlow, FlowResult};
