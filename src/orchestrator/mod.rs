//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责资源管理和运行调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行、清理）
//! - 启动或附加浏览器（Browser、PageDriver）
//! - 加载选择器配置并构建解析器
//! - 委托会话保障和职位发现
//!
//! ### `engine` - 投递引擎
//! - 顺序遍历发现的职位列表
//! - 维护投递上限和中断标志
//! - 每个职位委托 ApplyFlow 处理
//! - 把每条结果追加进审计日志
//!
//! ## 层次关系
//!
//! ```text
//! app (资源 + 一次运行)
//!     ↓
//! engine (处理 Vec<JobRecord>)
//!     ↓
//! workflow::ApplyFlow (处理单个 JobRecord)
//!     ↓
//! services (能力层：session / discovery / inspect / audit)
//!     ↓
//! infrastructure (基础设施：PageDriver / ElementResolver)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管资源，engine 管预算和调度
//! 2. **资源隔离**：只有编排层持有 Browser
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod app;
pub mod engine;

// 重新导出主要类型
pub use app::App;
pub use engine::Engine;
