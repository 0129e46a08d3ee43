//! 申请处理上下文
//!
//! 封装"我正在处理第几个职位、以什么模式运行"这一信息

use std::fmt::Display;

use crate::models::run::RunMode;

/// 申请处理上下文
///
/// 包含处理单个职位所需的全部上下文信息
#[derive(Debug, Clone)]
pub struct ApplyCtx {
    /// 职位在发现列表中的索引（从1开始）
    pub job_index: usize,

    /// 本次发现的职位总数（仅用于日志显示）
    pub total: usize,

    /// 运行模式
    pub mode: RunMode,
}

impl ApplyCtx {
    /// 创建新的申请上下文
    pub fn new(job_index: usize, total: usize, mode: RunMode) -> Self {
        Self {
            job_index,
            total,
            mode,
        }
    }
}

impl Display for ApplyCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[职位 {}/{} {}]", self.job_index, self.total, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctx_display() {
        let ctx = ApplyCtx::new(3, 25, RunMode::Demo);
        assert_eq!(format!("{}", ctx), "[职位 3/25 演示]");
    }
}
