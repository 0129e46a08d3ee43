//! 投递引擎 - 编排层
//!
//! 顺序遍历发现的职位列表，逐个委托申请流程处理，维护投递上限
//! 和中断标志，并把每条结果追加进审计日志。
//!
//! 上限检查发生在职位之间：达到上限后剩余职位不再处理也不记录，
//! 绝不会出现第 cap+1 次提交。中断标志同样只在职位之间生效，
//! 进行中的提交会走完。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::{ElementResolver, PageDriver};
use crate::models::job::JobRecord;
use crate::models::outcome::{ApplicationOutcome, Decision};
use crate::models::run::{RunParams, RunSummary};
use crate::services::AuditLog;
use crate::utils::logging;
use crate::workflow::{ApplyCtx, ApplyFlow};

/// 投递引擎
///
/// - 管理单次运行内的投递预算
/// - 把每个职位的结果落进审计日志
/// - 不做任何页面操作，全部委托流程层
pub struct Engine {
    flow: ApplyFlow,
    audit: AuditLog,
    params: RunParams,
}

impl Engine {
    /// 创建新的投递引擎
    pub fn new(config: &Config, params: RunParams) -> Self {
        Self {
            flow: ApplyFlow::new(config),
            audit: AuditLog::new(&config.audit_log_file),
            params,
        }
    }

    /// 顺序处理全部职位
    ///
    /// 单个职位失败记一条 Failed 后继续，运行层面不中断
    pub async fn run(
        &self,
        driver: &PageDriver,
        resolver: &ElementResolver,
        jobs: Vec<JobRecord>,
        interrupted: Arc<AtomicBool>,
    ) -> Result<RunSummary> {
        let total = jobs.len();
        let mut summary = RunSummary {
            jobs_found: total,
            ..Default::default()
        };

        for (idx, mut job) in jobs.into_iter().enumerate() {
            if cap_reached(summary.submitted, self.params.submission_cap) {
                info!(
                    "🛑 已达投递上限 {}，剩余 {} 个职位不再处理",
                    self.params.submission_cap,
                    total - idx
                );
                break;
            }
            if interrupted.load(Ordering::Relaxed) {
                warn!("🛑 收到中断信号，停止处理剩余职位");
                break;
            }

            let ctx = ApplyCtx::new(idx + 1, total, self.params.mode);
            logging::log_job_start(idx + 1, total, &job.title, &job.company);

            let outcome = match self
                .flow
                .run(driver, resolver, &mut job, &ctx, summary.submitted)
                .await
            {
                Ok(result) => {
                    match result.decision {
                        Decision::Submitted => summary.submitted += 1,
                        Decision::Skipped => summary.skipped += 1,
                        Decision::Failed => summary.failed += 1,
                    }
                    ApplicationOutcome::new(&job, result.decision, result.reason)
                }
                Err(e) => {
                    error!("{} ❌ 处理过程中发生错误: {:#}", ctx, e);
                    summary.failed += 1;
                    ApplicationOutcome::new(&job, Decision::Failed, format!("处理出错: {:#}", e))
                }
            };

            // 落盘失败大声告警但不中断运行，内存里的统计仍然完整
            if let Err(e) = self.audit.append(&outcome).await {
                error!("❌ 审计日志写入失败，本条结果未持久化: {:#}", e);
            }
        }

        Ok(summary)
    }
}

/// 投递上限判定
///
/// 上限为 0 表示本次运行不做任何提交
fn cap_reached(submitted: usize, cap: usize) -> bool {
    submitted >= cap
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// 用随机决定序列模拟引擎主循环的上限闸门
    fn simulate(decisions: &[Decision], cap: usize) -> usize {
        let mut submitted = 0;
        for d in decisions {
            if cap_reached(submitted, cap) {
                break;
            }
            if *d == Decision::Submitted {
                submitted += 1;
            }
        }
        submitted
    }

    #[test]
    fn test_cap_zero_means_no_submissions() {
        let all_submit = vec![Decision::Submitted; 10];
        assert_eq!(simulate(&all_submit, 0), 0);
    }

    #[test]
    fn test_cap_never_exceeded_on_random_sequences() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let cap = rng.gen_range(0..5);
            let decisions: Vec<Decision> = (0..rng.gen_range(0..30))
                .map(|_| match rng.gen_range(0..3) {
                    0 => Decision::Submitted,
                    1 => Decision::Skipped,
                    _ => Decision::Failed,
                })
                .collect();
            assert!(simulate(&decisions, cap) <= cap);
        }
    }

    #[test]
    fn test_cap_stops_between_jobs() {
        // 第三个提交把计数推到上限，第四个提交不会发生
        let decisions = vec![
            Decision::Submitted,
            Decision::Skipped,
            Decision::Submitted,
            Decision::Submitted,
            Decision::Submitted,
        ];
        assert_eq!(simulate(&decisions, 3), 3);
    }
}
