//! 申请处理流程 - 流程层
//!
//! 核心职责：定义"一个职位"的完整申请流程
//!
//! 流程顺序：
//! 1. 打开职位 → 识别申请入口
//! 2. 站内申请：弹窗检查 → 复杂度分级 → 确认闸门 → 提交
//! 3. 外站申请 / 复杂表单：留痕后升级人工处理
//!
//! 每个职位恰好产出一条结果，绝不静默吞掉任何决定。

use anyhow::{bail, Result};
use chromiumoxide::Element;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::{Config, ConfirmPolicy};
use crate::infrastructure::{ElementResolver, PageDriver};
use crate::models::form::{FieldKind, FormComplexity, FormField};
use crate::models::job::{ApplyKind, JobRecord};
use crate::models::locator::Role;
use crate::models::outcome::Decision;
use crate::models::run::RunMode;
use crate::services::session_manager::type_slowly;
use crate::services::{FieldClassifier, FormInspector, ScreenshotSink};
use crate::utils::input;
use crate::workflow::apply_ctx::ApplyCtx;

/// 多步表单最多前进的步数
const MAX_FORM_STEPS: usize = 3;

/// 单个职位的流程结果
#[derive(Debug)]
pub struct FlowResult {
    pub decision: Decision,
    pub reason: String,
}

impl FlowResult {
    fn submitted(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Submitted,
            reason: reason.into(),
        }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Skipped,
            reason: reason.into(),
        }
    }
}

/// 申请处理流程
///
/// - 编排单个职位从打开到出结果的全过程
/// - 决定何时检查、何时升级、何时提交
/// - 不持有任何资源（page）
/// - 只依赖业务能力（services）
pub struct ApplyFlow {
    inspector: FormInspector,
    classifier: FieldClassifier,
    screenshots: ScreenshotSink,
    confirm_policy: ConfirmPolicy,
    allow_auto_submit: bool,
    phone_number: Option<String>,
    /// 电话号码的操作员授权，一次运行只问一次
    phone_consent: OnceCell<bool>,
}

impl ApplyFlow {
    /// 创建新的申请流程
    pub fn new(config: &Config) -> Self {
        Self {
            inspector: FormInspector::new(config),
            classifier: FieldClassifier::new(config),
            screenshots: ScreenshotSink::new(&config.screenshot_dir),
            confirm_policy: config.confirm_policy,
            allow_auto_submit: config.allow_auto_submit,
            phone_number: config.phone_number.clone(),
            phone_consent: OnceCell::new(),
        }
    }

    /// 处理单个职位
    ///
    /// `submitted_so_far` 是本次运行已完成的提交数，供确认策略使用
    pub async fn run(
        &self,
        driver: &PageDriver,
        resolver: &ElementResolver,
        job: &mut JobRecord,
        ctx: &ApplyCtx,
        submitted_so_far: usize,
    ) -> Result<FlowResult> {
        info!("{} 📋 开始处理: {} @ {}", ctx, job.title, job.company);

        self.open_job(driver, resolver, job, ctx).await?;

        // ========== 识别申请入口 ==========
        if resolver.try_resolve(driver.page(), Role::EasyApplyButton).await.is_some() {
            job.apply_kind = ApplyKind::EasyApply;
            return self.run_easy_apply(driver, resolver, job, ctx, submitted_so_far).await;
        }

        if let Some(button) = resolver
            .try_resolve(driver.page(), Role::ExternalApplyButton)
            .await
        {
            job.apply_kind = ApplyKind::External;
            return self.run_external(driver, &button.element, job, ctx).await;
        }

        info!("{} ⚠️ 未找到申请入口，跳过", ctx);
        Ok(FlowResult::skipped("未找到申请入口"))
    }

    /// 打开职位详情
    ///
    /// 详情链接最可靠，有则直接导航；否则按站点 ID 在当前卡片列表中
    /// 定位后点击。发现阶段会丢弃广告卡并静默去重，记录序号和 DOM
    /// 序号并不对应，绝不能按序号点击。
    async fn open_job(
        &self,
        driver: &PageDriver,
        resolver: &ElementResolver,
        job: &JobRecord,
        ctx: &ApplyCtx,
    ) -> Result<()> {
        if let Some(url) = &job.url {
            driver.goto(url).await?;
            driver.settle(2000).await;
            return Ok(());
        }

        let target = match &job.id {
            Some(id) => id,
            None => bail!("职位既无详情链接也无站点 ID，无法定位"),
        };

        let set = resolver.resolve_all(driver.page(), Role::JobCard).await?;
        let mut card_ids = Vec::with_capacity(set.elements.len());
        for card in &set.elements {
            card_ids.push(card_site_id(card).await);
        }

        match position_by_id(&card_ids, target) {
            Some(i) => {
                click_card(&set.elements[i])
                    .await
                    .map_err(|e| anyhow::anyhow!("点击职位卡片失败: {}", e))?;
                driver.settle(2000).await;
                Ok(())
            }
            None => {
                warn!("{} 当前列表中找不到职位 ID {}", ctx, target);
                bail!("职位卡片已不在列表中 (ID: {})", target)
            }
        }
    }

    /// 站内快速申请路径
    async fn run_easy_apply(
        &self,
        driver: &PageDriver,
        resolver: &ElementResolver,
        job: &JobRecord,
        ctx: &ApplyCtx,
        submitted_so_far: usize,
    ) -> Result<FlowResult> {
        resolver
            .resolve_and_click(driver.page(), Role::EasyApplyButton)
            .await?;
        driver.settle(1500).await;

        let modal = resolver.resolve(driver.page(), Role::ApplyModal).await?;
        // 每次申请尝试都留痕，弹窗打开即为一次尝试
        let _ = self
            .screenshots
            .capture(driver, ctx.job_index, &job.company)
            .await;
        let report = self.inspector.inspect(resolver, &modal.element).await?;

        match report.complexity {
            FormComplexity::OneClick => {
                info!("{} ✓ 一键申请表单", ctx);
            }
            FormComplexity::Simple => {
                let prefillable = is_prefillable(
                    report.fields.len(),
                    report.only_kind(FieldKind::Phone),
                    self.phone_number.is_some(),
                );
                if prefillable {
                    if !self.fill_phone_field(ctx, &report.fields[0]).await? {
                        info!("{} 🚫 操作员拒绝使用预填电话号码", ctx);
                        self.dismiss_modal(driver, resolver).await;
                        return Ok(FlowResult::skipped("操作员拒绝使用预填电话号码"));
                    }
                } else {
                    // 简单但含未预批准的字段类型，升级人工
                    let reason = format!("简单表单含未预批准字段: {}", report.census_summary());
                    info!("{} ⚠️ {}", ctx, reason);
                    self.dismiss_modal(driver, resolver).await;
                    return Ok(FlowResult::skipped(reason));
                }
            }
            FormComplexity::Complex => {
                let advice = self.classifier.advise(job, &report).await;
                info!("{} ⚠️ 升级人工: {}", ctx, advice.reason);
                let _ = self
                    .screenshots
                    .capture(driver, ctx.job_index, &job.company)
                    .await;
                self.dismiss_modal(driver, resolver).await;
                return Ok(FlowResult::skipped(advice.reason));
            }
        }

        // ========== 确认闸门 ==========
        if ctx.mode == RunMode::Demo {
            info!("{} 🎭 演示模式，关闭弹窗不提交", ctx);
            self.dismiss_modal(driver, resolver).await;
            return Ok(FlowResult::skipped("演示模式不提交"));
        }

        if !self.confirm_submission(job, ctx, submitted_so_far).await? {
            info!("{} 🚫 操作员拒绝提交", ctx);
            self.dismiss_modal(driver, resolver).await;
            return Ok(FlowResult::skipped("操作员拒绝提交"));
        }

        self.advance_and_submit(driver, resolver, ctx).await?;
        let _ = self
            .screenshots
            .capture(driver, ctx.job_index, &job.company)
            .await;
        Ok(FlowResult::submitted("站内快速申请已提交"))
    }

    /// 外站申请路径
    ///
    /// 单页面模型下不跟随跳转走完外站流程，只留痕后升级人工
    async fn run_external(
        &self,
        driver: &PageDriver,
        button: &Element,
        job: &JobRecord,
        ctx: &ApplyCtx,
    ) -> Result<FlowResult> {
        let href = button.attribute("href").await.ok().flatten();

        if let Some(url) = &href {
            info!("{} 🔗 外站申请: {}", ctx, url);
            driver.goto(url).await?;
            driver.settle(3000).await;

            let has_form = self.probe_form_presence(driver).await;
            info!(
                "{} 外站落地页{}检测到表单",
                ctx,
                if has_form { "" } else { "未" }
            );
            let _ = self
                .screenshots
                .capture(driver, ctx.job_index, &job.company)
                .await;

            // 回到站内，给下一个职位留干净现场
            driver.go_back().await?;
            driver.settle(2000).await;

            Ok(FlowResult::skipped(format!("外站申请需人工完成: {}", url)))
        } else {
            warn!("{} 外站按钮没有可记录的链接", ctx);
            let _ = self
                .screenshots
                .capture(driver, ctx.job_index, &job.company)
                .await;
            Ok(FlowResult::skipped("外站申请需人工完成（链接未捕获）"))
        }
    }

    /// 填写唯一的预批准电话字段
    ///
    /// 号码在一次运行中首次使用前向操作员确认一次，拒绝则返回 false
    async fn fill_phone_field(&self, ctx: &ApplyCtx, field: &FormField) -> Result<bool> {
        let phone = match &self.phone_number {
            Some(p) => p.clone(),
            None => bail!("电话号码未配置"),
        };

        let approved = *self
            .phone_consent
            .get_or_try_init(|| async {
                input::confirm(&format!("使用电话号码 {} 填写申请表单?", phone)).await
            })
            .await?;
        if !approved {
            return Ok(false);
        }

        field.element.click().await?;
        type_slowly(&field.element, &phone).await?;
        info!("{} ✓ 已填写电话字段", ctx);
        Ok(true)
    }

    /// 确认闸门裁决
    async fn confirm_submission(
        &self,
        job: &JobRecord,
        ctx: &ApplyCtx,
        submitted_so_far: usize,
    ) -> Result<bool> {
        let ask = should_ask(self.confirm_policy, self.allow_auto_submit, submitted_so_far);
        if ask && self.confirm_policy == ConfirmPolicy::Automatic {
            // 策略要求全自动但开关未打开，降级为每次询问
            warn!("{} ⚠️ 自动提交开关未打开，降级为逐次确认", ctx);
        }

        if !ask {
            info!("{} ✓ 确认策略放行，自动提交", ctx);
            return Ok(true);
        }

        input::confirm(&format!("确认提交申请: {} @ {}?", job.title, job.company)).await
    }

    /// 推进多步表单直到提交
    ///
    /// 每一步优先找提交按钮，找不到就点下一步，步数有上限
    async fn advance_and_submit(
        &self,
        driver: &PageDriver,
        resolver: &ElementResolver,
        ctx: &ApplyCtx,
    ) -> Result<()> {
        for step in 0..MAX_FORM_STEPS {
            if resolver
                .try_resolve(driver.page(), Role::SubmitButton)
                .await
                .is_some()
            {
                resolver
                    .resolve_and_click(driver.page(), Role::SubmitButton)
                    .await?;
                driver.settle(2000).await;
                info!("{} ✅ 申请已提交", ctx);
                // 提交后的成功弹窗也要关掉
                self.dismiss_modal(driver, resolver).await;
                return Ok(());
            }

            match resolver
                .resolve_and_click(driver.page(), Role::NextButton)
                .await
            {
                Ok(_) => {
                    info!("{} → 表单第 {} 步", ctx, step + 2);
                    driver.settle(1500).await;
                }
                Err(_) => bail!("既没有提交按钮也没有下一步按钮"),
            }
        }
        bail!("表单步数超过上限 {}，放弃提交", MAX_FORM_STEPS)
    }

    /// 页面上是否存在任何已识别类型的表单字段
    async fn probe_form_presence(&self, driver: &PageDriver) -> bool {
        // 粗略探测即可，结果只写进日志
        for selector in ["form input", "form textarea", "form select"] {
            if let Ok(elements) = driver.page().find_elements(selector).await {
                if !elements.is_empty() {
                    return true;
                }
            }
        }
        false
    }

    /// 尽力关闭当前弹窗
    ///
    /// 先点关闭按钮，再按 Escape 兜底；失败只告警
    async fn dismiss_modal(&self, driver: &PageDriver, resolver: &ElementResolver) {
        if let Some(close) = resolver.try_resolve(driver.page(), Role::ModalClose).await {
            if close.element.click().await.is_ok() {
                driver.settle(800).await;
                // 关闭确认对话框可能再弹一层"放弃申请"
                if let Some(discard) = resolver.try_resolve(driver.page(), Role::ModalClose).await {
                    let _ = discard.element.click().await;
                    driver.settle(500).await;
                }
                return;
            }
        }
        if let Err(e) = driver.press_escape().await {
            warn!("⚠️ 关闭弹窗失败: {}", e);
        }
        driver.settle(500).await;
    }
}

/// 确认策略裁决：本次提交前是否需要询问操作员
///
/// Automatic 必须同时打开显式开关才真正免询问
fn should_ask(policy: ConfirmPolicy, allow_auto_submit: bool, submitted_so_far: usize) -> bool {
    match policy {
        ConfirmPolicy::AlwaysAsk => true,
        ConfirmPolicy::AutoBelow(n) => submitted_so_far >= n,
        ConfirmPolicy::Automatic => !allow_auto_submit,
    }
}

/// 预填资格：恰好一个字段、全部是电话类型、号码已配置
fn is_prefillable(field_count: usize, all_phone: bool, has_number: bool) -> bool {
    field_count == 1 && all_phone && has_number
}

/// 读取卡片的站点职位 ID
async fn card_site_id(card: &Element) -> Option<String> {
    if let Ok(Some(id)) = card.attribute("data-occludable-job-id").await {
        return Some(id);
    }
    card.attribute("data-job-id").await.ok().flatten()
}

/// 在卡片 ID 列表中定位目标职位
fn position_by_id(card_ids: &[Option<String>], target: &str) -> Option<usize> {
    card_ids.iter().position(|id| id.as_deref() == Some(target))
}

/// 点击职位卡片
async fn click_card(card: &Element) -> Result<(), chromiumoxide::error::CdpError> {
    card.scroll_into_view().await?;
    card.click().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_ask_always_asks() {
        assert!(should_ask(ConfirmPolicy::AlwaysAsk, true, 0));
        assert!(should_ask(ConfirmPolicy::AlwaysAsk, false, 99));
    }

    #[test]
    fn test_auto_below_switches_at_threshold() {
        assert!(!should_ask(ConfirmPolicy::AutoBelow(2), false, 0));
        assert!(!should_ask(ConfirmPolicy::AutoBelow(2), false, 1));
        assert!(should_ask(ConfirmPolicy::AutoBelow(2), false, 2));
    }

    #[test]
    fn test_automatic_without_override_downgrades() {
        // 显式开关未打开时 Automatic 降级为逐次确认
        assert!(should_ask(ConfirmPolicy::Automatic, false, 0));
        assert!(!should_ask(ConfirmPolicy::Automatic, true, 0));
    }

    #[test]
    fn test_card_located_by_id_not_by_position() {
        // DOM 第 1 位是发现阶段丢弃的广告卡（无 ID），记录序号和
        // DOM 序号从此错开，定位必须走 ID 匹配
        let card_ids = vec![
            None,
            Some("4001".to_string()),
            Some("4002".to_string()),
        ];
        assert_eq!(position_by_id(&card_ids, "4001"), Some(1));
        assert_eq!(position_by_id(&card_ids, "4002"), Some(2));
    }

    #[test]
    fn test_card_gone_from_list_yields_none() {
        let card_ids = vec![Some("4001".to_string()), None];
        assert_eq!(position_by_id(&card_ids, "5999"), None);
        assert_eq!(position_by_id(&[], "4001"), None);
    }

    #[test]
    fn test_prefill_requires_single_phone_field() {
        assert!(is_prefillable(1, true, true));
        // 多个电话字段不预填，升级人工
        assert!(!is_prefillable(2, true, true));
        assert!(!is_prefillable(1, false, true));
        assert!(!is_prefillable(1, true, false));
        assert!(!is_prefillable(0, true, true));
    }
}
