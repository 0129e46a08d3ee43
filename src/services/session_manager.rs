//! 会话管理服务 - 业务能力层
//!
//! 独占认证状态：恢复旧会话、验证探测、驱动交互式登录、持久化结果。
//!
//! 状态转换：
//! `Unauthenticated → Restoring → Valid | Invalid → Authenticating → Valid`
//!
//! 恢复成功是重复运行的主路径：探测通过时不会向操作员索要凭证。

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AuthError};
use crate::infrastructure::{ElementResolver, PageDriver};
use crate::models::locator::Role;
use crate::models::session::{CookieRecord, SessionState};
use crate::utils::input;

/// 登录成功的地址标记
const SUCCESS_MARKERS: [&str; 2] = ["/feed", "/in/"];
/// 人机验证/安全检查的地址标记
const CHALLENGE_MARKERS: [&str; 2] = ["challenge", "checkpoint"];

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionPhase {
    Unauthenticated,
    Restoring,
    Valid,
    Invalid,
    Authenticating,
}

/// 会话管理服务
pub struct SessionManager {
    base_url: String,
    session_file: String,
    login_poll_attempts: usize,
}

impl SessionManager {
    /// 创建新的会话管理服务
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            session_file: config.session_file.clone(),
            login_poll_attempts: config.login_poll_attempts,
        }
    }

    /// 确保页面处于已认证状态
    ///
    /// 优先恢复持久化会话并做低成本验证探测；探测失败时转入交互式登录。
    /// 凭证缺失或站点明确拒绝登录时返回致命错误，中止整次运行。
    pub async fn ensure_authenticated(
        &self,
        driver: &PageDriver,
        resolver: &ElementResolver,
    ) -> Result<()> {
        enter(SessionPhase::Unauthenticated);

        // ========== 阶段 1: 尝试恢复旧会话 ==========
        enter(SessionPhase::Restoring);
        if self.try_restore(driver).await? {
            enter(SessionPhase::Valid);
            info!("✅ 会话恢复成功，无需登录");
            return Ok(());
        }

        enter(SessionPhase::Invalid);
        info!("🔐 旧会话不可用，进入交互式登录");

        // ========== 阶段 2: 交互式登录 ==========
        enter(SessionPhase::Authenticating);
        self.interactive_login(driver, resolver).await?;

        enter(SessionPhase::Valid);
        Ok(())
    }

    /// 恢复持久化会话并做验证探测
    ///
    /// # 返回
    /// 探测通过返回 true；会话文件缺失、损坏或探测失败返回 false
    async fn try_restore(&self, driver: &PageDriver) -> Result<bool> {
        let state = match SessionState::load(&self.session_file).await {
            Ok(state) => state,
            Err(e) => {
                debug!("无持久化会话: {}", e);
                return Ok(false);
            }
        };

        info!(
            "🔍 恢复旧会话 ({} 个 Cookie, 保存于 {})...",
            state.cookies.len(),
            state.saved_at.format("%Y-%m-%d %H:%M")
        );

        // 先落到目标源，才能写 localStorage
        driver.goto(&self.base_url).await?;
        self.install_cookies(driver, &state.cookies).await?;
        self.install_storage(driver, &state.storage).await?;

        // 低成本验证探测：导航到仅登录可见的页面，检查落点地址
        driver.goto(&format!("{}/feed/", self.base_url)).await?;
        driver.settle(3000).await;

        let url = driver.current_url().await?;
        if is_authenticated_url(&url) {
            Ok(true)
        } else {
            debug!("探测落点: {} (非认证页面)", url);
            Ok(false)
        }
    }

    /// 交互式登录流程
    ///
    /// 凭证按随机间隔逐字输入，降低自动化特征；提交后轮询落点地址，
    /// 最多 `login_poll_attempts` 次（每次 1 秒）。
    async fn interactive_login(
        &self,
        driver: &PageDriver,
        resolver: &ElementResolver,
    ) -> Result<()> {
        driver.goto(&format!("{}/login", self.base_url)).await?;

        let email_field = resolver
            .resolve(driver.page(), Role::LoginEmail)
            .await
            .map_err(|e| {
                AppError::Auth(AuthError::LoginPageUnavailable {
                    source: Box::new(e),
                })
            })?;
        info!("✓ 登录页面已加载");

        // 向操作员索要凭证；缺失则中止整次运行
        let email = input::prompt("📧 登录邮箱").await?;
        let password = input::prompt("🔒 登录密码").await?;
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Auth(AuthError::MissingCredentials).into());
        }

        info!("⌨️ 输入凭证...");
        type_slowly(&email_field.element, &email).await?;
        pause_between_fields().await;

        let password_field = resolver
            .resolve(driver.page(), Role::LoginPassword)
            .await
            .map_err(AppError::Resolution)?;
        type_slowly(&password_field.element, &password).await?;
        pause_between_fields().await;

        let submit = resolver
            .resolve(driver.page(), Role::LoginSubmit)
            .await
            .map_err(AppError::Resolution)?;
        submit.element.click().await.context("点击登录按钮失败")?;
        info!("🖱️ 已提交登录，等待跳转...");

        // ========== 登录结果轮询 ==========
        for attempt in 1..=self.login_poll_attempts {
            driver.settle(1000).await;
            let url = driver.current_url().await?;

            if is_authenticated_url(&url) {
                info!("✅ 登录成功 (第 {} 次轮询)", attempt);
                self.persist_session(driver).await;
                return Ok(());
            }

            if is_challenge_url(&url) {
                warn!("🤖 站点要求人机验证，请在浏览器中手工完成");
                input::wait_for_enter("完成验证").await?;
                continue;
            }

            // 站点明确拒绝登录是致命错误
            if let Some(banner) = resolver.try_resolve(driver.page(), Role::LoginErrorBanner).await
            {
                let message = banner
                    .element
                    .inner_text()
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| "登录页出现错误提示".to_string());
                error!("❌ 登录被拒绝: {}", message);
                return Err(AppError::Auth(AuthError::LoginRejected { message }).into());
            }

            debug!("轮询 {}/{}: 落点 {}", attempt, self.login_poll_attempts, url);
        }

        // 轮询预算耗尽：乐观继续。不少站点的跳转晚于探测窗口，
        // 为保证流程推进这里视为已登录——该行为可能掩盖真实的登录失败，
        // 调整前先看 DESIGN.md 的决策记录
        warn!(
            "⚠️ 登录轮询 {} 次未见成功标记，乐观继续（可能掩盖登录失败）",
            self.login_poll_attempts
        );
        Ok(())
    }

    /// 写回浏览器 Cookie
    async fn install_cookies(&self, driver: &PageDriver, cookies: &[CookieRecord]) -> Result<()> {
        let params: Vec<CookieParam> = cookies
            .iter()
            .filter_map(|c| {
                CookieParam::builder()
                    .name(c.name.clone())
                    .value(c.value.clone())
                    .domain(c.domain.clone())
                    .path(c.path.clone())
                    .secure(c.secure)
                    .http_only(c.http_only)
                    .build()
                    .ok()
            })
            .collect();
        debug!("写回 {} 个 Cookie", params.len());
        driver.page().set_cookies(params).await?;
        Ok(())
    }

    /// 写回 localStorage 快照
    async fn install_storage(
        &self,
        driver: &PageDriver,
        storage: &BTreeMap<String, String>,
    ) -> Result<()> {
        if storage.is_empty() {
            return Ok(());
        }
        let entries = serde_json::to_string(storage).context("序列化 localStorage 快照失败")?;
        let js = format!(
            "(() => {{ const entries = {}; for (const [k, v] of Object.entries(entries)) \
             {{ localStorage.setItem(k, v); }} return Object.keys(entries).length; }})()",
            entries
        );
        driver.eval(js).await?;
        Ok(())
    }

    /// 持久化当前会话
    ///
    /// 持久化失败大声记录但不中止运行：代价只是下次需要重新登录
    async fn persist_session(&self, driver: &PageDriver) {
        let result = self.collect_session(driver).await;
        match result {
            Ok(state) => {
                if let Err(e) = state.save(&self.session_file).await {
                    error!("⚠️ 会话持久化失败（下次运行需重新登录）: {}", e);
                } else {
                    info!("💾 会话已保存至: {}", self.session_file);
                }
            }
            Err(e) => error!("⚠️ 采集会话状态失败（下次运行需重新登录）: {}", e),
        }
    }

    /// 采集当前浏览器的 Cookie 和 localStorage
    async fn collect_session(&self, driver: &PageDriver) -> Result<SessionState> {
        let cookies = driver
            .page()
            .get_cookies()
            .await
            .context("读取浏览器 Cookie 失败")?
            .into_iter()
            .map(|c| CookieRecord {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                secure: c.secure,
                http_only: c.http_only,
            })
            .collect();

        let storage: BTreeMap<String, String> = driver
            .eval_as(
                "(() => { const out = {}; for (let i = 0; i < localStorage.length; i++) \
                 { const k = localStorage.key(i); out[k] = localStorage.getItem(k); } \
                 return out; })()",
            )
            .await
            .unwrap_or_default();

        Ok(SessionState::new(cookies, storage))
    }
}

/// 记录会话状态转换
fn enter(phase: SessionPhase) {
    debug!("会话阶段: {:?}", phase);
}

/// 判断落点地址是否为已认证页面
fn is_authenticated_url(url: &str) -> bool {
    SUCCESS_MARKERS.iter().any(|m| url.contains(m))
}

/// 判断落点地址是否为人机验证页面
fn is_challenge_url(url: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|m| url.contains(m))
}

/// 逐字输入，字符间随机延迟 50-150ms
pub(crate) async fn type_slowly(element: &chromiumoxide::Element, text: &str) -> Result<()> {
    element.click().await.context("聚焦输入框失败")?;
    for ch in text.chars() {
        element
            .type_str(ch.to_string())
            .await
            .context("输入字符失败")?;
        let delay = rand::thread_rng().gen_range(50..150);
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }
    Ok(())
}

/// 字段之间随机停顿 500-1000ms
async fn pause_between_fields() {
    let delay = rand::thread_rng().gen_range(500..1000);
    tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_markers() {
        assert!(is_authenticated_url("https://www.linkedin.com/feed/"));
        assert!(is_authenticated_url("https://www.linkedin.com/in/someone"));
        assert!(!is_authenticated_url("https://www.linkedin.com/login"));
    }

    #[test]
    fn test_challenge_markers() {
        assert!(is_challenge_url("https://www.linkedin.com/checkpoint/challenge/x"));
        assert!(is_challenge_url("https://www.linkedin.com/challenge"));
        assert!(!is_challenge_url("https://www.linkedin.com/feed/"));
    }

    #[test]
    fn test_login_url_is_not_authenticated() {
        // 探测落在登录页意味着会话失效，必须转入重新登录
        assert!(!is_authenticated_url("https://www.linkedin.com/login?from=homepage"));
    }
}
