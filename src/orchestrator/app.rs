//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责资源初始化和运行调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、启动或附加浏览器、加载选择器配置
//! 2. **会话保障**：委托 SessionManager 恢复或建立登录态
//! 3. **职位发现**：委托 JobDiscovery 产出去重后的职位列表
//! 4. **投递调度**：委托 Engine 顺序处理并维护投递上限
//! 5. **资源管理**：唯一持有 Browser，确保生命周期正确
//! 6. **最终统计**：无论成败都输出运行摘要

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{ElementResolver, PageDriver};
use crate::models::loaders::selector_loader;
use crate::models::run::RunParams;
use crate::orchestrator::engine::Engine;
use crate::services::{JobDiscovery, ScreenshotSink, SessionManager};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    params: RunParams,
    _browser: Browser,
    driver: PageDriver,
    resolver: ElementResolver,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;

        let params = RunParams::from_config(&config).context("运行参数解析失败")?;
        logging::log_startup(
            &params.keywords,
            &params.location,
            &params.mode.to_string(),
            params.submission_cap,
        );

        // 端口非零时附加到操作员已打开的浏览器，否则自行启动
        let (browser, page) = if config.browser_debug_port > 0 {
            browser::connect_to_browser_and_page(config.browser_debug_port, Some(&config.base_url))
                .await?
        } else {
            browser::launch_browser(config.headless).await?
        };

        let driver = PageDriver::new(page, config.navigation_timeout_ms);

        let book = selector_loader::load_or_builtin(&config.selector_file).await;
        info!("📖 选择器配置版本: {}", book.version);
        let resolver = ElementResolver::new(book, config.resolver_wait_ms, config.resolver_poll_ms);

        Ok(Self {
            config,
            params,
            _browser: browser,
            driver,
            resolver,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<()> {
        let checkpoints = ScreenshotSink::new(&self.config.screenshot_dir);

        // 登录态保障
        let session = SessionManager::new(&self.config);
        session
            .ensure_authenticated(&self.driver, &self.resolver)
            .await?;
        let _ = checkpoints.capture(&self.driver, 0, "login").await;

        // 职位发现
        let discovery = JobDiscovery::new(&self.config);
        let jobs = discovery
            .discover(
                &self.driver,
                &self.resolver,
                &self.params.keywords,
                &self.params.location,
                self.params.results_cap,
            )
            .await?;
        logging::log_jobs_found(jobs.len(), self.params.results_cap);
        let _ = checkpoints.capture(&self.driver, 0, "search_results").await;

        if jobs.is_empty() {
            warn!("⚠️ 没有发现可处理的职位，程序结束");
            logging::print_final_stats(&Default::default(), &self.config.output_log_file);
            return Ok(());
        }

        // 投递前重载一次选择器配置，发现阶段期间改动的文件立即生效
        let book = selector_loader::load_or_builtin(&self.config.selector_file).await;
        info!("📖 投递阶段选择器配置版本: {}", book.version);
        self.resolver = ElementResolver::new(
            book,
            self.config.resolver_wait_ms,
            self.config.resolver_poll_ms,
        );

        // Ctrl-C 只设标志，在职位之间生效，进行中的提交会走完
        let interrupted = Arc::new(AtomicBool::new(false));
        {
            let flag = interrupted.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("收到 Ctrl-C，将在当前职位处理完后停止");
                    flag.store(true, Ordering::Relaxed);
                }
            });
        }

        // 投递调度
        let engine = Engine::new(&self.config, self.params.clone());
        let summary = engine
            .run(&self.driver, &self.resolver, jobs, interrupted)
            .await?;

        logging::print_final_stats(&summary, &self.config.output_log_file);
        Ok(())
    }
}
