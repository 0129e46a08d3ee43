use auto_job_apply::browser::{connect_to_browser_and_page, launch_browser};
use auto_job_apply::config::Config;
use auto_job_apply::infrastructure::{ElementResolver, PageDriver};
use auto_job_apply::models::locator::{LocatorBook, Role};
use auto_job_apply::services::{JobDiscovery, SessionManager};
use auto_job_apply::utils::logging;

#[tokio::test]
#[ignore]
async fn test_resolver_reports_winning_selector_rank() {
    // 初始化日志
    logging::init();

    let (_browser, page) = launch_browser(true).await.expect("启动浏览器失败");
    let html = "<html><body><div class=\"present-card\">目标</div></body></html>";
    page.goto(format!("data:text/html,{}", urlencoding::encode(html)))
        .await
        .expect("写入页面内容失败");

    // 前两个候选选择器都不命中，只有第三个命中
    let mut book = LocatorBook::builtin();
    book.override_role(
        Role::JobCard,
        vec![
            ".missing-primary".to_string(),
            "#missing-secondary".to_string(),
            ".present-card".to_string(),
        ],
    );
    let resolver = ElementResolver::new(book, 3000, 100);

    let found = resolver
        .resolve(&page, Role::JobCard)
        .await
        .expect("第三个选择器应该命中");
    assert_eq!(found.rank, 2, "记录的应该是命中选择器的序位");
    assert_eq!(found.selector, ".present-card");
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_launch() {
    // 初始化日志
    logging::init();

    // 自行启动浏览器并打开空白页
    let result = launch_browser(true).await;

    assert!(result.is_ok(), "应该能够成功启动浏览器");
}

#[tokio::test]
#[ignore]
async fn test_browser_connection() {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 测试附加到已运行的浏览器（需要提前以调试端口打开）
    let result =
        connect_to_browser_and_page(config.browser_debug_port, Some(&config.base_url)).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_session_restore_or_login() {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    let (_browser, page) = launch_browser(config.headless)
        .await
        .expect("启动浏览器失败");
    let driver = PageDriver::new(page, config.navigation_timeout_ms);
    let resolver = ElementResolver::new(
        LocatorBook::builtin(),
        config.resolver_wait_ms,
        config.resolver_poll_ms,
    );

    // 会话恢复或交互式登录（可能需要在终端输入凭证）
    let session = SessionManager::new(&config);
    let result = session.ensure_authenticated(&driver, &resolver).await;

    assert!(result.is_ok(), "登录态保障应该成功");
}

#[tokio::test]
#[ignore]
async fn test_discover_jobs() {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    let (_browser, page) = launch_browser(config.headless)
        .await
        .expect("启动浏览器失败");
    let driver = PageDriver::new(page, config.navigation_timeout_ms);
    let resolver = ElementResolver::new(
        LocatorBook::builtin(),
        config.resolver_wait_ms,
        config.resolver_poll_ms,
    );

    let session = SessionManager::new(&config);
    session
        .ensure_authenticated(&driver, &resolver)
        .await
        .expect("登录态保障失败");

    // 发现职位
    let discovery = JobDiscovery::new(&config);
    let jobs = discovery
        .discover(&driver, &resolver, &config.keywords, &config.location, 5)
        .await
        .expect("职位发现失败");

    for job in &jobs {
        println!("发现职位: {} @ {} ({})", job.title, job.company, job.location);
    }
    assert!(jobs.len() <= 5, "结果数不应超过上限");
}
