//! 职位发现服务 - 业务能力层
//!
//! 构造确定性的搜索地址，滚动触发增量加载，从卡片提取去重后的
//! 有序职位列表。目标站点按滚动渐进渲染结果，没有分页链接。
//!
//! 提取策略分两级：结构化选择器优先；可用字段不足时退回文本分行
//! 启发式（置信度更低，按行位赋值）。

use std::collections::HashSet;

use anyhow::{Context, Result};
use chromiumoxide::Element;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::{ElementResolver, PageDriver};
use crate::models::job::{ApplyKind, JobRecord};
use crate::models::locator::Role;

/// 文本启发式提取要求的最少行数
const MIN_FALLBACK_LINES: usize = 3;
/// 结构化提取要求的最少可用字段数
const MIN_STRUCTURAL_FIELDS: usize = 2;

/// 职位发现服务
pub struct JobDiscovery {
    base_url: String,
    scroll_rounds: usize,
    scroll_settle_ms: u64,
    min_title_len: usize,
}

impl JobDiscovery {
    /// 创建新的发现服务
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            scroll_rounds: config.scroll_rounds,
            scroll_settle_ms: config.scroll_settle_ms,
            min_title_len: config.min_title_len,
        }
    }

    /// 构造确定性的搜索地址
    ///
    /// f_AL 过滤站内快速申请，f_TPR 限定最近 24 小时发布
    pub fn build_search_url(&self, keywords: &str, location: &str) -> String {
        format!(
            "{}/jobs/search/?keywords={}&location={}&f_AL=true&f_TPR=r86400",
            self.base_url,
            urlencoding::encode(keywords),
            urlencoding::encode(location)
        )
    }

    /// 执行一轮职位发现
    ///
    /// 达到结果上限或滚动预算耗尽即停止，稀疏结果集不会无限滚动
    pub async fn discover(
        &self,
        driver: &PageDriver,
        resolver: &ElementResolver,
        keywords: &str,
        location: &str,
        results_cap: usize,
    ) -> Result<Vec<JobRecord>> {
        let url = self.build_search_url(keywords, location);
        info!("🌐 打开搜索页: {}", url);
        driver.goto(&url).await?;
        driver.settle(5000).await;

        let ws_re = Regex::new(r"\s+").context("构造空白压缩正则失败")?;
        let mut collector = RecordCollector::new(results_cap);

        // 首轮直接提取，之后每轮滚动到底部再提取
        for round in 0..=self.scroll_rounds {
            if round > 0 {
                debug!("📜 滚动加载 {}/{}", round, self.scroll_rounds);
                driver.scroll_to_bottom().await?;
                driver.settle(self.scroll_settle_ms).await;
            }

            // 每轮重新解析卡片角色；旧句柄一律作废，DOM 节点可能已被替换
            let cards = match resolver.resolve_all(driver.page(), Role::JobCard).await {
                Ok(set) => {
                    debug!("卡片选择器 #{} 命中 {} 个", set.rank, set.elements.len());
                    set.elements
                }
                Err(e) => {
                    warn!("⚠️ 本轮未找到职位卡片: {}", e);
                    continue;
                }
            };

            for card in &cards {
                if collector.is_full() {
                    break;
                }
                match self.extract_card(resolver, card, &ws_re).await {
                    Ok(Some(record)) => {
                        if collector.offer(record) {
                            let last = collector.records.last();
                            if let Some(r) = last {
                                info!(
                                    "📝 职位 {}: {} @ {}",
                                    collector.records.len(),
                                    r.title,
                                    r.company
                                );
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(e) => debug!("卡片提取失败: {}", e),
                }
            }

            if collector.is_full() {
                info!("✓ 已达到结果上限 {}", results_cap);
                break;
            }
        }

        Ok(collector.into_records())
    }

    /// 从单个卡片提取职位记录
    ///
    /// # 返回
    /// 卡片不合格（广告、栏目标题等）时返回 None
    async fn extract_card(
        &self,
        resolver: &ElementResolver,
        card: &Element,
        ws_re: &Regex,
    ) -> Result<Option<JobRecord>> {
        // 站点分配的职位 ID：属性提取最稳定
        let id = match card.attribute("data-occludable-job-id").await? {
            Some(id) => Some(id),
            None => card.attribute("data-job-id").await?,
        };

        // 一级策略：结构化选择器
        let title = self.sub_text(resolver, card, Role::JobTitle, ws_re).await;
        let company = self.sub_text(resolver, card, Role::JobCompany, ws_re).await;
        let location = self.sub_text(resolver, card, Role::JobLocation, ws_re).await;

        let usable = [&title, &company, &location]
            .iter()
            .filter(|v| v.is_some())
            .count();

        let (title, company, location) = if usable >= MIN_STRUCTURAL_FIELDS {
            (
                title.unwrap_or_default(),
                company.unwrap_or_default(),
                location.unwrap_or_default(),
            )
        } else {
            // 二级策略：文本分行启发式（置信度更低，仅在结构化不足时使用）
            let text = card.inner_text().await?.unwrap_or_default();
            match fallback_fields(&text) {
                Some(fields) => fields,
                None => return Ok(None),
            }
        };

        if !is_acceptable(&title, &company, self.min_title_len) {
            return Ok(None);
        }

        // 详情链接（可缺失）
        let url = match resolver.try_resolve_in(card, Role::JobLink).await {
            Some(link) => link
                .element
                .attribute("href")
                .await?
                .map(|href| self.absolutize(&href)),
            None => None,
        };

        Ok(Some(JobRecord {
            id,
            title,
            company,
            location,
            url,
            apply_kind: ApplyKind::Unknown,
        }))
    }

    /// 在卡片子树内提取文本字段
    async fn sub_text(
        &self,
        resolver: &ElementResolver,
        card: &Element,
        role: Role,
        ws_re: &Regex,
    ) -> Option<String> {
        let found = resolver.try_resolve_in(card, role).await?;
        let text = found.element.inner_text().await.ok().flatten()?;
        let cleaned = ws_re.replace_all(text.trim(), " ").to_string();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }

    fn absolutize(&self, href: &str) -> String {
        if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}{}", self.base_url, href)
        }
    }
}

/// 文本分行启发式
///
/// 可见文本按行切分，前三个非空行按位置赋给标题/公司/地点。
/// 不足三行的卡片（广告、栏目标题）直接拒绝。
fn fallback_fields(text: &str) -> Option<(String, String, String)> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < MIN_FALLBACK_LINES {
        return None;
    }
    Some((
        lines[0].to_string(),
        lines[1].to_string(),
        lines[2].to_string(),
    ))
}

/// 卡片接受规则：标题和公司非空，且标题长度达到阈值
fn is_acceptable(title: &str, company: &str, min_title_len: usize) -> bool {
    !title.is_empty() && !company.is_empty() && title.chars().count() >= min_title_len
}

/// 去重收集器
///
/// 身份键首次出现者保留，后续重复静默丢弃；达到上限即拒收
struct RecordCollector {
    seen: HashSet<String>,
    records: Vec<JobRecord>,
    cap: usize,
}

impl RecordCollector {
    fn new(cap: usize) -> Self {
        Self {
            seen: HashSet::new(),
            records: Vec::new(),
            cap,
        }
    }

    /// 尝试收纳一条记录
    ///
    /// # 返回
    /// 被接受返回 true；重复或已满返回 false
    fn offer(&mut self, record: JobRecord) -> bool {
        if self.records.len() >= self.cap {
            return false;
        }
        if !self.seen.insert(record.identity_key()) {
            return false;
        }
        self.records.push(record);
        true
    }

    fn is_full(&self) -> bool {
        self.records.len() >= self.cap
    }

    fn into_records(self) -> Vec<JobRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: Option<&str>, title: &str, company: &str) -> JobRecord {
        JobRecord {
            id: id.map(|s| s.to_string()),
            title: title.to_string(),
            company: company.to_string(),
            location: "Remote".to_string(),
            url: None,
            apply_kind: ApplyKind::Unknown,
        }
    }

    #[test]
    fn test_search_url_is_encoded() {
        let discovery = JobDiscovery::new(&Config::default());
        let url = discovery.build_search_url("Rust Engineer", "São Paulo");
        assert!(url.contains("keywords=Rust%20Engineer"));
        assert!(url.contains("location=S%C3%A3o%20Paulo"));
        assert!(url.contains("f_AL=true"));
    }

    #[test]
    fn test_fallback_rejects_two_lines() {
        // 只有两个非空行的卡片不是职位（栏目标题或广告）
        assert!(fallback_fields("Rust Engineer\n\nAcme Corp\n").is_none());
    }

    #[test]
    fn test_fallback_accepts_three_lines() {
        let (title, company, location) =
            fallback_fields("  Rust Engineer \nAcme Corp\nRemote (US)\nEasy Apply").unwrap();
        assert_eq!(title, "Rust Engineer");
        assert_eq!(company, "Acme Corp");
        assert_eq!(location, "Remote (US)");
    }

    #[test]
    fn test_acceptance_rules() {
        assert!(is_acceptable("Rust Engineer", "Acme", 6));
        assert!(!is_acceptable("", "Acme", 6));
        assert!(!is_acceptable("Rust Engineer", "", 6));
        // 过短的"标题"通常是栏目头
        assert!(!is_acceptable("Jobs", "Acme", 6));
    }

    #[test]
    fn test_collector_dedup_first_wins() {
        let mut collector = RecordCollector::new(10);
        assert!(collector.offer(record(Some("1"), "Rust Engineer", "Acme")));
        assert!(!collector.offer(record(Some("1"), "Another Title", "Other")));
        assert!(collector.offer(record(None, "Rust Engineer", "Globex")));
        // 组合键重复也会被丢弃
        assert!(!collector.offer(record(None, "rust  engineer", "GLOBEX")));

        let records = collector.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].company, "Acme");
    }

    #[test]
    fn test_collector_honors_cap() {
        let mut collector = RecordCollector::new(2);
        assert!(collector.offer(record(Some("1"), "Rust Engineer", "A")));
        assert!(collector.offer(record(Some("2"), "Rust Engineer", "B")));
        assert!(collector.is_full());
        assert!(!collector.offer(record(Some("3"), "Rust Engineer", "C")));
        assert_eq!(collector.into_records().len(), 2);
    }

    #[test]
    fn test_collector_is_deterministic() {
        // 同样的输入序列产生同样的有序输出
        let input = vec![
            record(Some("1"), "Rust Engineer", "Acme"),
            record(Some("2"), "Go Developer", "Globex"),
            record(Some("1"), "Rust Engineer", "Acme"),
            record(Some("3"), "C++ Engineer", "Initech"),
        ];

        let run = |input: &[JobRecord]| {
            let mut c = RecordCollector::new(10);
            for r in input {
                c.offer(r.clone());
            }
            c.into_records()
                .iter()
                .map(|r| r.identity_key())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(&input), run(&input));
        assert_eq!(run(&input).len(), 3);
    }
}
