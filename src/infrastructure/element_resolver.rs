//! 元素解析器 - 基础设施层
//!
//! 给定语义角色，按置信度顺序尝试候选选择器，返回第一个命中的活元素。
//! 解析本身只读（不点击不输入）；唯一的例外是 `resolve_and_click`
//! 便捷形式，仅供申请流程层使用。
//!
//! 等待有界：总预算大约几秒，绝不无限等待。失败结果携带尝试过的
//! 选择器列表，调用方据此诊断而不是反复重试。

use std::time::Duration;

use chromiumoxide::{Element, Page};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::ResolutionFailure;
use crate::models::locator::{LocatorBook, Role};

/// 解析成功的元素，记录命中的选择器及其置信度序号
pub struct ResolvedElement {
    pub element: Element,
    pub selector: String,
    pub rank: usize,
}

/// 同一角色的全部活元素（按 DOM 顺序）
pub struct ResolvedSet {
    pub elements: Vec<Element>,
    pub selector: String,
    pub rank: usize,
}

/// 元素解析器
pub struct ElementResolver {
    book: LocatorBook,
    wait: Duration,
    poll: Duration,
}

impl ElementResolver {
    /// 创建新的元素解析器
    pub fn new(book: LocatorBook, wait_ms: u64, poll_ms: u64) -> Self {
        Self {
            book,
            wait: Duration::from_millis(wait_ms),
            poll: Duration::from_millis(poll_ms),
        }
    }

    /// 当前选择器表版本
    pub fn book_version(&self) -> &str {
        &self.book.version
    }

    /// 解析角色对应的第一个活元素
    ///
    /// 在等待预算内轮询；每轮按置信度顺序尝试全部候选选择器，
    /// 同一选择器命中多个元素时取 DOM 顺序第一个
    pub async fn resolve(&self, page: &Page, role: Role) -> Result<ResolvedElement, ResolutionFailure> {
        let deadline = Instant::now() + self.wait;
        loop {
            if let Some(found) = self.single_pass(page, role).await {
                return Ok(found);
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(self.poll).await;
        }
        Err(self.failure(role))
    }

    /// 解析角色对应的全部活元素
    ///
    /// 调用方每次都拿到新鲜的元素列表；旧列表一律作废不可复用，
    /// 因为底层 DOM 节点可能已被替换
    pub async fn resolve_all(&self, page: &Page, role: Role) -> Result<ResolvedSet, ResolutionFailure> {
        let deadline = Instant::now() + self.wait;
        loop {
            for entry in self.book.selectors_for(role) {
                if let Ok(elements) = page.find_elements(&entry.selector).await {
                    if !elements.is_empty() {
                        debug!(
                            "角色 {} 命中选择器 #{}: {} ({} 个元素)",
                            role,
                            entry.rank,
                            entry.selector,
                            elements.len()
                        );
                        return Ok(ResolvedSet {
                            elements,
                            selector: entry.selector.clone(),
                            rank: entry.rank,
                        });
                    }
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(self.poll).await;
        }
        Err(self.failure(role))
    }

    /// 单轮尝试，不等待
    ///
    /// 用于"存在即分类"的探测场景（如申请按钮检测）
    pub async fn try_resolve(&self, page: &Page, role: Role) -> Option<ResolvedElement> {
        self.single_pass(page, role).await
    }

    /// 在元素子树内解析角色（单轮，不等待）
    pub async fn try_resolve_in(&self, scope: &Element, role: Role) -> Option<ResolvedElement> {
        for entry in self.book.selectors_for(role) {
            if let Ok(elements) = scope.find_elements(&entry.selector).await {
                if let Some(element) = elements.into_iter().next() {
                    return Some(ResolvedElement {
                        element,
                        selector: entry.selector.clone(),
                        rank: entry.rank,
                    });
                }
            }
        }
        None
    }

    /// 在元素子树内解析角色的全部元素（单轮，不等待）
    pub async fn try_resolve_all_in(&self, scope: &Element, role: Role) -> Vec<Element> {
        for entry in self.book.selectors_for(role) {
            if let Ok(elements) = scope.find_elements(&entry.selector).await {
                if !elements.is_empty() {
                    return elements;
                }
            }
        }
        Vec::new()
    }

    /// 解析并点击
    ///
    /// 解析器唯一的读写便捷形式，仅供申请流程层使用
    pub async fn resolve_and_click(
        &self,
        page: &Page,
        role: Role,
    ) -> Result<ResolvedElement, ResolutionFailure> {
        let found = self.resolve(page, role).await?;
        let clicked = async {
            found.element.scroll_into_view().await?;
            found.element.click().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        }
        .await;
        if clicked.is_err() {
            // 点击失败视同解析失败：元素在点击前已失效
            return Err(self.failure(role));
        }
        debug!("✓ 已点击角色 {} (选择器: {})", role, found.selector);
        Ok(found)
    }

    async fn single_pass(&self, page: &Page, role: Role) -> Option<ResolvedElement> {
        for entry in self.book.selectors_for(role) {
            if let Ok(elements) = page.find_elements(&entry.selector).await {
                if let Some(element) = elements.into_iter().next() {
                    debug!("角色 {} 命中选择器 #{}: {}", role, entry.rank, entry.selector);
                    return Some(ResolvedElement {
                        element,
                        selector: entry.selector.clone(),
                        rank: entry.rank,
                    });
                }
            }
        }
        None
    }

    fn failure(&self, role: Role) -> ResolutionFailure {
        ResolutionFailure {
            role: role.as_str().to_string(),
            attempted: self
                .book
                .selectors_for(role)
                .iter()
                .map(|e| e.selector.clone())
                .collect(),
            wait_ms: self.wait.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::locator::LocatorBook;

    #[test]
    fn test_failure_lists_all_attempted_selectors() {
        let resolver = ElementResolver::new(LocatorBook::builtin(), 3000, 250);
        let failure = resolver.failure(Role::EasyApplyButton);

        assert_eq!(failure.role, "easy-apply-button");
        assert_eq!(failure.wait_ms, 3000);
        assert_eq!(
            failure.attempted.len(),
            LocatorBook::builtin().selectors_for(Role::EasyApplyButton).len()
        );
        // 错误信息可直接用于诊断
        let message = failure.to_string();
        assert!(message.contains("easy-apply-button"));
        assert!(message.contains("aria-label"));
    }
}
