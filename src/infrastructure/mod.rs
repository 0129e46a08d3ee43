pub mod element_resolver;
pub mod page_driver;

pub use element_resolver::{ElementResolver, ResolvedElement, ResolvedSet};
pub use page_driver::PageDriver;
