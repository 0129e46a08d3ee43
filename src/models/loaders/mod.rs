pub mod selector_loader;

pub use selector_loader::{load_or_builtin, load_selector_book};
