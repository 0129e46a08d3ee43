pub mod audit_log;
pub mod field_classifier;
pub mod form_inspector;
pub mod job_discovery;
pub mod screenshot_sink;
pub mod session_manager;

pub use audit_log::AuditLog;
pub use field_classifier::FieldClassifier;
pub use form_inspector::{FormInspector, FormReport};
pub use job_discovery::JobDiscovery;
pub use screenshot_sink::ScreenshotSink;
pub use session_manager::SessionManager;
