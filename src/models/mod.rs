pub mod form;
pub mod job;
pub mod loaders;
pub mod locator;
pub mod outcome;
pub mod run;
pub mod session;

pub use form::{classify_complexity, FieldKind, FormComplexity, FormField};
pub use job::{ApplyKind, JobRecord};
pub use loaders::{load_or_builtin, load_selector_book};
pub use locator::{LocatorBook, Role, SelectorEntry};
pub use outcome::{ApplicationOutcome, Decision};
pub use run::{RunMode, RunParams, RunSummary};
pub use session::{CookieRecord, SessionState};
