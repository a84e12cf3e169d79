pub mod config;
pub mod errors;
pub mod metrics;
pub mod report;
pub mod results;
pub mod search;

pub use config::{ConfigOverrides, SearchConfig};
pub use errors::{SearchError, SearchResult};
pub use report::{CollectingReporter, Reporter, StdoutReporter};
pub use results::{SearchOutcome, WorkerFailure};
pub use search::{search, search_with_reporter};
