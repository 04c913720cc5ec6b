pub mod config;
pub mod errors;
pub mod filters;
pub mod launcher;
pub mod logging;
pub mod metrics;
pub mod results;
pub mod search;

pub use config::{ConfigOverrides, FileTypeFilter, KeywordLogic, SearchConfig, SearchCriteria};
pub use errors::{ExtractError, SearchError, SearchResult};
pub use filters::FileType;
pub use metrics::{ScanMetrics, ScanStats};
pub use results::{FileResult, KeywordTally, ScanSummary, SearchReport};
pub use search::{CancellationToken, ScanEvent, ScanHandle, ScanState, SearchEngine};
