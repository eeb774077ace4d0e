pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod results;
pub mod scan;
pub mod terms;

pub use config::{ConfigOverrides, ScanConfig};
pub use errors::{ScanError, ScanResult};
pub use metrics::ScanStats;
pub use results::{ScanMatch, ScanOutcome};
pub use scan::scan;
pub use terms::{Term, TermSet};
