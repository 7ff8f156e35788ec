//! Virtual-user engine for auction load tests.
//!
//! A [`Run`] spawns one [`VirtualUser`] per configured user. Each user resolves a
//! synthetic identity, logs in once, then submits a fixed number of paced,
//! randomized bids. Outcomes are folded into a shared [`BidMetrics`] aggregator
//! and returned as a [`RunReport`] once every user has finished.
pub mod aggregator;
pub mod diagnostics;
pub mod driver;
pub mod pacer;
pub mod report;
pub mod run;
pub mod session;
pub mod submit;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_utils;

pub use aggregator::BidMetrics;
pub use driver::{DriverState, UserReport, VirtualUser};
pub use report::{RunReport, UserCounts};
pub use run::Run;

pub mod prelude {
    pub use crate::diagnostics::{Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
    pub use crate::report::RunReport;
    pub use crate::run::Run;
    pub use crate::transport::{ReqwestTransport, Transport};

    pub use bidswarm_core::{BidConfig, BidRange, ConfigError, MetricsSnapshot};
}
