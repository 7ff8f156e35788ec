//! Run coordination: spawn every virtual user, wait, aggregate.
use crate::aggregator::BidMetrics;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::driver::VirtualUser;
use crate::report::{RunReport, UserCounts};
use crate::transport::Transport;
use bidswarm_core::{BidConfig, ConfigError, IdentityPool};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Read-only state handed to every virtual user of a run.
pub(crate) struct RunContext<T> {
    pub config: BidConfig,
    pub auction_id: i64,
    pub pool: IdentityPool,
    pub login_url: String,
    pub bid_url: String,
    pub transport: T,
    pub sink: Arc<dyn DiagnosticSink>,
    pub metrics: BidMetrics,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl<T> RunContext<T> {
    pub fn new(
        config: BidConfig,
        auction_id: i64,
        transport: T,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let limiter = config.max_rps.map(rate_limiter);

        Self {
            pool: config.identity_pool(),
            login_url: config.login_url(),
            bid_url: config.bid_url(),
            auction_id,
            config,
            transport,
            sink,
            metrics: BidMetrics::new(),
            limiter,
        }
    }

    /// Wait for the shared request budget, if one is configured.
    pub async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

fn rate_limiter(max_rps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(max_rps).allow_burst(NonZeroU32::MIN))
}

/// A configured bidding run.
///
/// # Example
/// ```no_run
/// use bidswarm::prelude::*;
///
/// #[tokio::main]
/// async fn main() {
///     let config = BidConfig::new("http://localhost:3333").auction_id(42).users(50);
///     let report = Run::new(config, ReqwestTransport::new())
///         .run()
///         .await
///         .expect("invalid configuration");
///     println!("{report}");
/// }
/// ```
pub struct Run<T> {
    config: BidConfig,
    transport: T,
    sink: Arc<dyn DiagnosticSink>,
}

impl<T> Run<T>
where
    T: Transport + Sync + 'static,
{
    pub fn new(config: BidConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            sink: Arc::new(TracingSink),
        }
    }

    /// Send failure diagnostics somewhere other than the tracing log.
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Run every virtual user to completion, or until `max_duration` expires.
    ///
    /// Fails before any request is sent if the configuration is invalid.
    #[instrument(name = "run", skip_all, fields(auction = ?self.config.auction_id, users = self.config.users))]
    pub async fn run(self) -> Result<RunReport, ConfigError> {
        let auction_id = self.config.validate()?;
        info!("Starting run\n{}", self.config);

        let ctx = Arc::new(RunContext::new(
            self.config,
            auction_id,
            self.transport,
            self.sink,
        ));

        let start = Instant::now();
        let deadline = start + ctx.config.max_duration;

        let mut handles: Vec<JoinHandle<_>> = (1..=ctx.config.users)
            .map(|ordinal| {
                let user = VirtualUser::new(ordinal, ctx.clone());
                tokio::spawn(user.run().in_current_span())
            })
            .collect();

        let mut users = UserCounts::default();
        let mut deadline_hit = false;
        for idx in 0..handles.len() {
            let joined = if deadline_hit {
                (&mut handles[idx]).await
            } else {
                match timeout_at(deadline, &mut handles[idx]).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!(
                            "Deadline of {} reached, interrupting outstanding virtual users.",
                            humantime::format_duration(ctx.config.max_duration)
                        );
                        deadline_hit = true;
                        handles[idx..].iter().for_each(JoinHandle::abort);
                        (&mut handles[idx]).await
                    }
                }
            };

            match joined {
                Ok(report) => users.record(&report),
                Err(err) => {
                    if !err.is_cancelled() {
                        error!("Virtual user task failed: {err}");
                    }
                    users.interrupted += 1;
                }
            }
        }

        let elapsed = start.elapsed();
        let snapshot = ctx.metrics.snapshot();
        info!("Run complete in {}: {snapshot}", humantime::format_duration(elapsed));

        Ok(RunReport {
            config: ctx.config.clone(),
            snapshot,
            users,
            elapsed,
            deadline_hit,
        })
    }
}
