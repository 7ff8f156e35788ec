//! Operator entry point.
//!
//! Every flag can also be supplied through the environment variable named in
//! its help text, so existing `-e NAME=value` style invocations keep working.
use anyhow::Context;
use bidswarm::prelude::*;
use bidswarm_core::*;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, instrument};

const DEFAULT_REPORT_DIR: &str = "reports";

#[derive(Parser, Debug)]
#[command(version, about = "Simulate concurrent bidders against an auction backend")]
#[command(allow_negative_numbers = true)]
pub struct BidswarmCli {
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = "USER_LOGIN_PATH", default_value = DEFAULT_LOGIN_PATH)]
    pub login_path: String,

    #[arg(long, env = "BID_PATH", default_value = DEFAULT_BID_PATH)]
    pub bid_path: String,

    /// Auction to bid on. Required.
    #[arg(short, long, env = "LELANG_ID")]
    pub auction_id: Option<i64>,

    #[arg(long, env = "USER_PREFIX", default_value = DEFAULT_USER_PREFIX)]
    pub user_prefix: String,

    #[arg(long, env = "USER_DOMAIN", default_value = DEFAULT_USER_DOMAIN)]
    pub user_domain: String,

    /// Appended to the login as `-<suffix>`.
    #[arg(long, env = "USER_EMAIL_SUFFIX")]
    pub user_email_suffix: Option<String>,

    #[arg(long, env = "USER_PASSWORD", default_value = DEFAULT_USER_PASSWORD)]
    pub user_password: String,

    /// Number of concurrent virtual users.
    #[arg(short, long, env = "USER_COUNT", default_value_t = DEFAULT_USER_COUNT)]
    pub users: u32,

    #[arg(long, env = "USER_INDEX_MIN", default_value_t = 1)]
    pub index_min: u32,

    /// Defaults to the user count.
    #[arg(long, env = "USER_INDEX_MAX")]
    pub index_max: Option<u32>,

    /// Bids per virtual user.
    #[arg(short, long, env = "ITERATIONS", default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: u32,

    /// Minimum gap between two bids of the same user, in milliseconds.
    #[arg(long, env = "USER_PACE_MS", default_value_t = 0)]
    pub pace_ms: u64,

    #[arg(long, env = "POST_BID_DELAY_MS", default_value_t = 100)]
    pub post_bid_delay_ms: u64,

    #[arg(long, env = "LOGIN_TIMEOUT", value_parser = humantime::parse_duration, default_value = "300s")]
    pub login_timeout: Duration,

    #[arg(long, env = "REQ_TIMEOUT", value_parser = humantime::parse_duration, default_value = "300s")]
    pub request_timeout: Duration,

    /// Hard limit for the whole run; unfinished users are interrupted.
    #[arg(long, env = "MAX_DURATION", value_parser = humantime::parse_duration, default_value = "60m")]
    pub max_duration: Duration,

    #[arg(long, env = "MIN_BID", default_value_t = DEFAULT_MIN_BID)]
    pub min_bid: u64,

    #[arg(long, env = "MAX_BID", default_value_t = DEFAULT_MAX_BID)]
    pub max_bid: u64,

    #[arg(long, env = "BID_STEP", default_value_t = DEFAULT_BID_STEP)]
    pub bid_step: u64,

    /// Cap on requests per second across all users.
    #[arg(long, env = "MAX_RPS")]
    pub max_rps: Option<NonZeroU32>,

    #[arg(long, env = "REPORT_DIR", default_value = DEFAULT_REPORT_DIR)]
    pub report_dir: PathBuf,

    /// Serve Prometheus metrics on this address while the run is in progress.
    #[arg(long, env = "PROMETHEUS_ADDR")]
    pub prometheus_addr: Option<SocketAddr>,
}

impl BidswarmCli {
    pub fn to_config(&self) -> BidConfig {
        let mut config = BidConfig::new(&self.base_url);
        config.login_path = self.login_path.clone();
        config.bid_path = self.bid_path.clone();
        config.auction_id = self.auction_id;
        config.user_prefix = self.user_prefix.clone();
        config.user_domain = self.user_domain.clone();
        config.user_suffix = self.user_email_suffix.clone();
        config.password = self.user_password.clone();
        config.users = self.users;
        config.index_min = self.index_min;
        config.index_max = self.index_max;
        config.iterations = self.iterations;
        config.pace = Duration::from_millis(self.pace_ms);
        config.post_bid_delay = Duration::from_millis(self.post_bid_delay_ms);
        config.login_timeout = self.login_timeout;
        config.request_timeout = self.request_timeout;
        config.max_duration = self.max_duration;
        config.max_rps = self.max_rps;
        config.bids = BidRange::new(self.min_bid, self.max_bid, self.bid_step);
        config
    }
}

/// Runs a configured load test over HTTP and writes its reports.
///
/// # Example
///
/// ```ignore
/// use bidswarm_runtime::BidswarmRuntime;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     BidswarmRuntime::with_args().run().await?;
///     Ok(())
/// }
/// ```
pub struct BidswarmRuntime {
    config: BidConfig,
    report_dir: Option<PathBuf>,
    prometheus_addr: Option<SocketAddr>,
}

impl BidswarmRuntime {
    pub fn new(config: BidConfig) -> Self {
        Self {
            config,
            report_dir: None,
            prometheus_addr: None,
        }
    }

    /// Build the runtime from command line flags and environment variables.
    pub fn with_args() -> Self {
        Self::from_cli(BidswarmCli::parse())
    }

    pub fn from_cli(cli: BidswarmCli) -> Self {
        Self {
            config: cli.to_config(),
            report_dir: Some(cli.report_dir),
            prometheus_addr: cli.prometheus_addr,
        }
    }

    pub fn report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    pub fn prometheus(mut self, addr: SocketAddr) -> Self {
        self.prometheus_addr = Some(addr);
        self
    }

    pub fn config(&self) -> &BidConfig {
        &self.config
    }

    #[instrument(name = "bidswarm", skip_all)]
    pub async fn run(self) -> anyhow::Result<RunReport> {
        if let Some(addr) = self.prometheus_addr {
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .context("failed to install the Prometheus exporter")?;
            info!("Serving Prometheus metrics on {addr}");
        }

        let report = Run::new(self.config, ReqwestTransport::new())
            .run()
            .await
            .context("refusing to start")?;

        println!("{report}");

        if let Some(dir) = &self.report_dir {
            let path = report
                .write_json(dir)
                .with_context(|| format!("failed to write report to {}", dir.display()))?;
            info!("Wrote {}", path.display());
        }

        Ok(report)
    }
}
