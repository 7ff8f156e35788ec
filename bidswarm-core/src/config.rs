use crate::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("auction id is required (set LELANG_ID)")]
    MissingAuctionId,

    #[error("auction id must be positive, got {0}")]
    NonPositiveAuctionId(i64),

    #[error("base url must not be empty")]
    EmptyBaseUrl,

    #[error("at least one virtual user is required")]
    NoUsers,

    #[error("bid step must be positive")]
    ZeroBidStep,

    #[error("minimum bid must be positive")]
    ZeroMinBid,

    #[error("minimum bid {min} exceeds maximum bid {max}")]
    InvertedBidRange { min: u64, max: u64 },
}

/// Immutable parameters of a bidding run.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BidConfig {
    pub base_url: String,
    pub login_path: String,
    pub bid_path: String,
    pub auction_id: Option<i64>,

    pub user_prefix: String,
    pub user_domain: String,
    pub user_suffix: Option<String>,
    pub password: String,
    pub index_min: u32,
    /// Defaults to `users` when unset.
    pub index_max: Option<u32>,

    pub users: u32,
    pub iterations: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub pace: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub post_bid_delay: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub login_jitter: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub login_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub request_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max_duration: Duration,
    pub max_rps: Option<NonZeroU32>,

    pub bids: BidRange,
}

impl Default for BidConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl BidConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            bid_path: DEFAULT_BID_PATH.to_string(),
            auction_id: None,
            user_prefix: DEFAULT_USER_PREFIX.to_string(),
            user_domain: DEFAULT_USER_DOMAIN.to_string(),
            user_suffix: None,
            password: DEFAULT_USER_PASSWORD.to_string(),
            index_min: 1,
            index_max: None,
            users: DEFAULT_USER_COUNT,
            iterations: DEFAULT_ITERATIONS,
            pace: Duration::ZERO,
            post_bid_delay: DEFAULT_POST_BID_DELAY,
            login_jitter: DEFAULT_LOGIN_JITTER,
            login_timeout: DEFAULT_TIMEOUT,
            request_timeout: DEFAULT_TIMEOUT,
            max_duration: DEFAULT_MAX_DURATION,
            max_rps: None,
            bids: BidRange::new(DEFAULT_MIN_BID, DEFAULT_MAX_BID, DEFAULT_BID_STEP),
        }
    }

    pub fn auction_id(mut self, auction_id: i64) -> Self {
        self.auction_id = Some(auction_id);
        self
    }

    pub fn users(mut self, users: u32) -> Self {
        self.users = users;
        self
    }

    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    pub fn bids(mut self, bids: BidRange) -> Self {
        self.bids = bids;
        self
    }

    /// Disable the fixed sleeps between steps. Mostly useful for tests.
    pub fn without_delays(mut self) -> Self {
        self.post_bid_delay = Duration::ZERO;
        self.login_jitter = Duration::ZERO;
        self
    }

    pub fn login_url(&self) -> String {
        format!("{}{}", self.base_url, self.login_path)
    }

    pub fn bid_url(&self) -> String {
        format!("{}{}", self.base_url, self.bid_path)
    }

    pub fn identity_pool(&self) -> IdentityPool {
        IdentityPool {
            prefix: self.user_prefix.clone(),
            domain: self.user_domain.clone(),
            suffix: self.user_suffix.clone(),
            index_min: self.index_min,
            index_max: self.index_max.unwrap_or(self.users),
        }
    }

    /// Check the configuration and return the validated auction id.
    pub fn validate(&self) -> Result<i64, ConfigError> {
        let auction_id = match self.auction_id {
            None => return Err(ConfigError::MissingAuctionId),
            Some(id) if id <= 0 => return Err(ConfigError::NonPositiveAuctionId(id)),
            Some(id) => id,
        };

        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.users == 0 {
            return Err(ConfigError::NoUsers);
        }
        if self.bids.step == 0 {
            return Err(ConfigError::ZeroBidStep);
        }
        if self.bids.min == 0 {
            return Err(ConfigError::ZeroMinBid);
        }
        if self.bids.min > self.bids.max {
            return Err(ConfigError::InvertedBidRange {
                min: self.bids.min,
                max: self.bids.max,
            });
        }

        Ok(auction_id)
    }
}

impl fmt::Display for BidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pool = self.identity_pool();
        writeln!(
            f,
            "target      {} (login {}, bid {})",
            self.base_url, self.login_path, self.bid_path
        )?;
        match self.auction_id {
            Some(id) => writeln!(f, "auction     {id}")?,
            None => writeln!(f, "auction     <unset>")?,
        }
        writeln!(
            f,
            "users       {} x {} bids, identities {}..={}",
            self.users, self.iterations, pool.index_min, pool.index_max
        )?;
        writeln!(
            f,
            "bids        {}..={} step {}",
            self.bids.min, self.bids.max, self.bids.step
        )?;
        write!(
            f,
            "pacing      {} (post-bid {}), deadline {}",
            humantime::format_duration(self.pace),
            humantime::format_duration(self.post_bid_delay),
            humantime::format_duration(self.max_duration)
        )
    }
}
