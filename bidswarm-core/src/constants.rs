use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3333";
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_BID_PATH: &str = "/pembeli/pengajuan-lelang";

pub const DEFAULT_USER_PREFIX: &str = "k6buyer";
pub const DEFAULT_USER_DOMAIN: &str = "example.com";
pub const DEFAULT_USER_PASSWORD: &str = "Password123!";
pub const DEFAULT_USER_COUNT: u32 = 100;

/// Bids each virtual user submits in the reference workload.
pub const DEFAULT_ITERATIONS: u32 = 2;

pub const DEFAULT_MIN_BID: u64 = 250;
pub const DEFAULT_MAX_BID: u64 = 10_000_000;
pub const DEFAULT_BID_STEP: u64 = 250;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_POST_BID_DELAY: Duration = Duration::from_millis(100);

/// Upper bound of the random sleep applied once after a successful login.
pub const DEFAULT_LOGIN_JITTER: Duration = Duration::from_millis(50);

/// Response bodies are cut to this many characters before they are logged.
pub const DIAGNOSTIC_BODY_LIMIT: usize = 200;

/// Identity indices are zero-padded to this width inside the login.
pub const IDENTITY_INDEX_WIDTH: usize = 3;
