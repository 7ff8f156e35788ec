//! A stand-in for the auction backend: one login route, one bid route.
use axum::{
    extract::State,
    http::{header, HeaderMap},
    routing::post,
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
#[allow(unused)]
use metrics::{counter, gauge, histogram};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub use axum::http::StatusCode;

pub const LOGIN_PATH: &str = "/auth/login";
pub const BID_PATH: &str = "/pembeli/pengajuan-lelang";

/// Knobs for how the mock answers.
#[derive(Clone, Debug)]
pub struct Behavior {
    /// Emails whose login is answered with `401`.
    pub rejected_logins: HashSet<String>,
    /// Status returned for an authorized bid.
    pub bid_status: StatusCode,
    /// Added before every bid is answered.
    pub bid_delay: Duration,
    /// Bids beyond this rate are answered with `429`.
    pub bid_tps_limit: Option<NonZeroU32>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            rejected_logins: HashSet::new(),
            bid_status: StatusCode::CREATED,
            bid_delay: Duration::ZERO,
            bid_tps_limit: None,
        }
    }
}

impl Behavior {
    pub fn reject_login(mut self, email: &str) -> Self {
        self.rejected_logins.insert(email.to_string());
        self
    }

    pub fn bid_status(mut self, status: StatusCode) -> Self {
        self.bid_status = status;
        self
    }

    pub fn bid_delay(mut self, delay: Duration) -> Self {
        self.bid_delay = delay;
        self
    }

    pub fn bid_tps_limit(mut self, tps: NonZeroU32) -> Self {
        self.bid_tps_limit = Some(tps);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedBid {
    pub email: String,
    pub auction_id: i64,
    pub amount: u64,
}

/// Shared state of a running mock.
pub struct MockAuction {
    behavior: Behavior,
    limiter: Option<DefaultDirectRateLimiter>,
    tokens: Mutex<HashMap<String, String>>,
    logins: Mutex<HashMap<String, u64>>,
    bids: Mutex<Vec<RecordedBid>>,
    requests: AtomicU64,
}

impl MockAuction {
    pub fn new(behavior: Behavior) -> Self {
        let limiter = behavior.bid_tps_limit.map(rate_limiter);
        Self {
            behavior,
            limiter,
            tokens: Mutex::new(HashMap::new()),
            logins: Mutex::new(HashMap::new()),
            bids: Mutex::new(vec![]),
            requests: AtomicU64::new(0),
        }
    }

    /// Login attempts seen for `email`.
    pub fn logins_for(&self, email: &str) -> u64 {
        lock(&self.logins).get(email).copied().unwrap_or(0)
    }

    pub fn total_logins(&self) -> u64 {
        lock(&self.logins).values().sum()
    }

    /// Every bid that reached the handler with a valid token.
    pub fn bids(&self) -> Vec<RecordedBid> {
        lock(&self.bids).clone()
    }

    pub fn bids_for(&self, email: &str) -> usize {
        lock(&self.bids).iter().filter(|bid| bid.email == email).count()
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

pub fn router(state: Arc<MockAuction>) -> Router {
    Router::new()
        .route(LOGIN_PATH, post(login))
        .route(BID_PATH, post(bid))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr, state: Arc<MockAuction>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Serve a fresh mock on an ephemeral local port.
pub async fn spawn(behavior: Behavior) -> anyhow::Result<(SocketAddr, Arc<MockAuction>)> {
    let state = Arc::new(MockAuction::new(behavior));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let app = router(state.clone());
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!("Mock auction stopped: {err}");
        }
    });

    Ok((addr, state))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct BidBody {
    pub lelang_id: i64,
    pub harga_penawaran: u64,
}

async fn login(
    State(state): State<Arc<MockAuction>>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<Value>) {
    state.requests.fetch_add(1, Ordering::Relaxed);
    counter!("mock-auction.logins").increment(1);
    *lock(&state.logins).entry(req.email.clone()).or_default() += 1;

    if state.behavior.rejected_logins.contains(&req.email) || req.password.is_empty() {
        debug!("MOCK LOGIN ___ REJECT {}", req.email);
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Email atau password salah"})),
        );
    }

    let token = format!("mock-{}", req.email);
    lock(&state.tokens).insert(token.clone(), req.email);

    (
        StatusCode::OK,
        Json(json!({"data": {"access_token": token, "token_type": "Bearer"}})),
    )
}

async fn bid(
    State(state): State<Arc<MockAuction>>,
    headers: HeaderMap,
    Json(body): Json<BidBody>,
) -> (StatusCode, Json<Value>) {
    state.requests.fetch_add(1, Ordering::Relaxed);
    counter!("mock-auction.bids").increment(1);

    let email = bearer(&headers).and_then(|token| lock(&state.tokens).get(token).cloned());
    let Some(email) = email else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Unauthenticated"})),
        );
    };

    if !state.behavior.bid_delay.is_zero() {
        tokio::time::sleep(state.behavior.bid_delay).await;
    }

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            debug!("MOCK BID ___ THROTTLED");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"message": "Too many requests"})),
            );
        }
    }

    lock(&state.bids).push(RecordedBid {
        email,
        auction_id: body.lelang_id,
        amount: body.harga_penawaran,
    });

    (
        state.behavior.bid_status,
        Json(json!({
            "message": "Penawaran berhasil",
            "data": {"lelang_id": body.lelang_id, "harga_penawaran": body.harga_penawaran},
        })),
    )
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/** Utils **/

pub fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps))
}
