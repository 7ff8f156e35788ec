//! Structured failure events.
//!
//! Failures never travel up the call stack; they are emitted here and counted in
//! the metrics aggregator instead.
use crate::session::AuthError;
use crate::submit::BidError;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Login,
    Bid,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Login => write!(f, "login"),
            Stage::Bid => write!(f, "bid"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub login: String,
    pub status: Option<u16>,
    pub error: String,
    /// Response body, already truncated.
    pub body: Option<String>,
}

impl Diagnostic {
    pub fn login_failed(login: &str, err: &AuthError) -> Self {
        Self {
            stage: Stage::Login,
            login: login.to_string(),
            status: err.status(),
            error: err.to_string(),
            body: err.body().map(str::to_string),
        }
    }

    pub fn bid_failed(login: &str, err: &BidError) -> Self {
        Self {
            stage: Stage::Bid,
            login: login.to_string(),
            status: err.status(),
            error: err.to_string(),
            body: err.body().map(str::to_string),
        }
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Writes diagnostics as `warn` level tracing events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let Diagnostic {
            stage,
            login,
            status,
            error,
            body,
        } = diagnostic;
        warn!(
            %stage,
            %login,
            status = ?status,
            body = body.as_deref().unwrap_or_default(),
            "{stage} failed: {error}"
        );
    }
}

/// Keeps every diagnostic in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Diagnostic>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}
