//! Bid submission and outcome classification.
use crate::transport::{Transport, TransportError};
use bidswarm_core::BidRequest;
use std::time::Duration;
use thiserror::Error;

/// Statuses the auction backend uses to accept a bid.
pub const ACCEPTED_STATUSES: [u16; 3] = [200, 201, 202];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BidError {
    #[error("bid rejected with status {status}")]
    Rejected { status: u16, body: String },

    #[error("bid request failed: {0}")]
    Transport(#[from] TransportError),
}

impl BidError {
    pub fn status(&self) -> Option<u16> {
        match self {
            BidError::Rejected { status, .. } => Some(*status),
            BidError::Transport(_) => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            BidError::Rejected { body, .. } => Some(body),
            BidError::Transport(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success { status: u16 },
    Failure(BidError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Success { status } => Some(*status),
            Outcome::Failure(err) => err.status(),
        }
    }
}

/// Send one bid with the user's bearer token. Never retried.
pub async fn submit<T: Transport>(
    transport: &T,
    url: &str,
    token: &str,
    bid: BidRequest,
    timeout: Duration,
) -> Outcome {
    let body = match serde_json::to_value(bid) {
        Ok(body) => body,
        Err(err) => return Outcome::Failure(TransportError::Request(err.to_string()).into()),
    };

    match transport.post_json(url, &body, Some(token), timeout).await {
        Ok(res) if ACCEPTED_STATUSES.contains(&res.status) => {
            Outcome::Success { status: res.status }
        }
        Ok(res) => Outcome::Failure(BidError::Rejected {
            status: res.status,
            body: res.truncated_body(),
        }),
        Err(err) => Outcome::Failure(err.into()),
    }
}
