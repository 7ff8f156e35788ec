use crate::diagnostics::RecordingSink;
use crate::run::RunContext;
use crate::transport::{HttpResponse, Transport, TransportError};
use bidswarm_core::{BidConfig, DEFAULT_LOGIN_PATH};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct RecordedRequest {
    pub url: String,
    pub body: Value,
    pub bearer: Option<String>,
}

impl RecordedRequest {
    fn is_login(&self) -> bool {
        self.url.ends_with(DEFAULT_LOGIN_PATH)
    }
}

/// In-memory auction backend. Logins answer `token-<email>` unless rejected.
pub(crate) struct MockTransport {
    rejected_logins: HashSet<String>,
    bid_status: u16,
    bid_delay: Duration,
    bid_error: Option<TransportError>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            rejected_logins: HashSet::new(),
            bid_status: 201,
            bid_delay: Duration::ZERO,
            bid_error: None,
            requests: Mutex::new(vec![]),
        }
    }

    pub fn reject_login(mut self, login: &str) -> Self {
        self.rejected_logins.insert(login.to_string());
        self
    }

    pub fn bid_status(mut self, status: u16) -> Self {
        self.bid_status = status;
        self
    }

    pub fn bid_delay(mut self, delay: Duration) -> Self {
        self.bid_delay = delay;
        self
    }

    pub fn fail_bids(mut self, err: TransportError) -> Self {
        self.bid_error = Some(err);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn bids(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|req| !req.is_login())
            .collect()
    }

    pub fn logins_for(&self, login: &str) -> usize {
        self.requests()
            .iter()
            .filter(|req| req.is_login() && req.body["email"] == login)
            .count()
    }
}

impl Transport for MockTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        bearer: Option<&str>,
        _timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        let request = RecordedRequest {
            url: url.to_string(),
            body: body.clone(),
            bearer: bearer.map(str::to_string),
        };
        let is_login = request.is_login();
        self.requests.lock().unwrap().push(request);

        if is_login {
            let email = body["email"].as_str().unwrap_or_default();
            return Ok(if self.rejected_logins.contains(email) {
                HttpResponse::new(401, r#"{"message":"Unauthorized"}"#)
            } else {
                let token = format!("token-{email}");
                HttpResponse::new(200, json!({"data": {"access_token": token}}).to_string())
            });
        }

        if !self.bid_delay.is_zero() {
            tokio::time::sleep(self.bid_delay).await;
        }
        match &self.bid_error {
            Some(err) => Err(err.clone()),
            None => Ok(HttpResponse::new(self.bid_status, r#"{"message":"ok"}"#)),
        }
    }
}

pub(crate) fn context(
    config: BidConfig,
    transport: MockTransport,
) -> Arc<RunContext<MockTransport>> {
    context_with_sink(config, transport, RecordingSink::new())
}

pub(crate) fn context_with_sink(
    config: BidConfig,
    transport: MockTransport,
    sink: RecordingSink,
) -> Arc<RunContext<MockTransport>> {
    let auction_id = config.validate().unwrap();
    Arc::new(RunContext::new(config, auction_id, transport, Arc::new(sink)))
}
