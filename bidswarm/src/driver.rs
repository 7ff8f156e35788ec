//! The lifecycle of a single simulated bidder.
use crate::diagnostics::Diagnostic;
use crate::pacer::{self, Pacer};
use crate::run::RunContext;
use crate::session::Session;
use crate::submit::{submit, Outcome};
use crate::transport::Transport;
use bidswarm_core::BidRequest;
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{instrument, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Unidentified,
    Authenticating,
    Ready,
    Pacing,
    Bidding,
    Done,
    Aborted,
}

impl DriverState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DriverState::Done | DriverState::Aborted)
    }
}

/// What a virtual user reports back to the coordinator once it stops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserReport {
    pub ordinal: u32,
    pub login: Option<String>,
    pub state: DriverState,
    pub bids_sent: u32,
}

/// One simulated bidder.
///
/// Owns its session and pacing state outright; the only thing it shares with
/// other users is the read-only run context and the metrics aggregator inside it.
pub struct VirtualUser<T> {
    ordinal: u32,
    ctx: Arc<RunContext<T>>,
    state: DriverState,
    pacer: Pacer,
    bids_sent: u32,
}

impl<T> VirtualUser<T>
where
    T: Transport + Sync + 'static,
{
    pub(crate) fn new(ordinal: u32, ctx: Arc<RunContext<T>>) -> Self {
        let pacer = Pacer::new(ctx.config.pace);
        Self {
            ordinal,
            ctx,
            state: DriverState::Unidentified,
            pacer,
            bids_sent: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    #[instrument(name = "vu", skip_all, fields(ordinal = self.ordinal))]
    pub async fn run(mut self) -> UserReport {
        let identity = self.ctx.pool.allocate(self.ordinal, &self.ctx.config.password);
        let mut session = Session::new(identity);
        self.transition(DriverState::Authenticating);

        self.ctx.throttle().await;
        let auth = session
            .authenticate(
                &self.ctx.transport,
                &self.ctx.login_url,
                self.ctx.config.login_timeout,
            )
            .await
            .map(|_| ());

        if let Err(err) = auth {
            self.ctx.metrics.record_login(false);
            self.ctx
                .sink
                .emit(Diagnostic::login_failed(&session.identity().login, &err));
            self.transition(DriverState::Aborted);
            return self.report(&session);
        }
        self.ctx.metrics.record_login(true);
        let token = session.token().unwrap_or_default();

        self.transition(DriverState::Ready);
        pacer::jitter(self.ctx.config.login_jitter).await;

        for _ in 0..self.ctx.config.iterations {
            self.transition(DriverState::Pacing);
            self.pacer.wait().await;

            self.transition(DriverState::Bidding);
            self.bid(&session.identity().login, token).await;
        }

        self.transition(DriverState::Done);
        self.report(&session)
    }

    async fn bid(&mut self, login: &str, token: &str) {
        let amount = self.ctx.config.bids.sample(&mut rand::thread_rng());
        let bid = BidRequest {
            auction_id: self.ctx.auction_id,
            amount,
        };

        self.ctx.throttle().await;
        let start = Instant::now();
        let outcome = submit(
            &self.ctx.transport,
            &self.ctx.bid_url,
            token,
            bid,
            self.ctx.config.request_timeout,
        )
        .await;
        let elapsed = start.elapsed();

        self.bids_sent += 1;
        self.ctx.metrics.record_bid(&outcome, elapsed);
        match &outcome {
            Outcome::Success { status } => trace!("Bid {amount} accepted with {status}"),
            Outcome::Failure(err) => self.ctx.sink.emit(Diagnostic::bid_failed(login, err)),
        }
        self.pacer.mark();

        let delay = self.ctx.config.post_bid_delay;
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    fn transition(&mut self, next: DriverState) {
        trace!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn report(&self, session: &Session) -> UserReport {
        UserReport {
            ordinal: self.ordinal,
            login: Some(session.identity().login.clone()),
            state: self.state,
            bids_sent: self.bids_sent,
        }
    }
}
