// src/web/rate_limit.rs
use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, warn};

pub const API_LIMIT_MESSAGE: &str = "Too many requests. Please try again later.";
pub const ANALYSIS_LIMIT_MESSAGE: &str = "Analysis rate limit reached. Please try again in an hour.";

/// Idle clients are dropped from the limiter after this many checks
const CLEANUP_EVERY: u64 = 1024;

/// Keyed per-client-IP limiter that forgets clients whose budget is full again
pub struct IpQuota<C: Clock = DefaultClock> {
    limiter: RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, C, NoOpMiddleware<C::Instant>>,
    checks: AtomicU64,
}

impl IpQuota {
    pub fn per_hour(requests: u32) -> Self {
        Self::new(Quota::per_hour(non_zero(requests)), DefaultClock::default())
    }

    /// `requests` per `window`, all of which may be spent at once
    pub fn per_window(requests: u32, window: Duration) -> Self {
        let requests = non_zero(requests);
        let replenish = (window / requests.get()).max(Duration::from_millis(1));
        let quota = Quota::with_period(replenish)
            .unwrap_or_else(|| Quota::per_hour(requests))
            .allow_burst(requests);

        Self::new(quota, DefaultClock::default())
    }
}

impl<C: Clock> IpQuota<C> {
    pub fn new(quota: Quota, clock: C) -> Self {
        Self {
            limiter: RateLimiter::new(quota, Default::default(), clock),
            checks: AtomicU64::new(0),
        }
    }

    pub fn try_acquire(&self, ip: IpAddr) -> bool {
        if self.checks.fetch_add(1, Ordering::Relaxed) % CLEANUP_EVERY == CLEANUP_EVERY - 1 {
            self.forget_idle();
        }

        self.limiter.check_key(&ip).is_ok()
    }

    /// Drop state for clients that are back to a full budget
    pub fn forget_idle(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        debug!(clients = self.limiter.len(), "Pruned rate limiter state");
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

/// Budget shared by every `/api` route
pub struct ApiQuota(pub IpQuota);

/// Stricter budget for the `/api/analysis` routes
pub struct AnalysisQuota(pub IpQuota);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaExceeded {
    Api,
    Analysis,
}

impl QuotaExceeded {
    pub fn message(&self) -> &'static str {
        match self {
            QuotaExceeded::Api => API_LIMIT_MESSAGE,
            QuotaExceeded::Analysis => ANALYSIS_LIMIT_MESSAGE,
        }
    }
}

/// Which limit rejected the request, read back by the 429 catcher
pub struct QuotaFailure(pub Option<QuotaExceeded>);

fn client_ip(req: &Request<'_>) -> IpAddr {
    // Local clients without a peer address share one bucket
    req.client_ip().unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn acquire<T>(
    req: &Request<'_>,
    quota: Option<&IpQuota>,
    kind: QuotaExceeded,
    guard: T,
) -> Outcome<T, QuotaExceeded> {
    let Some(quota) = quota else {
        error!(?kind, "Rate limiter is not managed");
        return Outcome::Error((Status::InternalServerError, kind));
    };

    let ip = client_ip(req);
    if quota.try_acquire(ip) {
        Outcome::Success(guard)
    } else {
        warn!(%ip, ?kind, "Rate limit exceeded");
        req.local_cache(|| QuotaFailure(Some(kind)));
        Outcome::Error((Status::TooManyRequests, kind))
    }
}

/// Consumes one unit of the caller's general API budget
pub struct WithinApiQuota;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for WithinApiQuota {
    type Error = QuotaExceeded;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let quota = req.rocket().state::<ApiQuota>().map(|q| &q.0);
        acquire(req, quota, QuotaExceeded::Api, WithinApiQuota)
    }
}

/// Consumes one unit of the caller's analysis budget
pub struct WithinAnalysisQuota;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for WithinAnalysisQuota {
    type Error = QuotaExceeded;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let quota = req.rocket().state::<AnalysisQuota>().map(|q| &q.0);
        acquire(req, quota, QuotaExceeded::Analysis, WithinAnalysisQuota)
    }
}
