//! Live-or-synthetic isochrone resolution.
//!
//! [`IsochroneProvider`] asks the routing service first and falls back to the
//! synthetic generator on any failure, so callers always get a set. Requests
//! issued through [`IsochroneProvider::submit`] are tracked by a
//! [`RequestTracker`]: starting a new request supersedes the in-flight one,
//! whose result is then discarded.

use crate::adapters::openroute::OpenRouteClient;
use crate::core::synthetic::SyntheticIsochroneGenerator;
use crate::domain::model::{IsochroneRequest, IsochroneSet, RingSource};
use crate::domain::ports::{IsochroneSource, RoutingConfig, DEFAULT_TIMEOUT_SECONDS};
use crate::utils::error::{ErrorCategory, IsochroneError, Result};
use crate::utils::validation::validate_credential;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    NotRequested,
    Pending(RequestToken),
    Resolved {
        token: RequestToken,
        source: RingSource,
    },
}

impl RequestState {
    pub fn token(&self) -> Option<RequestToken> {
        match self {
            RequestState::NotRequested => None,
            RequestState::Pending(token) => Some(*token),
            RequestState::Resolved { token, .. } => Some(*token),
        }
    }
}

/// Holds the most recent request token. Only the request owning the current
/// token may resolve.
#[derive(Debug)]
pub struct RequestTracker {
    state: watch::Sender<RequestState>,
}

impl RequestTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RequestState::NotRequested);
        Self { state }
    }

    pub fn state(&self) -> RequestState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    /// Starts a new request, superseding whatever was pending.
    pub fn begin(&self) -> RequestToken {
        let mut issued = RequestToken(0);
        self.state.send_modify(|state| {
            let next = state.token().map_or(1, |t| t.0 + 1);
            issued = RequestToken(next);
            *state = RequestState::Pending(issued);
        });
        issued
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.state.borrow().token() == Some(token)
    }

    /// Returns false when `token` was superseded; the state is left untouched.
    pub fn resolve(&self, token: RequestToken, source: RingSource) -> bool {
        self.state.send_if_modified(|state| {
            if *state == RequestState::Pending(token) {
                *state = RequestState::Resolved { token, source };
                true
            } else {
                false
            }
        })
    }

    /// Completes once a newer request has begun.
    pub async fn superseded(&self, token: RequestToken) {
        let mut rx = self.state.subscribe();
        loop {
            if rx.borrow_and_update().token() != Some(token) {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender lives as long as self; nothing can supersede us.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}

pub struct IsochroneProvider<R: IsochroneSource> {
    remote: R,
    generator: SyntheticIsochroneGenerator,
    timeout: Duration,
    tracker: RequestTracker,
}

impl IsochroneProvider<OpenRouteClient> {
    pub fn from_config<C: RoutingConfig>(config: &C) -> Self {
        Self::new(OpenRouteClient::from_config(config)).with_timeout(config.timeout())
    }
}

impl<R: IsochroneSource> IsochroneProvider<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            generator: SyntheticIsochroneGenerator::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            tracker: RequestTracker::new(),
        }
    }

    pub fn with_generator(mut self, generator: SyntheticIsochroneGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Upper bound on one remote call, independent of the source's own limits.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn generator(&self) -> &SyntheticIsochroneGenerator {
        &self.generator
    }

    pub fn state(&self) -> RequestState {
        self.tracker.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.tracker.subscribe()
    }

    /// Always returns a set: live when the routing service answers with
    /// usable rings, synthetic otherwise.
    pub async fn get_isochrones(
        &self,
        request: &IsochroneRequest,
        credential: Option<&str>,
    ) -> IsochroneSet {
        if request.thresholds().is_empty() {
            return self.generator.generate(request);
        }
        let Some(credential) = credential else {
            tracing::debug!(mode = %request.mode, "no routing credential, using synthetic isochrones");
            return self.generator.generate(request);
        };

        match self.fetch_live(request, credential).await {
            Ok(set) => {
                tracing::info!(mode = %request.mode, rings = set.len(), "using live isochrones");
                set
            }
            Err(e) => self.fall_back(request, &e),
        }
    }

    /// Like [`get_isochrones`](Self::get_isochrones), but the result is
    /// returned only if no newer request started meanwhile. A superseded
    /// request is cancelled and yields `None`.
    pub async fn submit(
        &self,
        request: &IsochroneRequest,
        credential: Option<&str>,
    ) -> Option<IsochroneSet> {
        let token = self.tracker.begin();
        tracing::debug!(token = token.value(), mode = %request.mode, "isochrone request pending");

        let set = tokio::select! {
            set = self.get_isochrones(request, credential) => set,
            _ = self.tracker.superseded(token) => {
                tracing::debug!(token = token.value(), "isochrone request superseded, discarding");
                return None;
            }
        };

        let source = set.source().unwrap_or(RingSource::Synthetic);
        if self.tracker.resolve(token, source) {
            Some(set)
        } else {
            tracing::debug!(token = token.value(), "isochrone result arrived after supersession, discarding");
            None
        }
    }

    async fn fetch_live(&self, request: &IsochroneRequest, credential: &str) -> Result<IsochroneSet> {
        validate_credential(credential)?;

        let set = tokio::time::timeout(self.timeout, self.remote.fetch(request, credential))
            .await
            .map_err(|_| IsochroneError::RemoteUnavailable {
                message: format!("no response within {:?}", self.timeout),
            })??;

        if set.is_empty() {
            return Err(IsochroneError::RemoteMalformed {
                message: "routing service returned no rings".to_string(),
            });
        }
        Self::complete_set(request, set)
    }

    /// Keeps only requested rings; any requested threshold left unanswered
    /// rejects the whole set.
    fn complete_set(request: &IsochroneRequest, set: IsochroneSet) -> Result<IsochroneSet> {
        let wanted = request.thresholds_seconds();
        let (origin, mode) = (set.origin(), set.mode());
        let rings: Vec<_> = set
            .into_rings()
            .into_iter()
            .filter(|ring| wanted.contains(&ring.threshold_seconds))
            .collect();

        let missing: Vec<u32> = request
            .thresholds()
            .iter()
            .zip(&wanted)
            .filter(|(_, seconds)| !rings.iter().any(|r| r.threshold_seconds == **seconds))
            .map(|(minutes, _)| *minutes)
            .collect();
        if !missing.is_empty() {
            return Err(IsochroneError::RemoteMalformed {
                message: format!("routing service left out thresholds {:?} min", missing),
            });
        }
        Ok(IsochroneSet::new(origin, mode, rings))
    }

    fn fall_back(&self, request: &IsochroneRequest, error: &IsochroneError) -> IsochroneSet {
        match error.category() {
            ErrorCategory::Credential => tracing::warn!(
                "routing credential unusable ({}), using synthetic isochrones",
                error
            ),
            category => tracing::warn!(
                ?category,
                severity = ?error.severity(),
                transient = error.is_transient(),
                "routing service failed ({}), falling back to synthetic isochrones",
                error
            ),
        }
        self.generator.generate(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Origin, TravelMode};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const KEY: &str = "5b3ce3597851110001cf6248a1b2c3d4e5f6a7b8";

    struct RejectingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IsochroneSource for RejectingSource {
        async fn fetch(&self, _: &IsochroneRequest, _: &str) -> Result<IsochroneSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(IsochroneError::RemoteRejected { status: 403 })
        }
    }

    /// Answers with live-tagged rings for exactly `minutes`, whatever was asked.
    struct FixedSource {
        minutes: Vec<u32>,
    }

    #[async_trait]
    impl IsochroneSource for FixedSource {
        async fn fetch(&self, request: &IsochroneRequest, _: &str) -> Result<IsochroneSet> {
            let generator = SyntheticIsochroneGenerator::default();
            let rings = self
                .minutes
                .iter()
                .map(|&m| {
                    let mut ring = generator.ring(&request.origin, request.mode, m);
                    ring.source = RingSource::Live;
                    ring
                })
                .collect();
            Ok(IsochroneSet::new(request.origin, request.mode, rings))
        }
    }

    fn rejecting() -> IsochroneProvider<RejectingSource> {
        IsochroneProvider::new(RejectingSource {
            calls: AtomicUsize::new(0),
        })
    }

    fn request() -> IsochroneRequest {
        IsochroneRequest::with_default_thresholds(Origin::new(52.52, 13.405), TravelMode::Walk)
    }

    #[test]
    fn test_tracker_transitions() {
        let tracker = RequestTracker::new();
        assert_eq!(tracker.state(), RequestState::NotRequested);

        let first = tracker.begin();
        assert_eq!(tracker.state(), RequestState::Pending(first));

        let second = tracker.begin();
        assert!(second > first);
        assert!(!tracker.is_current(first));
        assert!(!tracker.resolve(first, RingSource::Live));
        assert!(tracker.resolve(second, RingSource::Synthetic));
        assert_eq!(
            tracker.state(),
            RequestState::Resolved {
                token: second,
                source: RingSource::Synthetic
            }
        );

        let third = tracker.begin();
        assert_eq!(third.value(), second.value() + 1);
    }

    #[test]
    fn test_no_credential_skips_remote() {
        let provider = rejecting();
        let set = tokio_test::block_on(provider.get_isochrones(&request(), None));
        assert_eq!(set.len(), 4);
        assert_eq!(set.source(), Some(RingSource::Synthetic));
        assert_eq!(provider.remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_credential_skips_remote() {
        let provider = rejecting();
        let set = provider.get_isochrones(&request(), Some("not-a-key")).await;
        assert_eq!(set.source(), Some(RingSource::Synthetic));
        assert_eq!(provider.remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejection_falls_back_to_full_synthetic_set() {
        let provider = rejecting();
        let set = provider.get_isochrones(&request(), Some(KEY)).await;
        assert_eq!(provider.remote.calls.load(Ordering::SeqCst), 1);
        assert_eq!(set.thresholds_minutes(), vec![20, 15, 10, 5]);
        assert!(set.rings().iter().all(|r| r.source == RingSource::Synthetic));
        assert_eq!(set, provider.generator().generate(&request()));
    }

    #[tokio::test]
    async fn test_submit_resolves_state() {
        let provider = rejecting();
        let set = provider.submit(&request(), None).await;
        assert!(set.is_some());
        assert!(matches!(
            provider.state(),
            RequestState::Resolved {
                source: RingSource::Synthetic,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_partial_live_set_falls_back_to_synthetic() {
        let provider = IsochroneProvider::new(FixedSource { minutes: vec![20] });
        let set = provider.get_isochrones(&request(), Some(KEY)).await;

        assert_eq!(set.source(), Some(RingSource::Synthetic));
        assert_eq!(set.thresholds_minutes(), vec![20, 15, 10, 5]);
        assert!(set.ring_for_minutes(5).is_some());
    }

    #[tokio::test]
    async fn test_unrequested_live_rings_are_dropped() {
        let provider = IsochroneProvider::new(FixedSource {
            minutes: vec![5, 10, 15, 20, 30],
        });
        let set = provider.get_isochrones(&request(), Some(KEY)).await;

        assert_eq!(set.source(), Some(RingSource::Live));
        assert_eq!(set.thresholds_minutes(), vec![20, 15, 10, 5]);
    }
}
