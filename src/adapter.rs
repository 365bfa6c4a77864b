//! The listing search adapter.
//!
//! [`ListingSearch`] runs one search end to end:
//!
//! ```text
//! form ─▶ SearchFilter ─▶ provider request ─▶ Transport ─▶ normalize ─┐
//!                                   │ (any failure)                  ├─▶ ResultsView
//!                                   └────────▶ SampleSet::filter ────┘
//! ```
//!
//! The search control is disabled for the duration and re-enabled on every
//! path. Each search takes a generation number; only the newest search may
//! replace the latest result set, so a slow response that completes after a
//! newer search is returned to its caller flagged `superseded`.
//!
//! Completed result sets are also kept by generation in a bounded history.
//! A caller that holds the generation from its own [`SearchOutcome`] can
//! follow up against exactly the listings it was shown, whatever other
//! callers searched in the meantime.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use listing_search_core::fallback::SampleSet;
use listing_search_core::form::{extract_filter, FormSource};
use listing_search_core::inquiry::ContactPrefill;
use listing_search_core::models::{Listing, SearchFilter};
use listing_search_core::phase::{ControlGuard, ResultOrigin, SearchControl, SearchPhase};
use listing_search_core::present::{Notification, Presenter, ResultsView};

use crate::fetch::{FetchError, Transport};
use crate::provider::Provider;

/// Result sets kept for follow-up actions.
pub const RESULT_HISTORY: usize = 64;

/// The listings of one completed search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub generation: u64,
    pub origin: ResultOrigin,
    pub listings: Vec<Listing>,
}

impl ResultSet {
    pub fn find(&self, listing_id: &str) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == listing_id)
    }
}

/// Everything one search produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub generation: u64,
    pub origin: ResultOrigin,
    /// The filter as sent, after defaults were applied.
    pub filter: SearchFilter,
    pub listings: Vec<Listing>,
    pub view: ResultsView,
    pub notification: Option<Notification>,
    /// A newer search started before this one finished; its results were
    /// not stored.
    pub superseded: bool,
}

/// Outcome of a provider connectivity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The provider answered its connectivity endpoint.
    Healthy,
    /// Nothing to check: no provider, or it exposes no such endpoint.
    Unchecked,
}

/// Search adapter for one provider (or for the sample set alone).
pub struct ListingSearch {
    provider: Option<Provider>,
    transport: Arc<dyn Transport>,
    samples: SampleSet,
    presenter: Presenter,
    default_status: Option<String>,
    progress_label: String,
    generation: AtomicU64,
    latest: RwLock<Option<Arc<ResultSet>>>,
    history: RwLock<VecDeque<Arc<ResultSet>>>,
}

impl ListingSearch {
    pub fn new(
        provider: Option<Provider>,
        transport: Arc<dyn Transport>,
        samples: SampleSet,
        presenter: Presenter,
    ) -> Self {
        Self {
            provider,
            transport,
            samples,
            presenter,
            default_status: None,
            progress_label: "Searching MLS...".to_string(),
            generation: AtomicU64::new(0),
            latest: RwLock::new(None),
            history: RwLock::new(VecDeque::with_capacity(RESULT_HISTORY)),
        }
    }

    /// Status sent when the user leaves the status control unset.
    pub fn with_default_status(mut self, status: Option<String>) -> Self {
        self.default_status = status;
        self
    }

    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = label.into();
        self
    }

    pub fn provider(&self) -> Option<&Provider> {
        self.provider.as_ref()
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    /// Read the form, then search.
    pub async fn search_form<F: FormSource + ?Sized>(
        &self,
        form: &F,
        control: &dyn SearchControl,
    ) -> SearchOutcome {
        self.search(extract_filter(form), control).await
    }

    /// Run one search. Never fails: retrieval errors route to the sample set.
    pub async fn search(&self, filter: SearchFilter, control: &dyn SearchControl) -> SearchOutcome {
        let filter = filter.with_default_status(self.default_status.as_deref());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = ControlGuard::engage(control, &self.progress_label);

        let remote = match &self.provider {
            Some(provider) => Some(self.fetch_remote(provider, &filter).await),
            None => None,
        };

        let (origin, listings) = match remote {
            Some(Ok(listings)) => (ResultOrigin::Remote, listings),
            Some(Err(e)) => {
                warn!(
                    provider = self.provider.as_ref().map(Provider::name).unwrap_or_default(),
                    kind = e.kind(),
                    error = %e,
                    "Remote search failed, using sample listings"
                );
                guard.transition(SearchPhase::Failed);
                guard.transition(SearchPhase::FallbackFiltering);
                (ResultOrigin::Fallback, self.samples.filter(&filter))
            }
            None => {
                debug!("No provider configured, filtering sample listings");
                guard.transition(SearchPhase::FallbackFiltering);
                (ResultOrigin::Fallback, self.samples.filter(&filter))
            }
        };

        let view = self.presenter.present(&listings);
        let notification = self.presenter.notification_for(&view);
        let superseded = !self.store(generation, origin, &listings);

        info!(
            generation,
            origin = ?origin,
            count = listings.len(),
            superseded,
            "Search complete"
        );
        guard.transition(SearchPhase::Success {
            count: listings.len(),
            origin,
        });
        drop(guard);

        SearchOutcome {
            generation,
            origin,
            filter,
            listings,
            view,
            notification,
            superseded,
        }
    }

    async fn fetch_remote(
        &self,
        provider: &Provider,
        filter: &SearchFilter,
    ) -> Result<Vec<Listing>, FetchError> {
        let request = provider.search_request(filter);
        debug!(provider = provider.name(), url = %request.url, "Requesting listings");

        let body = self.transport.execute(&request).await?;
        let normalized = provider.normalize(&body);
        if normalized.skipped > 0 {
            debug!(
                provider = provider.name(),
                skipped = normalized.skipped,
                "Dropped unusable records"
            );
        }
        Ok(normalized.listings)
    }

    /// Record results under `generation`. Returns false (and leaves the
    /// latest set alone) when a newer search has started.
    fn store(&self, generation: u64, origin: ResultOrigin, listings: &[Listing]) -> bool {
        let set = Arc::new(ResultSet {
            generation,
            origin,
            listings: listings.to_vec(),
        });

        {
            let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
            if history.len() == RESULT_HISTORY {
                history.pop_front();
            }
            history.push_back(Arc::clone(&set));
        }

        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        *latest = Some(set);
        true
    }

    /// The most recent stored result set.
    pub fn latest(&self) -> Option<Arc<ResultSet>> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The result set of search `generation`, if it is still in the history.
    pub fn result_set(&self, generation: u64) -> Option<Arc<ResultSet>> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|set| set.generation == generation)
            .cloned()
    }

    /// Contact-form prefill for a listing in the latest results.
    ///
    /// Returns `None` when no search has completed or the id is not among
    /// the stored listings.
    pub fn request_info(&self, listing_id: &str) -> Option<ContactPrefill> {
        let latest = self.latest()?;
        latest.find(listing_id).map(ContactPrefill::for_listing)
    }

    /// Contact-form prefill for a listing shown by search `generation`.
    pub fn request_info_in(&self, generation: u64, listing_id: &str) -> Option<ContactPrefill> {
        let set = self.result_set(generation)?;
        set.find(listing_id).map(ContactPrefill::for_listing)
    }

    /// Check the provider's connectivity endpoint.
    pub async fn probe(&self) -> Result<ProbeStatus, FetchError> {
        let Some(request) = self.provider.as_ref().and_then(Provider::probe_request) else {
            return Ok(ProbeStatus::Unchecked);
        };
        self.transport.probe(&request).await?;
        Ok(ProbeStatus::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::fetch::ProviderRequest;
    use crate::provider::ProviderKind;
    use async_trait::async_trait;
    use listing_search_core::phase::NoopControl;
    use listing_search_core::query::ProviderQuery;
    use serde_json::{json, Value};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    enum Reply {
        Body(Value),
        Status(u16),
    }

    struct FakeTransport {
        reply: Reply,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl FakeTransport {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn execute(&self, request: &ProviderRequest) -> Result<Value, FetchError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Reply::Body(v) => Ok(v.clone()),
                Reply::Status(s) => Err(FetchError::ProviderRejection {
                    provider: request.provider.clone(),
                    status: *s,
                    body: String::new(),
                }),
            }
        }

        async fn probe(&self, _request: &ProviderRequest) -> Result<(), FetchError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingControl {
        events: Mutex<Vec<String>>,
    }

    impl SearchControl for RecordingControl {
        fn disable(&self, label: &str) {
            self.events.lock().unwrap().push(format!("disable:{}", label));
        }
        fn enable(&self) {
            self.events.lock().unwrap().push("enable".into());
        }
        fn phase_changed(&self, phase: SearchPhase) {
            let name = match phase {
                SearchPhase::Idle => "idle",
                SearchPhase::Searching => "searching",
                SearchPhase::Failed => "failed",
                SearchPhase::FallbackFiltering => "fallback",
                SearchPhase::Success { .. } => "success",
            };
            self.events.lock().unwrap().push(name.into());
        }
    }

    fn bridge() -> Provider {
        let cfg = ProviderConfig {
            kind: ProviderKind::Bridge,
            endpoint: "https://bridge.test/api/v2".into(),
            token: Some("t".into()),
            token_env: None,
            headers: BTreeMap::new(),
            agent_id: None,
            source_label: None,
            timeout_secs: None,
        };
        Provider::from_config("bridge", &cfg, 50).unwrap()
    }

    fn adapter(transport: Arc<FakeTransport>) -> ListingSearch {
        ListingSearch::new(
            Some(bridge()),
            transport,
            SampleSet::builtin(),
            Presenter::default(),
        )
    }

    #[tokio::test]
    async fn test_remote_success_normalizes_and_stores() {
        let transport = FakeTransport::new(Reply::Body(json!({"value": [
            {"ListingId": "R1", "City": "Vienna", "StateOrProvince": "VA", "ListPrice": 700000},
            {"ListingId": "R2", "City": "Vienna", "StateOrProvince": "VA", "ListPrice": 650000}
        ]})));
        let search = adapter(transport.clone());
        let control = RecordingControl::default();

        let out = search.search(SearchFilter::default(), &control).await;
        assert_eq!(out.origin, ResultOrigin::Remote);
        assert_eq!(out.listings.len(), 2);
        assert!(!out.superseded);
        assert_eq!(out.listings[0].source_label, "MLS Direct (Bridge)");
        assert_eq!(search.latest().unwrap().listings.len(), 2);

        let events = control.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["disable:Searching MLS...", "searching", "success", "enable", "idle"]
        );
    }

    #[tokio::test]
    async fn test_rejection_falls_back_to_samples() {
        let search = adapter(FakeTransport::new(Reply::Status(500)));
        let control = RecordingControl::default();
        let filter = SearchFilter {
            location: Some("Washington".into()),
            ..Default::default()
        };

        let out = search.search(filter, &control).await;
        assert_eq!(out.origin, ResultOrigin::Fallback);
        let ids: Vec<&str> = out.listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["KW001", "KW003"]);
        assert!(out.notification.is_some());

        let events = control.events.lock().unwrap().clone();
        assert!(events.contains(&"failed".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("idle"));
        assert!(events.contains(&"enable".to_string()));
    }

    #[tokio::test]
    async fn test_empty_remote_result_is_not_a_failure() {
        let search = adapter(FakeTransport::new(Reply::Body(json!({"value": []}))));
        let out = search.search(SearchFilter::default(), &NoopControl).await;
        assert_eq!(out.origin, ResultOrigin::Remote);
        assert!(out.view.is_empty());
        assert!(out.notification.is_none());
    }

    #[tokio::test]
    async fn test_no_provider_uses_samples() {
        let search = ListingSearch::new(
            None,
            FakeTransport::new(Reply::Status(500)),
            SampleSet::builtin(),
            Presenter::default(),
        );
        let mut form = HashMap::new();
        form.insert("location-select".to_string(), "Arlington".to_string());
        let out = search.search_form(&form, &NoopControl).await;
        assert_eq!(out.origin, ResultOrigin::Fallback);
        assert!(out.view.is_empty());
        assert_eq!(search.probe().await.unwrap(), ProbeStatus::Unchecked);
    }

    #[tokio::test]
    async fn test_default_status_is_sent() {
        let transport = FakeTransport::new(Reply::Body(json!({"value": []})));
        let search = adapter(transport.clone()).with_default_status(Some("Active".into()));
        let out = search.search(SearchFilter::default(), &NoopControl).await;
        assert_eq!(out.filter.status.as_deref(), Some("Active"));

        let requests = transport.requests.lock().unwrap();
        match &requests[0].query {
            ProviderQuery::Params(params) => {
                let filter = params.iter().find(|(k, _)| k == "$filter").unwrap();
                assert_eq!(filter.1, "StandardStatus eq 'Active'");
            }
            other => panic!("expected params, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_request_info_uses_latest_results() {
        let search = adapter(FakeTransport::new(Reply::Status(503)));
        assert!(search.request_info("KW002").is_none());

        search.search(SearchFilter::default(), &NoopControl).await;
        let prefill = search.request_info("KW002").unwrap();
        assert!(prefill.message.contains("2307 Waterside Dr, Bumpass, VA"));
        assert!(prefill.message.contains("MLS# KW002"));
        assert!(search.request_info("nope").is_none());
    }

    #[test]
    fn test_stale_generation_is_not_stored() {
        let search = adapter(FakeTransport::new(Reply::Status(500)));
        let first = search.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let second = search.generation.fetch_add(1, Ordering::SeqCst) + 1;

        assert!(search.store(second, ResultOrigin::Remote, &[]));
        assert!(!search.store(first, ResultOrigin::Fallback, SampleSet::builtin().listings()));
        let latest = search.latest().unwrap();
        assert_eq!(latest.generation, second);
        assert!(latest.listings.is_empty());
    }

    #[test]
    fn test_superseded_results_stay_addressable_by_generation() {
        let search = adapter(FakeTransport::new(Reply::Status(500)));
        let first = search.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let second = search.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let samples = SampleSet::builtin();

        assert!(search.store(second, ResultOrigin::Fallback, &samples.listings()[3..]));
        assert!(!search.store(first, ResultOrigin::Fallback, &samples.listings()[..1]));

        assert!(search.request_info("KW001").is_none());
        assert!(search.request_info_in(first, "KW001").is_some());
        assert!(search.request_info_in(first, "KW004").is_none());
        assert!(search.request_info_in(second, "KW004").is_some());
        assert!(search.request_info_in(second + 1, "KW004").is_none());
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let search = adapter(FakeTransport::new(Reply::Status(500)));
        let first = search.search(SearchFilter::default(), &NoopControl).await;
        for _ in 0..RESULT_HISTORY {
            search.search(SearchFilter::default(), &NoopControl).await;
        }

        assert!(search.result_set(first.generation).is_none());
        assert!(search.result_set(first.generation + 1).is_some());
        let latest = search.latest().unwrap();
        assert_eq!(search.result_set(latest.generation).unwrap().generation, latest.generation);
    }
}
