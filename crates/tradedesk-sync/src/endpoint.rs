//! Committed endpoint of the remote account service and its connectivity status.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};
use tradedesk_config::{ConfigError, ENDPOINT_PRESETS, Endpoint, EndpointPreset};
use tradedesk_core::AccountStore;

use crate::connectivity::{Connectivity, ProbeOutcome, probe};
use crate::error::EndpointError;

/// Result of a successful endpoint commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCommit {
    /// Newly committed endpoint.
    pub endpoint: Endpoint,
    /// Platform label reported by the verification probe.
    pub platform: Option<String>,
}

#[derive(Debug)]
struct EndpointState {
    endpoint: Endpoint,
    connectivity: Connectivity,
    generation: u64,
}

/// Holds the single base URL used for every remote call in the session.
pub struct EndpointStore {
    store: Arc<dyn AccountStore>,
    state: RwLock<EndpointState>,
}

impl EndpointStore {
    /// Start with `initial` committed and connectivity [`Connectivity::Unknown`].
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, initial: Endpoint) -> Self {
        Self {
            store,
            state: RwLock::new(EndpointState {
                endpoint: initial,
                connectivity: Connectivity::Unknown,
                generation: 0,
            }),
        }
    }

    /// Named endpoint suggestions.
    #[must_use]
    pub const fn presets() -> &'static [EndpointPreset] {
        ENDPOINT_PRESETS
    }

    /// Currently committed endpoint.
    pub async fn endpoint(&self) -> Endpoint {
        self.state.read().await.endpoint.clone()
    }

    /// Connectivity status of the committed endpoint.
    pub async fn connectivity(&self) -> Connectivity {
        self.state.read().await.connectivity.clone()
    }

    /// Normalize and probe a candidate without committing it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the input is not a usable endpoint.
    pub async fn test_endpoint(
        &self,
        raw: &str,
    ) -> Result<(Endpoint, ProbeOutcome), ConfigError> {
        let candidate = Endpoint::parse(raw)?;
        let outcome = probe(self.store.as_ref(), &candidate).await;
        Ok((candidate, outcome))
    }

    /// Normalize, verify and commit a new endpoint.
    ///
    /// The candidate is committed only when its probe is online; the probe
    /// result then replaces the previous endpoint's connectivity status.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Config`] for unusable input and
    /// [`EndpointError::Unreachable`] when the candidate is offline. In both
    /// cases the committed endpoint and its status are unchanged.
    pub async fn set_endpoint(&self, raw: &str) -> Result<EndpointCommit, EndpointError> {
        let (candidate, outcome) = self.test_endpoint(raw).await?;
        match outcome {
            ProbeOutcome::Online { platform } => {
                let mut state = self.state.write().await;
                state.endpoint = candidate.clone();
                state.connectivity = Connectivity::Online {
                    platform: platform.clone(),
                };
                state.generation += 1;
                info!(endpoint = %candidate, "endpoint committed");
                Ok(EndpointCommit {
                    endpoint: candidate,
                    platform,
                })
            }
            ProbeOutcome::Offline { reason } => {
                warn!(endpoint = %candidate, reason = %reason, "endpoint not committed");
                Err(EndpointError::Unreachable {
                    endpoint: candidate,
                    reason,
                })
            }
        }
    }

    /// Re-probe the committed endpoint and record the result.
    ///
    /// A result for an endpoint replaced while the probe was in flight is discarded.
    pub async fn refresh_connectivity(&self) -> Connectivity {
        let (endpoint, generation) = {
            let state = self.state.read().await;
            (state.endpoint.clone(), state.generation)
        };
        let outcome = probe(self.store.as_ref(), &endpoint).await;

        let mut state = self.state.write().await;
        if state.generation == generation {
            state.connectivity = outcome.into();
        } else {
            warn!(endpoint = %endpoint, "discarding probe for a replaced endpoint");
        }
        state.connectivity.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradedesk_core::RemoteError;
    use tradedesk_test_support::mocks::{HealthScript, ScriptedStore};

    fn offline() -> HealthScript {
        HealthScript::Offline(RemoteError::Transport {
            operation: "health",
            message: "connection refused".into(),
        })
    }

    fn setup() -> (Arc<ScriptedStore>, EndpointStore) {
        let store = Arc::new(ScriptedStore::new());
        let endpoints = EndpointStore::new(store.clone(), Endpoint::default());
        (store, endpoints)
    }

    #[tokio::test]
    async fn initial_state_is_default_endpoint_with_unknown_status() {
        let (_, endpoints) = setup();
        assert_eq!(endpoints.endpoint().await.as_str(), "http://127.0.0.1:5000");
        assert_eq!(endpoints.connectivity().await, Connectivity::Unknown);
        assert_eq!(EndpointStore::presets().len(), 2);
    }

    #[tokio::test]
    async fn set_endpoint_commits_online_candidate() {
        let (store, endpoints) = setup();
        let commit = endpoints
            .set_endpoint(" https://api.example.com/ ")
            .await
            .expect("commit");
        assert_eq!(commit.endpoint.as_str(), "https://api.example.com");
        assert_eq!(commit.platform.as_deref(), Some("MetaTrader"));
        assert_eq!(endpoints.endpoint().await, commit.endpoint);
        assert_eq!(endpoints.connectivity().await.label(), "Connected");
        assert_eq!(store.calls()[0].endpoint, "https://api.example.com");
    }

    #[tokio::test]
    async fn offline_candidate_leaves_committed_state_untouched() {
        let (store, endpoints) = setup();
        endpoints.refresh_connectivity().await;
        store.set_health("http://10.0.0.9:5000", offline());

        let err = endpoints
            .set_endpoint("http://10.0.0.9:5000")
            .await
            .expect_err("unreachable");
        assert!(matches!(err, EndpointError::Unreachable { ref reason, .. } if reason == "connection refused"));
        assert_eq!(endpoints.endpoint().await, Endpoint::default());
        assert_eq!(endpoints.connectivity().await.label(), "Connected");
    }

    #[tokio::test]
    async fn invalid_input_never_probes() {
        let (store, endpoints) = setup();
        assert_eq!(
            endpoints.set_endpoint("   ").await,
            Err(EndpointError::Config(ConfigError::EmptyEndpoint))
        );
        assert!(matches!(
            endpoints.test_endpoint("ftp://example.com").await,
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert_eq!(store.call_count("health"), 0);
    }

    #[tokio::test]
    async fn test_endpoint_does_not_commit() {
        let (_, endpoints) = setup();
        let (candidate, outcome) = endpoints
            .test_endpoint("http://localhost:5000/")
            .await
            .expect("valid");
        assert!(outcome.is_online());
        assert_eq!(candidate.as_str(), "http://localhost:5000");
        assert_eq!(endpoints.endpoint().await, Endpoint::default());
        assert_eq!(endpoints.connectivity().await, Connectivity::Unknown);
    }

    #[tokio::test]
    async fn refresh_connectivity_tracks_latest_probe() {
        let (store, endpoints) = setup();
        assert_eq!(endpoints.refresh_connectivity().await.label(), "Connected");
        store.set_default_health(offline());
        assert_eq!(endpoints.refresh_connectivity().await.label(), "Disconnected");
    }

    #[tokio::test]
    async fn stale_probe_is_discarded_after_endpoint_change() {
        let (store, endpoints) = setup();
        let endpoints = Arc::new(endpoints);
        store.set_health(Endpoint::default().as_str(), offline());
        let gate = store.gate_next_health();

        let pending = {
            let endpoints = endpoints.clone();
            tokio::spawn(async move { endpoints.refresh_connectivity().await })
        };
        gate.entered.await.expect("probe started");
        endpoints
            .set_endpoint("http://localhost:5000")
            .await
            .expect("commit");
        gate.release.send(()).expect("release");

        let status = pending.await.expect("join");
        assert_eq!(status.label(), "Connected");
        assert_eq!(endpoints.connectivity().await.label(), "Connected");
    }
}
