//! Client session: gate, health monitor, classifier and orchestrator wired together

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use super::backend::BackendClient;
use super::classifier::classify;
use super::gate::AccessGate;
use super::health::HealthMonitor;
use super::launcher::DownloadLauncher;
use super::orchestrator::Orchestrator;
use super::thumbnail::{self, Thumbnail};
use crate::error::{Result, StreamSaverError};
use crate::storage::kv::KvStore;
use crate::types::{
    AnalysisResult, Config, ConnectivityStatus, PlatformTag, RequestState, Session,
};

pub struct App {
    config: Config,
    backend: BackendClient,
    gate: AccessGate,
    session: Session,
    /// Present exactly while the session is unlocked
    monitor: Option<HealthMonitor>,
    orchestrator: Orchestrator,
    url: String,
    platform: PlatformTag,
}

impl App {
    /// Build the client from an injected config and restore the persisted unlock state.
    /// Starts health polling right away if the session was already unlocked.
    pub async fn restore(
        config: Config,
        store: KvStore,
        launcher: Arc<dyn DownloadLauncher>,
    ) -> Result<Self> {
        config.validate()?;

        let backend = BackendClient::new(&config.backend_url, config.probe_timeout())?;
        let gate = AccessGate::new(config.access_code.clone(), store);
        let session = gate.restore().await;
        let orchestrator = Orchestrator::new(
            backend.clone(),
            launcher,
            config.analyze_timeout(),
            config.download_cooldown(),
        );

        let mut app = Self {
            config,
            backend,
            gate,
            session,
            monitor: None,
            orchestrator,
            url: String::new(),
            platform: PlatformTag::None,
        };
        if app.session.authenticated {
            info!("restored unlocked session");
            app.start_monitor();
        }
        Ok(app)
    }

    fn start_monitor(&mut self) {
        if self.monitor.is_none() {
            self.monitor = Some(HealthMonitor::start(
                self.backend.clone(),
                self.config.health_interval(),
            ));
        }
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.session.authenticated {
            Ok(())
        } else {
            Err(StreamSaverError::Locked)
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.authenticated
    }

    /// Try the access code; on success persist the unlock and start health polling
    pub async fn unlock(&mut self, code: &str) -> Result<()> {
        self.gate.submit_code(&mut self.session, code).await?;
        self.start_monitor();
        Ok(())
    }

    /// Hard reset: stop polling, forget URL and result, erase the persisted unlock
    pub async fn logout(&mut self) -> Result<()> {
        if let Some(monitor) = self.monitor.take() {
            monitor.stop();
        }
        self.orchestrator.reset();
        self.url.clear();
        self.platform = PlatformTag::None;
        self.gate.logout(&mut self.session).await?;
        info!("logged out");
        Ok(())
    }

    /// Replace the URL text and reclassify it
    pub fn set_url(&mut self, text: &str) -> PlatformTag {
        self.url = text.to_string();
        self.platform = classify(&self.url);
        self.platform
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn platform(&self) -> PlatformTag {
        self.platform
    }

    /// `Checking` while locked or before the first probe completes
    pub fn connectivity(&self) -> ConnectivityStatus {
        self.monitor
            .as_ref()
            .map(HealthMonitor::status)
            .unwrap_or_default()
    }

    pub fn subscribe_connectivity(&self) -> Option<watch::Receiver<ConnectivityStatus>> {
        self.monitor.as_ref().map(HealthMonitor::subscribe)
    }

    /// Analyze the current URL; see [`Orchestrator::analyze`]
    pub async fn analyze(&self) -> Result<Option<AnalysisResult>> {
        self.ensure_unlocked()?;
        self.orchestrator
            .analyze(&self.url, self.connectivity())
            .await
    }

    /// Start downloading a format of the current result; see [`Orchestrator::select_format`]
    pub fn select_format(&self, format_id: &str) -> Result<bool> {
        self.ensure_unlocked()?;
        self.orchestrator.select_format(format_id, &self.url)
    }

    pub fn request_state(&self) -> RequestState {
        self.orchestrator.state()
    }

    pub fn result(&self) -> Option<AnalysisResult> {
        self.orchestrator.result()
    }

    pub async fn thumbnail(&self) -> Thumbnail {
        match self.orchestrator.result() {
            Some(result) => thumbnail::load(&self.backend, &result).await,
            None => Thumbnail::Placeholder,
        }
    }
}
