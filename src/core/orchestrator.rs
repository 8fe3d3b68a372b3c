//! Analyze/download request lifecycle

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, sleep_until, timeout};
use tracing::{debug, info, warn};

use super::backend::BackendClient;
use super::launcher::{DownloadLauncher, DownloadTicket};
use crate::error::{Result, StreamSaverError};
use crate::types::{AnalysisResult, ConnectivityStatus, DownloadRequest, RequestState};

#[derive(Debug, Default)]
struct Inner {
    state: RequestState,
    result: Option<AnalysisResult>,
    /// Bumped on every analyze start and on reset; a response whose sequence no
    /// longer matches is stale and dropped.
    analyze_seq: u64,
    /// Same scheme for the download cool-down timer
    download_seq: u64,
}

/// Owns [`RequestState`] and the current [`AnalysisResult`].
///
/// Clones share state. The mutex is never held across an await point.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Mutex<Inner>>,
    backend: BackendClient,
    launcher: Arc<dyn DownloadLauncher>,
    analyze_timeout: Duration,
    download_cooldown: Duration,
}

impl Orchestrator {
    pub fn new(
        backend: BackendClient,
        launcher: Arc<dyn DownloadLauncher>,
        analyze_timeout: Duration,
        download_cooldown: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            backend,
            launcher,
            analyze_timeout,
            download_cooldown,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    pub fn state(&self) -> RequestState {
        self.lock().state.clone()
    }

    pub fn result(&self) -> Option<AnalysisResult> {
        self.lock().result.clone()
    }

    /// Submit `url` for analysis.
    ///
    /// Returns `Ok(None)` without side effects when the URL is empty or an analyze is
    /// already in flight. Refuses with [`StreamSaverError::Offline`] before any network
    /// call when the backend is known to be down. Every backend, payload, or deadline
    /// failure surfaces as [`StreamSaverError::AnalyzeFailed`].
    pub async fn analyze(
        &self,
        url: &str,
        connectivity: ConnectivityStatus,
    ) -> Result<Option<AnalysisResult>> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(None);
        }

        let seq = {
            let mut inner = self.lock();
            if inner.state.loading {
                debug!("analyze already in flight, ignoring");
                return Ok(None);
            }
            if connectivity == ConnectivityStatus::Disconnected {
                inner.state.error = Some(StreamSaverError::Offline.to_string());
                return Err(StreamSaverError::Offline);
            }
            inner.state.loading = true;
            inner.state.error = None;
            inner.result = None;
            inner.analyze_seq += 1;
            inner.analyze_seq
        };

        let outcome = match timeout(self.analyze_timeout, self.backend.analyze(url)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(StreamSaverError::Timeout(self.analyze_timeout)),
        };

        let mut inner = self.lock();
        if inner.analyze_seq != seq {
            debug!(seq, "discarding stale analyze outcome");
            return Ok(None);
        }
        inner.state.loading = false;

        match outcome {
            Ok(result) => {
                info!(title = %result.title, formats = result.formats.len(), "analyze succeeded");
                inner.result = Some(result.clone());
                Ok(Some(result))
            }
            Err(e) => {
                warn!(error = %e, code = ?e.code(), url, "analyze failed");
                inner.state.error = Some(StreamSaverError::AnalyzeFailed.to_string());
                Err(StreamSaverError::AnalyzeFailed)
            }
        }
    }

    /// Start a download of `format_id` from the current result.
    ///
    /// Returns `Ok(false)` while another download is still cooling down. The indicator
    /// clears after the cool-down, or sooner if the launcher reports completion.
    pub fn select_format(&self, format_id: &str, typed_url: &str) -> Result<bool> {
        let (request, seq) = {
            let mut inner = self.lock();
            if inner.state.downloading_format_id.is_some() {
                debug!(format_id, "download already starting, ignoring selection");
                return Ok(false);
            }
            let request = {
                let result = inner.result.as_ref().ok_or(StreamSaverError::NoResult)?;
                let format = result
                    .formats
                    .iter()
                    .find(|f| f.id == format_id)
                    .ok_or_else(|| StreamSaverError::UnknownFormat(format_id.to_string()))?;

                let reference = result
                    .resolved_url
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .unwrap_or(typed_url.trim());
                DownloadRequest {
                    url: self.backend.download_url(reference, &format.id),
                    format_id: format.id.clone(),
                }
            };

            inner.state.downloading_format_id = Some(request.format_id.clone());
            inner.download_seq += 1;
            (request, inner.download_seq)
        };

        let ticket = match self.launcher.launch(&request) {
            Ok(ticket) => ticket,
            Err(e) => {
                let mut inner = self.lock();
                if inner.download_seq == seq {
                    inner.state.downloading_format_id = None;
                }
                return Err(e);
            }
        };

        let inner = Arc::clone(&self.inner);
        let deadline = Instant::now() + self.download_cooldown;
        tokio::spawn(async move {
            match ticket {
                DownloadTicket::Detached => sleep_until(deadline).await,
                DownloadTicket::Tracked(done) => {
                    tokio::select! {
                        _ = sleep_until(deadline) => {}
                        _ = done => debug!("download finished before cool-down"),
                    }
                }
            }
            let mut inner = lock_inner(&inner);
            if inner.download_seq == seq {
                inner.state.downloading_format_id = None;
            }
        });

        Ok(true)
    }

    /// Drop result and request state; in-flight outcomes become stale
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = RequestState::default();
        inner.result = None;
        inner.analyze_seq += 1;
        inner.download_seq += 1;
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormatOption;
    use tokio::time::sleep;

    #[derive(Default)]
    struct RecordingLauncher {
        launched: Mutex<Vec<DownloadRequest>>,
    }

    impl DownloadLauncher for RecordingLauncher {
        fn launch(&self, request: &DownloadRequest) -> Result<DownloadTicket> {
            self.launched.lock().unwrap().push(request.clone());
            Ok(DownloadTicket::Detached)
        }
    }

    struct FailingLauncher;

    impl DownloadLauncher for FailingLauncher {
        fn launch(&self, _request: &DownloadRequest) -> Result<DownloadTicket> {
            Err(StreamSaverError::Launch("no opener".into()))
        }
    }

    fn result(resolved_url: Option<&str>) -> AnalysisResult {
        AnalysisResult {
            title: "T".into(),
            author: "A".into(),
            thumbnail: None,
            resolved_url: resolved_url.map(String::from),
            formats: vec![
                FormatOption {
                    id: "mp4".into(),
                    quality: "720p".into(),
                    ext: "mp4".into(),
                    kind: None,
                },
                FormatOption {
                    id: "mp3".into(),
                    quality: "Audio Only".into(),
                    ext: "mp3".into(),
                    kind: None,
                },
            ],
            id: None,
            duration: None,
            platform: None,
        }
    }

    fn orchestrator(launcher: Arc<dyn DownloadLauncher>) -> Orchestrator {
        // Nothing listens here; tests below never reach the network.
        let backend = BackendClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        Orchestrator::new(
            backend,
            launcher,
            Duration::from_secs(60),
            Duration::from_secs(4),
        )
    }

    fn seed(orch: &Orchestrator, value: AnalysisResult) {
        orch.lock().result = Some(value);
    }

    #[tokio::test]
    async fn test_offline_refuses_without_loading() {
        let orch = orchestrator(Arc::new(RecordingLauncher::default()));

        let err = orch
            .analyze("https://youtu.be/abc", ConnectivityStatus::Disconnected)
            .await
            .unwrap_err();

        assert!(matches!(err, StreamSaverError::Offline));
        let state = orch.state();
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Engine is offline."));
    }

    #[tokio::test]
    async fn test_empty_url_is_ignored() {
        let orch = orchestrator(Arc::new(RecordingLauncher::default()));
        let outcome = orch.analyze("   ", ConnectivityStatus::Connected).await.unwrap();
        assert!(outcome.is_none());
        assert_eq!(orch.state(), RequestState::default());
    }

    #[tokio::test]
    async fn test_select_prefers_resolved_url() {
        let launcher = Arc::new(RecordingLauncher::default());
        let orch = orchestrator(launcher.clone());
        seed(&orch, result(Some("https://www.youtube.com/watch?v=abc")));

        assert!(orch.select_format("mp3", "https://youtu.be/abc").unwrap());

        let launched = launcher.launched.lock().unwrap();
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].format_id, "mp3");
        assert!(launched[0].url.contains("url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dabc"));
        assert!(launched[0].url.ends_with("&format=mp3"));
    }

    #[tokio::test]
    async fn test_select_falls_back_to_typed_url() {
        let launcher = Arc::new(RecordingLauncher::default());
        let orch = orchestrator(launcher.clone());
        seed(&orch, result(Some("")));

        orch.select_format("mp4", "https://youtu.be/abc").unwrap();

        let launched = launcher.launched.lock().unwrap();
        assert!(launched[0].url.contains("url=https%3A%2F%2Fyoutu.be%2Fabc"));
    }

    #[tokio::test]
    async fn test_fallback_reference_is_trimmed_like_analyze() {
        let launcher = Arc::new(RecordingLauncher::default());
        let orch = orchestrator(launcher.clone());
        seed(&orch, result(None));

        orch.select_format("mp4", "  https://youtu.be/abc \n").unwrap();

        let launched = launcher.launched.lock().unwrap();
        assert_eq!(
            launched[0].url,
            "http://127.0.0.1:9/download?url=https%3A%2F%2Fyoutu.be%2Fabc&format=mp4"
        );
    }

    #[tokio::test]
    async fn test_select_without_result_or_unknown_format() {
        let orch = orchestrator(Arc::new(RecordingLauncher::default()));
        assert!(matches!(
            orch.select_format("mp4", "u"),
            Err(StreamSaverError::NoResult)
        ));

        seed(&orch, result(None));
        assert!(matches!(
            orch.select_format("webm", "u"),
            Err(StreamSaverError::UnknownFormat(_))
        ));
        assert!(orch.state().downloading_format_id.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_guard_and_cooldown() {
        let launcher = Arc::new(RecordingLauncher::default());
        let orch = orchestrator(launcher.clone());
        seed(&orch, result(None));

        assert!(orch.select_format("mp4", "https://youtu.be/abc").unwrap());
        assert!(!orch.select_format("mp3", "https://youtu.be/abc").unwrap());
        assert_eq!(orch.state().downloading_format_id.as_deref(), Some("mp4"));
        assert_eq!(launcher.launched.lock().unwrap().len(), 1);

        sleep(Duration::from_millis(3_999)).await;
        assert_eq!(orch.state().downloading_format_id.as_deref(), Some("mp4"));

        sleep(Duration::from_millis(2)).await;
        assert!(orch.state().downloading_format_id.is_none());

        assert!(orch.select_format("mp3", "https://youtu.be/abc").unwrap());
        assert_eq!(launcher.launched.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracked_completion_clears_early() {
        struct TrackedLauncher(Mutex<Option<tokio::sync::oneshot::Sender<()>>>);

        impl DownloadLauncher for TrackedLauncher {
            fn launch(&self, _request: &DownloadRequest) -> Result<DownloadTicket> {
                let (tx, rx) = tokio::sync::oneshot::channel();
                *self.0.lock().unwrap() = Some(tx);
                Ok(DownloadTicket::Tracked(rx))
            }
        }

        let launcher = Arc::new(TrackedLauncher(Mutex::new(None)));
        let orch = orchestrator(launcher.clone());
        seed(&orch, result(None));

        orch.select_format("mp4", "u").unwrap();
        sleep(Duration::from_millis(500)).await;
        assert!(orch.state().downloading_format_id.is_some());

        let tx = launcher.0.lock().unwrap().take().unwrap();
        tx.send(()).unwrap();
        sleep(Duration::from_millis(1)).await;
        assert!(orch.state().downloading_format_id.is_none());
    }

    #[tokio::test]
    async fn test_failed_launch_clears_indicator() {
        let orch = orchestrator(Arc::new(FailingLauncher));
        seed(&orch, result(None));

        let err = orch.select_format("mp4", "u").unwrap_err();
        assert!(matches!(err, StreamSaverError::Launch(_)));
        assert!(orch.state().downloading_format_id.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_everything() {
        let orch = orchestrator(Arc::new(RecordingLauncher::default()));
        seed(&orch, result(None));
        orch.select_format("mp4", "u").unwrap();

        orch.reset();
        assert!(orch.result().is_none());
        assert_eq!(orch.state(), RequestState::default());

        // The stale cool-down timer must not touch a newer download
        seed(&orch, result(None));
        sleep(Duration::from_millis(3_000)).await;
        orch.select_format("mp3", "u").unwrap();
        sleep(Duration::from_millis(1_500)).await;
        assert_eq!(orch.state().downloading_format_id.as_deref(), Some("mp3"));
    }
}
