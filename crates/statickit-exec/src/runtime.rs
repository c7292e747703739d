//! Async driver for the editor engine.
//!
//! The runtime is the only owner of [`EditorState`]. User actions go through
//! the reducer synchronously; every dispatch effect becomes a tokio task
//! whose outcome comes back over a channel as a [`RuntimeAction`] and is
//! reduced on the same loop, so no lock guards the state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use statickit_core::reduce;
use statickit_core::EditorAction;
use statickit_core::EditorEffect;
use statickit_core::EditorError;
use statickit_core::EditorState;
use statickit_core::GenerationFailure;
use statickit_core::GenerationJob;
use statickit_core::ResizeJob;
use statickit_core::RuntimeAction;
use statickit_core::UserAction;
use tokio::sync::mpsc;

use crate::contracts::AnalyzeRequest;
use crate::contracts::GenerateRequest;
use crate::contracts::ResizeRequest;
use crate::error::ServiceError;
use crate::service::ImageService;

pub struct EditorRuntime {
    state: EditorState,
    service: Arc<dyn ImageService>,
    sender: mpsc::UnboundedSender<RuntimeAction>,
    receiver: mpsc::UnboundedReceiver<RuntimeAction>,
    in_flight: usize,
    timeout: Option<Duration>,
    frames_requested: u64,
}

impl EditorRuntime {
    pub fn new(state: EditorState, service: Arc<dyn ImageService>) -> Self {
        let timeout = state
            .settings()
            .generation_timeout_ms
            .map(Duration::from_millis);
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            state,
            service,
            sender,
            receiver,
            in_flight: 0,
            timeout,
            frames_requested: 0,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn into_state(self) -> EditorState {
        self.state
    }

    /// Tasks spawned and not yet reduced back into the state.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn frames_requested(&self) -> u64 {
        self.frames_requested
    }

    /// Applies a user action. Must be called from inside a tokio runtime
    /// when the action can dispatch work.
    pub fn dispatch(&mut self, action: UserAction) -> Result<(), EditorError> {
        let effects = reduce(&mut self.state, EditorAction::User(action))?;
        self.apply_effects(effects);
        Ok(())
    }

    /// Fails work older than the configured timeout, measured against `now_ms`.
    pub fn expire_stale(&mut self, now_ms: i64) {
        self.apply_runtime(RuntimeAction::ExpireStale { now_ms });
    }

    /// Waits for the next task outcome and reduces it. Returns false when
    /// nothing is in flight.
    pub async fn next_result(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        let Some(action) = self.receiver.recv().await else {
            return false;
        };
        self.in_flight -= 1;
        self.apply_runtime(action);
        true
    }

    pub async fn run_until_idle(&mut self) {
        while self.next_result().await {}
        tracing::debug!(frames = self.frames_requested, "runtime idle");
    }

    fn apply_runtime(&mut self, action: RuntimeAction) {
        match reduce(&mut self.state, EditorAction::Runtime(action)) {
            Ok(effects) => self.apply_effects(effects),
            Err(err) => tracing::error!(code = err.code(), %err, "runtime action rejected"),
        }
    }

    fn apply_effects(&mut self, effects: Vec<EditorEffect>) {
        for effect in effects {
            match effect {
                EditorEffect::RequestFrame => self.frames_requested += 1,
                EditorEffect::DispatchGeneration(job) => self.spawn_generation(job),
                EditorEffect::DispatchResize(job) => self.spawn_resize(job),
                EditorEffect::AnalyzeImage { image_url } => self.spawn_analysis(image_url),
            }
        }
    }

    fn spawn_generation(&mut self, job: GenerationJob) {
        let service = Arc::clone(&self.service);
        let timeout = self.timeout;
        tracing::info!(branch = %job.branch_id, node = job.node_id.0, kind = job.kind.label(), "dispatching generation");
        let (branch_id, node_id) = (job.branch_id.clone(), job.node_id);
        let work = async move {
            let request = GenerateRequest::from_job(&job);
            match bounded(timeout, service.generate(request)).await {
                Ok(image_url) => RuntimeAction::GenerationCompleted {
                    branch_id: job.branch_id,
                    node_id: job.node_id,
                    image_url,
                },
                Err(failure) => RuntimeAction::GenerationFailed {
                    branch_id: job.branch_id,
                    node_id: job.node_id,
                    failure,
                },
            }
        };
        self.spawn_reporting(work, move |failure| RuntimeAction::GenerationFailed {
            branch_id,
            node_id,
            failure,
        });
    }

    fn spawn_resize(&mut self, job: ResizeJob) {
        let service = Arc::clone(&self.service);
        let timeout = self.timeout;
        tracing::info!(branch = %job.branch_id, label = %job.label, dims = %job.dims, "dispatching resize");
        let (branch_id, label, request_id) = (job.branch_id.clone(), job.label.clone(), job.request_id);
        let work = async move {
            let request = ResizeRequest::from_job(&job);
            match bounded(timeout, service.resize(request)).await {
                Ok(image_url) => RuntimeAction::ResizeCompleted {
                    branch_id: job.branch_id,
                    label: job.label,
                    request_id: job.request_id,
                    image_url,
                },
                Err(failure) => RuntimeAction::ResizeFailed {
                    branch_id: job.branch_id,
                    label: job.label,
                    request_id: job.request_id,
                    failure,
                },
            }
        };
        self.spawn_reporting(work, move |failure| RuntimeAction::ResizeFailed {
            branch_id,
            label,
            request_id,
            failure,
        });
    }

    fn spawn_analysis(&mut self, image_url: String) {
        let service = Arc::clone(&self.service);
        let timeout = self.timeout;
        let fallback_url = image_url.clone();
        let work = async move {
            let request = AnalyzeRequest {
                image: image_url.clone(),
            };
            match bounded(timeout, service.analyze(request)).await {
                Ok(analysis) => RuntimeAction::AnalysisReady {
                    image_url,
                    analysis,
                },
                Err(failure) => RuntimeAction::AnalysisFailed {
                    image_url,
                    message: failure.to_string(),
                },
            }
        };
        self.spawn_reporting(work, move |failure| RuntimeAction::AnalysisFailed {
            image_url: fallback_url,
            message: failure.to_string(),
        });
    }

    /// Runs `work` on its own task and sends exactly one action back. A task
    /// that panics or is cancelled reports `on_abort` instead.
    fn spawn_reporting<F, A>(&mut self, work: F, on_abort: A)
    where
        F: Future<Output = RuntimeAction> + Send + 'static,
        A: FnOnce(GenerationFailure) -> RuntimeAction + Send + 'static,
    {
        self.in_flight += 1;
        let sender = self.sender.clone();
        let task = tokio::spawn(work);
        tokio::spawn(async move {
            let action = match task.await {
                Ok(action) => action,
                Err(err) => {
                    tracing::error!(%err, "image service task aborted");
                    on_abort(GenerationFailure::Aborted {
                        message: err.to_string(),
                    })
                }
            };
            // A closed channel means the runtime is gone and nobody wants the result.
            let _ = sender.send(action);
        });
    }
}

async fn bounded<T, F>(timeout: Option<Duration>, work: F) -> Result<T, GenerationFailure>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    let Some(limit) = timeout else {
        return work.await.map_err(GenerationFailure::from);
    };
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result.map_err(GenerationFailure::from),
        Err(_) => Err(GenerationFailure::TimedOut {
            after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
