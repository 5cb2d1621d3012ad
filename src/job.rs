use crate::engine::{CancelToken, Engine, EngineError, TranscribeRequest};
use crate::transcript::Transcript;
use crossbeam_channel::Sender;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use thiserror::Error;

/// Events emitted by an engine invocation worker, delivered in channel order.
#[derive(Debug)]
pub enum JobEvent {
    Started,
    Progress(u8),
    Finished(Result<Transcript, EngineError>),
}

/// Lifecycle of the single transcription job. Exactly one live job per
/// session; created on submit, reset on dismissal.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Idle,
    Submitted,
    InProgress(u8),
    Completed(Transcript),
    Failed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("no audio file selected")]
    EmptyPath,
    #[error("a transcription job is already running")]
    Busy,
}

/// Terminal outcome the caller must surface to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Completed(Transcript),
    /// The engine's raw error description, shown verbatim.
    Failed(String),
}

/// Owns the lifecycle of one transcription job at a time. The engine runs
/// on a worker thread and reports back only through the event channel, so
/// every state mutation happens on the caller's thread.
pub struct JobController {
    engine: Arc<dyn Engine>,
    events_tx: Sender<JobEvent>,
    state: JobState,
    audio_path: Option<std::path::PathBuf>,
    cancel: Option<CancelToken>,
}

impl JobController {
    pub fn new(engine: Arc<dyn Engine>, events_tx: Sender<JobEvent>) -> Self {
        Self {
            engine,
            events_tx,
            state: JobState::Idle,
            audio_path: None,
            cancel: None,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn audio_path(&self) -> Option<&Path> {
        self.audio_path.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, JobState::Submitted | JobState::InProgress(_))
    }

    /// Submits a job to the engine. Rejects an empty path and rejects while
    /// a job is already submitted or in progress; the caller must wait for a
    /// terminal event. A lingering completed or failed job is implicitly
    /// dismissed. Transitions to `Submitted` synchronously.
    pub fn submit(&mut self, request: TranscribeRequest) -> Result<(), SubmitError> {
        if request.audio_path.as_os_str().is_empty() {
            return Err(SubmitError::EmptyPath);
        }
        if self.is_busy() {
            return Err(SubmitError::Busy);
        }
        tracing::info!(input = %request.audio_path.display(), lang = %request.lang, "submitting job");
        self.audio_path = Some(request.audio_path.clone());
        self.state = JobState::Submitted;
        let cancel = CancelToken::new();
        self.cancel = Some(cancel.clone());
        spawn_worker(Arc::clone(&self.engine), request, cancel, self.events_tx.clone());
        Ok(())
    }

    /// Applies one engine event. Returns a notice when the job reached a
    /// terminal state. Progress carries exactly the delivered value; events
    /// arriving after a terminal transition are ignored.
    pub fn handle_event(&mut self, event: JobEvent) -> Option<Notice> {
        match event {
            JobEvent::Started => {
                if self.state == JobState::Submitted {
                    self.state = JobState::InProgress(0);
                }
                None
            }
            JobEvent::Progress(p) => {
                if self.is_busy() {
                    self.state = JobState::InProgress(p);
                }
                None
            }
            JobEvent::Finished(result) => {
                if !self.is_busy() {
                    return None;
                }
                self.audio_path = None;
                self.cancel = None;
                match result {
                    Ok(transcript) => {
                        tracing::info!(utterances = transcript.utterances.len(), "job completed");
                        self.state = JobState::Completed(transcript.clone());
                        Some(Notice::Completed(transcript))
                    }
                    Err(err) => {
                        let message = err.to_string();
                        tracing::error!(error = %message, "job failed");
                        self.state = JobState::Failed(message.clone());
                        Some(Notice::Failed(message))
                    }
                }
            }
        }
    }

    /// Flags the in-flight job for cooperative cancellation. The engine may
    /// ignore the flag; the job only leaves its state on a terminal event.
    pub fn cancel(&mut self) {
        if let Some(token) = &self.cancel {
            tracing::info!("cancellation requested");
            token.cancel();
        }
    }

    /// Resets a completed or failed job back to idle so a new submit is
    /// accepted. No-op while a job is running or already idle.
    pub fn dismiss(&mut self) {
        if matches!(self.state, JobState::Completed(_) | JobState::Failed(_)) {
            self.state = JobState::Idle;
        }
    }

    pub fn progress(&self) -> Option<u8> {
        match self.state {
            JobState::InProgress(p) => Some(p),
            _ => None,
        }
    }
}

fn spawn_worker(
    engine: Arc<dyn Engine>,
    request: TranscribeRequest,
    cancel: CancelToken,
    tx: Sender<JobEvent>,
) {
    thread::spawn(move || {
        let _ = tx.send(JobEvent::Started);
        let progress_tx = tx.clone();
        let mut progress = move |p: u8| {
            let _ = progress_tx.send(JobEvent::Progress(p));
        };
        let result = engine.transcribe(&request, &mut progress, &cancel);
        let _ = tx.send(JobEvent::Finished(result));
    });
}
