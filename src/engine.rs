use crate::transcript::{Transcript, Utterance};
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use thiserror::Error;

/// Cooperative cancellation flag threaded through an engine invocation.
/// The engine may ignore it; terminal events stay the source of truth.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Raw engine error description, surfaced verbatim to the user.
    #[error("{0}")]
    Engine(String),
    #[error("transcription cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub audio_path: PathBuf,
    pub model_path: PathBuf,
    pub lang: String,
    pub translate: bool,
}

/// Narrow invocation bridge to the external transcription engine.
pub trait Engine: Send + Sync {
    fn transcribe(
        &self,
        request: &TranscribeRequest,
        progress: &mut dyn FnMut(u8),
        cancel: &CancelToken,
    ) -> Result<Transcript, EngineError>;
}

/// Line-delimited JSON messages the engine process writes to stdout.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BridgeMessage {
    Progress { value: u8 },
    Transcript { utterances: Vec<Utterance> },
}

/// Engine reached by spawning an external command. Progress arrives as
/// `{"type":"progress","value":N}` lines, the result as a single
/// `{"type":"transcript",...}` line; a nonzero exit surfaces trimmed stderr
/// as the error message.
pub struct ProcessEngine {
    command: PathBuf,
}

impl ProcessEngine {
    pub fn new(command: PathBuf) -> Self {
        Self { command }
    }
}

impl Engine for ProcessEngine {
    fn transcribe(
        &self,
        request: &TranscribeRequest,
        progress: &mut dyn FnMut(u8),
        cancel: &CancelToken,
    ) -> Result<Transcript, EngineError> {
        let mut command = Command::new(&self.command);
        command
            .arg("--input")
            .arg(&request.audio_path)
            .arg("--model")
            .arg(&request.model_path)
            .arg("--lang")
            .arg(&request.lang)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if request.translate {
            command.arg("--translate");
        }
        tracing::debug!(command = %self.command.display(), input = %request.audio_path.display(), "invoking engine");

        let mut child = command
            .spawn()
            .map_err(|err| EngineError::Engine(format!("failed to start engine: {err}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Engine("engine stdout unavailable".to_string()))?;
        // Drain stderr on its own thread; a chatty engine can fill the pipe
        // buffer long before stdout closes and stall the line loop below.
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf);
                buf
            })
        });

        let mut transcript = None;
        for line in BufReader::new(stdout).lines() {
            if cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(EngineError::Cancelled);
            }
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!(error = %err, "engine stdout read failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<BridgeMessage>(&line) {
                Ok(BridgeMessage::Progress { value }) => progress(value.min(100)),
                Ok(BridgeMessage::Transcript { utterances }) => {
                    transcript = Some(Transcript { utterances });
                }
                Err(err) => {
                    tracing::debug!(error = %err, line = %line, "unrecognized engine output");
                }
            }
        }

        let status = child
            .wait()
            .map_err(|err| EngineError::Engine(format!("engine wait failed: {err}")))?;
        let stderr_text = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if !status.success() {
            let message = stderr_text.trim();
            let message = if message.is_empty() {
                format!("engine exited with {status}")
            } else {
                message.to_string()
            };
            return Err(EngineError::Engine(message));
        }
        transcript.ok_or_else(|| EngineError::Engine("engine produced no transcript".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_starts_clear_and_latches() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn bridge_messages_parse() -> anyhow::Result<()> {
        let msg: BridgeMessage = serde_json::from_str(r#"{"type":"progress","value":55}"#)?;
        assert!(matches!(msg, BridgeMessage::Progress { value: 55 }));
        let msg: BridgeMessage =
            serde_json::from_str(r#"{"type":"transcript","utterances":[{"text":"hi"}]}"#)?;
        match msg {
            BridgeMessage::Transcript { utterances } => assert_eq!(utterances[0].text, "hi"),
            _ => panic!("expected transcript"),
        }
        Ok(())
    }

    #[test]
    fn engine_error_displays_raw_message() {
        let err = EngineError::Engine("disk full".to_string());
        assert_eq!(err.to_string(), "disk full");
    }

    #[cfg(unix)]
    mod process {
        use super::super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;
        use std::time::Duration;
        use tempfile::tempdir;

        fn script_engine(dir: &Path, body: &str) -> ProcessEngine {
            let path = dir.join("engine.sh");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
            let mut perms = std::fs::metadata(&path).expect("stat script").permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).expect("chmod script");
            ProcessEngine::new(path)
        }

        fn request() -> TranscribeRequest {
            TranscribeRequest {
                audio_path: PathBuf::from("audio.wav"),
                model_path: PathBuf::from("model.bin"),
                lang: "en".to_string(),
                translate: false,
            }
        }

        #[test]
        fn nonzero_exit_surfaces_trimmed_stderr_verbatim() {
            let dir = tempdir().expect("tempdir");
            let engine = script_engine(dir.path(), "echo '  disk full  ' >&2\nexit 3");
            let err = engine
                .transcribe(&request(), &mut |_| {}, &CancelToken::new())
                .unwrap_err();
            assert_eq!(err, EngineError::Engine("disk full".to_string()));
        }

        #[test]
        fn nonzero_exit_with_silent_stderr_reports_status() {
            let dir = tempdir().expect("tempdir");
            let engine = script_engine(dir.path(), "exit 7");
            let err = engine
                .transcribe(&request(), &mut |_| {}, &CancelToken::new())
                .unwrap_err();
            match err {
                EngineError::Engine(message) => assert!(message.contains("exited")),
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn chatty_stderr_does_not_stall_the_invocation() {
            let dir = tempdir().expect("tempdir");
            // Well past the ~64 KiB pipe buffer before stdout finishes.
            let body = r#"i=0
while [ $i -lt 4000 ]; do
  echo "verbose engine diagnostics ................................................" >&2
  i=$((i+1))
done
echo '{"type":"progress","value":50}'
echo '{"type":"transcript","utterances":[{"text":"hello"}]}'"#;
            let engine = Arc::new(script_engine(dir.path(), body));
            let (tx, rx) = crossbeam_channel::unbounded();
            thread::spawn(move || {
                let mut seen = Vec::new();
                let result = engine.transcribe(&request(), &mut |p| seen.push(p), &CancelToken::new());
                let _ = tx.send((result, seen));
            });
            let (result, seen) = rx
                .recv_timeout(Duration::from_secs(30))
                .expect("engine invocation stalled on stderr backpressure");
            let transcript = result.expect("transcribe");
            assert_eq!(transcript.to_text(), "hello");
            assert_eq!(seen, vec![50]);
        }
    }
}
