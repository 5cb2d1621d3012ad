use anyhow::Result;
use crossbeam_channel::unbounded;
use scriven::config::{PrefStore, Preferences};
use scriven::engine::{CancelToken, Engine, EngineError, TranscribeRequest};
use scriven::events::{Event, EventBus, EventKind};
use scriven::job::{JobController, JobEvent, JobState, Notice};
use scriven::transcript::{Transcript, Utterance};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

struct ScriptedEngine {
    progress: Vec<u8>,
    outcome: Result<Transcript, EngineError>,
}

impl Engine for ScriptedEngine {
    fn transcribe(
        &self,
        _request: &TranscribeRequest,
        progress: &mut dyn FnMut(u8),
        _cancel: &CancelToken,
    ) -> Result<Transcript, EngineError> {
        for p in &self.progress {
            progress(*p);
        }
        self.outcome.clone()
    }
}

fn request(path: &str) -> TranscribeRequest {
    TranscribeRequest {
        audio_path: PathBuf::from(path),
        model_path: PathBuf::from("model.bin"),
        lang: "en".to_string(),
        translate: false,
    }
}

fn drive_to_terminal(
    controller: &mut JobController,
    rx: &crossbeam_channel::Receiver<JobEvent>,
    bus: &mut EventBus,
) -> Notice {
    loop {
        let event = rx.recv_timeout(Duration::from_secs(5)).expect("engine event");
        if let JobEvent::Progress(p) = &event {
            bus.publish(Event::Progress(*p));
        }
        if let Some(notice) = controller.handle_event(event) {
            return notice;
        }
    }
}

#[test]
fn full_lifecycle_success_with_progress_subscribers() {
    let transcript = Transcript {
        utterances: vec![Utterance::new("hello"), Utterance::new("world")],
    };
    let engine = Arc::new(ScriptedEngine {
        progress: vec![25, 50, 100],
        outcome: Ok(transcript.clone()),
    });
    let (tx, rx) = unbounded();
    let mut controller = JobController::new(engine, tx);

    let mut bus = EventBus::new();
    let mut handles = Vec::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = Rc::clone(&seen);
        handles.push(bus.subscribe(EventKind::Progress, move |event| {
            if let Event::Progress(p) = event {
                seen.borrow_mut().push(*p);
            }
        }));
    }

    controller.submit(request("talk.wav")).expect("submit");
    assert_eq!(*controller.state(), JobState::Submitted);

    let notice = drive_to_terminal(&mut controller, &rx, &mut bus);
    assert_eq!(notice, Notice::Completed(transcript.clone()));
    assert_eq!(*seen.borrow(), vec![25, 50, 100]);
    assert_eq!(transcript.to_text(), "hello\nworld");

    bus.unsubscribe_all(&mut handles);
    controller.dismiss();
    assert_eq!(*controller.state(), JobState::Idle);

    // Stale subscribers must not fire after teardown.
    bus.publish(Event::Progress(77));
    assert_eq!(*seen.borrow(), vec![25, 50, 100]);
}

#[test]
fn failure_surfaces_verbatim_and_allows_retry() {
    let engine = Arc::new(ScriptedEngine {
        progress: vec![10],
        outcome: Err(EngineError::Engine("disk full".to_string())),
    });
    let (tx, rx) = unbounded();
    let mut controller = JobController::new(engine, tx);
    let mut bus = EventBus::new();

    controller.submit(request("talk.wav")).expect("submit");
    let notice = drive_to_terminal(&mut controller, &rx, &mut bus);
    assert_eq!(notice, Notice::Failed("disk full".to_string()));
    assert_eq!(controller.audio_path(), None);

    controller.dismiss();
    assert_eq!(*controller.state(), JobState::Idle);
    controller.submit(request("talk.wav")).expect("retry after failure");
}

#[test]
fn focus_event_drives_model_rescan() -> Result<()> {
    let dir = tempdir()?;
    let models_dir = dir.path().join("models");
    fs::create_dir_all(&models_dir)?;
    let store = PrefStore::open(dir.path().join("scriven.yaml"))?;
    let prefs = Rc::new(RefCell::new(Preferences::load(store, models_dir.clone())));

    let mut bus = EventBus::new();
    let mut handles = Vec::new();
    let listed = Rc::new(RefCell::new(Vec::new()));
    {
        let prefs = Rc::clone(&prefs);
        let listed = Rc::clone(&listed);
        handles.push(bus.subscribe(EventKind::Focus, move |_| {
            let mut prefs = prefs.borrow_mut();
            *listed.borrow_mut() = prefs.refresh_models();
            prefs.default_model();
        }));
    }

    bus.publish(Event::Focus);
    assert!(listed.borrow().is_empty());
    assert_eq!(prefs.borrow().current().model_path, None);

    // A model dropped into the directory is picked up on the next focus,
    // and default-model derivation persists it.
    fs::write(models_dir.join("fresh.bin"), b"")?;
    bus.publish(Event::Focus);
    assert_eq!(listed.borrow().len(), 1);
    assert_eq!(listed.borrow()[0].name, "fresh.bin");
    assert_eq!(
        prefs.borrow().current().model_path,
        Some(models_dir.join("fresh.bin"))
    );

    bus.unsubscribe_all(&mut handles);
    Ok(())
}
