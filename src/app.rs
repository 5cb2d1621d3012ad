use crate::chime;
use crate::cli::{Cli, Commands, LanguageArgs, LogsArgs, ModelsArgs, TranscribeArgs};
use crate::clipboard;
use crate::config::{self, PrefStore, Preferences};
use crate::engine::{ProcessEngine, TranscribeRequest};
use crate::events::{Event, EventBus, EventKind};
use crate::job::{JobController, JobEvent, Notice};
use crate::language;
use crate::logging;
use crate::storage;
use anyhow::{Context, Result, bail};
use clap::Parser;
use crossbeam_channel::unbounded;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::sync::Arc;

pub fn run() -> Result<()> {
    // Logging comes up before anything that can fail or trace.
    let store_path = PrefStore::default_path()?;
    logging::init(PrefStore::peek_bool(&store_path, config::KEY_LOG_TO_FILE));
    let store = PrefStore::open(store_path)?;
    let mut prefs = Preferences::load(store, storage::models_dir()?);
    let cli = Cli::parse();
    match cli.command {
        Commands::Transcribe(args) => run_transcribe(args, &mut prefs),
        Commands::Models(args) => run_models(args, &mut prefs),
        Commands::Logs(args) => run_logs(args),
        Commands::Language(args) => run_language(args, &mut prefs),
    }
}

fn run_transcribe(args: TranscribeArgs, prefs: &mut Preferences) -> Result<()> {
    let model_path = prefs.default_model().with_context(|| {
        format!(
            "no model found in {}; place a .bin model there or run `scriven models --set-dir`",
            prefs.models_folder().display()
        )
    })?;
    let lang = match &args.lang {
        Some(lang) => language::engine_code(lang)
            .map(str::to_string)
            .unwrap_or_else(|| lang.clone()),
        None => prefs.current().model_options.lang.clone(),
    };
    let request = TranscribeRequest {
        audio_path: args.input.clone(),
        model_path,
        lang,
        translate: prefs.current().model_options.translate,
    };

    let (events_tx, events_rx) = unbounded();
    let engine = Arc::new(ProcessEngine::new(prefs.engine_command()));
    let mut controller = JobController::new(engine, events_tx);

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} {bar:40} {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    // Subscriptions live exactly as long as this job; released on every
    // exit path below.
    let mut bus = EventBus::new();
    let mut handles = Vec::new();
    {
        let bar = bar.clone();
        handles.push(bus.subscribe(EventKind::Progress, move |event| {
            if let Event::Progress(p) = event {
                bar.set_position(u64::from(*p));
            }
        }));
    }
    controller.submit(request)?;
    let outcome = (|| -> Result<Notice> {
        loop {
            let event = events_rx.recv().context("engine event channel closed")?;
            if let JobEvent::Progress(p) = &event {
                bus.publish(Event::Progress(*p));
            }
            if let Some(notice) = controller.handle_event(event) {
                return Ok(notice);
            }
        }
    })();
    // Release subscriptions on every exit path before surfacing the outcome.
    bus.unsubscribe_all(&mut handles);
    let outcome = outcome?;

    match outcome {
        Notice::Completed(transcript) => {
            bar.finish_and_clear();
            controller.dismiss();
            if let Err(err) = chime::completion() {
                tracing::debug!(error = %err, "completion chime unavailable");
            }
            request_window_focus();
            let text = transcript.to_text();
            let output = args.input.with_extension("txt");
            fs::write(&output, &text)
                .with_context(|| format!("write transcript {}", output.display()))?;
            if !args.no_clipboard {
                if let Err(err) = clipboard::copy_text(&text) {
                    tracing::warn!(error = %err, "clipboard copy failed");
                }
            }
            tracing::info!(output = %output.display(), "transcription complete");
            println!("{text}");
            Ok(())
        }
        Notice::Failed(message) => {
            bar.finish_and_clear();
            controller.dismiss();
            // The engine's error description goes to the user verbatim.
            bail!("{message}")
        }
    }
}

fn run_models(args: ModelsArgs, prefs: &mut Preferences) -> Result<()> {
    let models = match args.set_dir {
        Some(dir) => prefs.change_directory(dir),
        None => prefs.refresh_models(),
    };
    let folder = prefs.models_folder();
    if args.open {
        storage::open_path(&folder);
    }
    if models.is_empty() {
        println!("no models in {}", folder.display());
        return Ok(());
    }
    for model in models {
        println!("{}", model.name);
    }
    Ok(())
}

fn run_logs(args: LogsArgs) -> Result<()> {
    let logs_dir = storage::logs_dir()?;
    if args.open {
        storage::open_path(&logs_dir);
        return Ok(());
    }
    let logs = storage::read_logs(&logs_dir);
    if args.copy {
        clipboard::copy_text(&logs)?;
        return Ok(());
    }
    print!("{logs}");
    Ok(())
}

fn run_language(args: LanguageArgs, prefs: &mut Preferences) -> Result<()> {
    let known = language::engine_code(&args.language).is_some();
    prefs.change_language(&args.language);
    if known {
        println!(
            "display language: {} (engine: {}, direction: {:?})",
            prefs.current().display_language,
            prefs.current().model_options.lang,
            prefs.current().text_area_direction,
        );
    } else {
        println!(
            "display language: {} (no engine mapping; engine language stays {})",
            prefs.current().display_language,
            prefs.current().model_options.lang,
        );
    }
    Ok(())
}

// Hook for a host window shell to raise its window after completion.
// Best-effort; the CLI has no window, so the request is logged and dropped.
fn request_window_focus() {
    tracing::debug!("window focus requested");
}
