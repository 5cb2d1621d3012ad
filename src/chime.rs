use anyhow::{Context, Result};
use rodio::{OutputStream, Sink, Source, source::SineWave};
use std::time::Duration;

/// Audible completion notification: two short ascending notes. Callers
/// treat failures as best-effort.
pub fn completion() -> Result<()> {
    let (_stream, handle) = OutputStream::try_default().context("open audio output")?;
    let sink = Sink::try_new(&handle).context("create sink")?;
    for freq in [660.0, 990.0] {
        let note = SineWave::new(freq)
            .take_duration(Duration::from_millis(140))
            .amplify(0.2);
        sink.append(note);
    }
    sink.sleep_until_end();
    Ok(())
}
