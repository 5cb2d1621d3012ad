use anyhow::{Context, Result};

/// Copies text (a transcript rendering or collected logs) to the system
/// clipboard.
pub fn copy_text(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("init clipboard")?;
    clipboard.set_text(text.to_string()).context("set clipboard")?;
    Ok(())
}
