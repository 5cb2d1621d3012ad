use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scriven", version, about = "Audio transcription client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe an audio file and export the plain-text result.
    Transcribe(TranscribeArgs),
    /// List recognized model files, or change the model directory.
    Models(ModelsArgs),
    /// Print collected logs, or open the logs folder.
    Logs(LogsArgs),
    /// Set the display language; derived engine settings update with it.
    Language(LanguageArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct TranscribeArgs {
    #[arg(long)]
    pub input: PathBuf,
    /// Display language override for this job.
    #[arg(long)]
    pub lang: Option<String>,
    /// Skip the clipboard copy of the result.
    #[arg(long)]
    pub no_clipboard: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ModelsArgs {
    /// Persist a new model directory before listing.
    #[arg(long)]
    pub set_dir: Option<PathBuf>,
    /// Open the model directory in the file manager.
    #[arg(long)]
    pub open: bool,
}

#[derive(Parser, Debug, Clone, Default)]
pub struct LogsArgs {
    /// Open the logs folder instead of printing.
    #[arg(long)]
    pub open: bool,
    /// Copy the logs to the clipboard.
    #[arg(long)]
    pub copy: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct LanguageArgs {
    pub language: String,
}
