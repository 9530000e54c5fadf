use crate::domain::{CommandEntry, ShellKind};
use crate::infra::HistoryStore;
use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "dirhist",
    version,
    about = "Browse shell history by the directory it ran in"
)]
pub struct Cli {
    /// History file to read and write (overrides the config file)
    #[arg(long, global = true, value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// Directory to open the browser in (defaults to the working directory)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Start in the directory tree instead of the history list
    #[arg(long)]
    pub tree: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Append one command to the history (meant for shell hooks)
    Record(RecordArgs),
    /// Print recorded commands containing a pattern
    Search(SearchArgs),
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// bash, zsh, powershell (pwsh), cmd or unknown
    #[arg(long, default_value = "unknown")]
    pub shell: ShellKind,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub exit_code: i32,

    #[arg(long, default_value_t = 0)]
    pub duration_ms: u64,

    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// The command line, after `--`
    #[arg(required = true, trailing_var_arg = true, num_args = 1..)]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    pub pattern: String,

    /// Only search commands run in this directory
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

pub fn resolve_dir(dir: Option<&PathBuf>) -> Result<String> {
    let path = match dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to read the working directory")?,
    };
    Ok(path.to_string_lossy().into_owned())
}

impl RecordArgs {
    fn to_entry(&self) -> Result<CommandEntry> {
        let timestamp = Local::now();
        Ok(CommandEntry {
            id: Uuid::new_v4().to_string(),
            command: self.command.join(" "),
            directory: resolve_dir(self.dir.as_ref())?,
            timestamp,
            shell: self.shell,
            exit_code: self.exit_code,
            duration_ms: self.duration_ms,
            tags: self.tags.iter().cloned().collect::<BTreeSet<_>>(),
        })
    }
}

pub fn run_record(store: &dyn HistoryStore, args: &RecordArgs) -> Result<()> {
    let entry = args.to_entry()?;
    store
        .record(&entry)
        .with_context(|| format!("failed to record command in {}", entry.directory))?;
    info!(id = %entry.id, directory = %entry.directory, "command recorded");
    Ok(())
}

pub fn run_search(store: &dyn HistoryStore, args: &SearchArgs, out: &mut impl Write) -> Result<()> {
    let scope = match &args.dir {
        Some(dir) => dir.to_string_lossy().into_owned(),
        None => String::new(),
    };
    let matches = store
        .search_commands(&args.pattern, &scope)
        .context("search failed")?;

    for entry in &matches {
        writeln!(
            out,
            "{}  {}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.directory,
            entry.command
        )?;
    }
    Ok(())
}
