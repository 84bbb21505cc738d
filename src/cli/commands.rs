//! Command execution: session setup, the read-eval loop and dispatch

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use colored::Colorize;
use tracing::{debug, instrument};

use crate::application::services::{EntryRow, ShellService, TouchOutcome};
use crate::cli::args::Cli;
use crate::cli::command::{ShellCommand, HELP};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::Settings;
use crate::domain::{MergeReport, NodeKind, RemoveOutcome};
use crate::infrastructure::ServiceContainer;

/// Whether the loop keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub fn execute(cli: &Cli) -> CliResult<()> {
    if cli.config_template {
        output::info(&Settings::template());
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    if cli.show_config {
        output::info(&settings.to_toml()?);
        return Ok(());
    }

    let container = ServiceContainer::new(settings);
    let mut shell = container.shell_service();
    if let Some(path) = &cli.load {
        shell.load(path)?;
        debug!("started from snapshot {}", path.display());
    }

    match &cli.script {
        Some(path) => {
            let file = File::open(path).map_err(|source| CliError::Io {
                path: path.clone(),
                source,
            })?;
            let lines = BufReader::new(file).lines();
            run_session(&mut shell, lines, path.clone())
        }
        None => {
            let prompt = container.settings.prompt.clone();
            let lines = std::iter::from_fn(move || {
                output::prompt(&prompt);
                let mut line = String::new();
                match io::stdin().read_line(&mut line) {
                    Ok(0) => None,
                    Ok(_) => Some(Ok(line)),
                    Err(e) => Some(Err(e)),
                }
            });
            run_session(&mut shell, lines, PathBuf::from("<stdin>"))
        }
    }
}

/// Run commands until `exit` or end of input, then write the autosave
/// snapshot if one is configured.
///
/// Errors of single commands are printed and the loop goes on; only a
/// failure to read input ends the session with an error.
pub fn run_session<I>(shell: &mut ShellService, lines: I, source: PathBuf) -> CliResult<()>
where
    I: Iterator<Item = io::Result<String>>,
{
    for line in lines {
        let line = line.map_err(|e| CliError::Io {
            path: source.clone(),
            source: e,
        })?;
        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                output::error(&e);
                continue;
            }
        };
        match dispatch(shell, command) {
            Ok(Flow::Exit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => output::error(&e),
        }
    }

    if let Some(path) = shell.autosave()? {
        output::action("Saved", &path.display());
    }
    Ok(())
}

#[instrument(level = "debug", skip(shell))]
pub fn dispatch(shell: &mut ShellService, command: ShellCommand) -> CliResult<Flow> {
    match command {
        ShellCommand::Mkdir(name) => {
            shell.mkdir(&name)?;
        }
        ShellCommand::Touch(name) => match shell.touch(&name)? {
            TouchOutcome::Created => {}
            TouchOutcome::Skipped => output::detail(&format!("skipped {}", name)),
            TouchOutcome::Renamed(new_name) => output::action("Created", &new_name),
            TouchOutcome::Overwritten => output::action("Overwritten", &name),
        },
        ShellCommand::Ls => {
            for row in shell.list()? {
                output::info(&format_row(&row));
            }
        }
        ShellCommand::Tree => output::info(shell.tree_view().trim_end()),
        ShellCommand::Edit { name, text } => {
            if !shell.edit(&name, text.as_deref())? {
                output::warning("no input, content unchanged");
            }
        }
        ShellCommand::Cat(name) => output::info(&shell.cat(&name)?),
        ShellCommand::Cd(name) => shell.cd(&name)?,
        ShellCommand::CdUp => shell.cd_up(),
        ShellCommand::Pwd => output::info(&shell.pwd()?),
        ShellCommand::Rm(name) => match shell.rm(&name)? {
            RemoveOutcome::Cancelled => output::warning("removal cancelled"),
            RemoveOutcome::Removed { nodes, files } => output::action(
                "Removed",
                &format!("{} ({} nodes, {} files)", name, nodes, files),
            ),
        },
        ShellCommand::Mov { name, destination } => shell.mov(&name, &destination)?,
        ShellCommand::Rename { old, new } => shell.rename(&old, &new)?,
        ShellCommand::Symlink { target, link } => {
            shell.symlink(&target, &link)?;
        }
        ShellCommand::SortBy(key) => shell.sort_by(key)?,
        ShellCommand::Merge { src, dest } => print_merge_report(&shell.merge(&src, &dest)?),
        ShellCommand::CountFiles => output::info(&shell.count_files()),
        ShellCommand::Save(path) => {
            shell.save(&path)?;
            output::action("Saved", &path.display());
        }
        ShellCommand::Load(path) => {
            shell.load(&path)?;
            output::action("Loaded", &path.display());
        }
        ShellCommand::Help => {
            output::header("Commands");
            output::info(HELP);
        }
        ShellCommand::Exit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

fn format_row(row: &EntryRow) -> String {
    let (marker, label) = match row.kind {
        NodeKind::Directory => ('d', row.label.blue().bold().to_string()),
        NodeKind::Symlink => ('l', row.label.cyan().to_string()),
        NodeKind::File => ('-', row.label.clone()),
    };
    format!("{} {:>8} {} {}", marker, row.size, row.modified, label)
}

fn print_merge_report(report: &MergeReport) {
    for name in &report.moved {
        output::diff_add(name);
    }
    for (old, new) in &report.renamed {
        output::diff_add(&format!("{} as {}", old, new));
    }
    for name in &report.overwritten {
        output::diff_add(&format!("{} (replaced)", name));
    }
    for name in &report.skipped {
        output::detail(&format!("skipped {}", name));
    }
    match &report.aborted_at {
        Some(name) => output::warning(&format!("merge stopped at '{}'", name)),
        None => output::success("merge complete"),
    }
}
