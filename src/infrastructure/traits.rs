//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;

use crate::domain::ConflictResolution;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read raw file contents. Decoding is left to the caller.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Decisions that need a human: removal confirmation, name conflicts and
/// free-form input such as new file content.
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&self, prompt: &str) -> bool;

    /// Ask how to resolve a name collision on `name`.
    /// Returns None for an answer that is not one of the offered options.
    fn resolve_conflict(&self, name: &str) -> Option<ConflictResolution>;

    /// Read one line of input. None on end of input.
    fn read_line(&self, prompt: &str) -> Option<String>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Prompter reading answers from stdin.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn ask(&self, prompt: &str) -> Option<String> {
        print!("{} ", prompt.cyan());
        io::stdout().flush().ok();
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(answer.trim_end_matches(['\n', '\r']).to_string()),
        }
    }
}

/// Map a menu answer to the conflict option it names.
pub fn parse_conflict_choice(answer: &str) -> Option<ConflictChoice> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "1" | "s" | "skip" => Some(ConflictChoice::Skip),
        "2" | "r" | "rename" => Some(ConflictChoice::Rename),
        "3" | "o" | "overwrite" => Some(ConflictChoice::Overwrite),
        _ => None,
    }
}

/// Menu entry of the conflict prompt, before a new name is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    Skip,
    Rename,
    Overwrite,
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str) -> bool {
        self.ask(&format!("{} (y/n)", prompt))
            .is_some_and(|a| matches!(a.trim(), "y" | "Y" | "yes"))
    }

    fn resolve_conflict(&self, name: &str) -> Option<ConflictResolution> {
        println!(
            "{}: {} already exists. Choose an option:",
            "Conflict detected".yellow(),
            name
        );
        println!("1. Skip\n2. Rename\n3. Overwrite");
        match parse_conflict_choice(&self.ask(">")?)? {
            ConflictChoice::Skip => Some(ConflictResolution::Skip),
            ConflictChoice::Overwrite => Some(ConflictResolution::Overwrite),
            ConflictChoice::Rename => {
                let new_name = self.ask(&format!("Enter a new name for {}:", name))?;
                let new_name = new_name.trim();
                if new_name.is_empty() {
                    None
                } else {
                    Some(ConflictResolution::Rename(new_name.to_string()))
                }
            }
        }
    }

    fn read_line(&self, prompt: &str) -> Option<String> {
        self.ask(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", Some(ConflictChoice::Skip))]
    #[case(" skip ", Some(ConflictChoice::Skip))]
    #[case("2", Some(ConflictChoice::Rename))]
    #[case("R", Some(ConflictChoice::Rename))]
    #[case("3", Some(ConflictChoice::Overwrite))]
    #[case("overwrite", Some(ConflictChoice::Overwrite))]
    #[case("4", None)]
    #[case("", None)]
    fn test_parse_conflict_choice(#[case] answer: &str, #[case] expected: Option<ConflictChoice>) {
        assert_eq!(parse_conflict_choice(answer), expected);
    }

    #[test]
    fn given_nested_target_when_ensure_parent_then_creates_directories() {
        let temp = tempfile::TempDir::new().unwrap();
        let target = temp.path().join("a").join("b").join("snapshot.txt");
        RealFileSystem.ensure_parent(&target).unwrap();
        assert!(target.parent().unwrap().is_dir());
    }
}
