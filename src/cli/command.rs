//! Shell command line parsing

use std::path::PathBuf;

use crate::cli::{CliError, CliResult};
use crate::domain::SortKey;

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Mkdir(String),
    Touch(String),
    Ls,
    Tree,
    Edit { name: String, text: Option<String> },
    Cat(String),
    Cd(String),
    CdUp,
    Pwd,
    Rm(String),
    Mov { name: String, destination: String },
    Rename { old: String, new: String },
    Symlink { target: String, link: String },
    SortBy(SortKey),
    Merge { src: String, dest: String },
    CountFiles,
    Save(PathBuf),
    Load(PathBuf),
    Help,
    Exit,
}

pub const HELP: &str = "\
mkdir NAME            create a directory
touch NAME            create an empty file
ls                    list the current directory
tree                  show the current directory recursively (alias: lsrecursive)
edit NAME [TEXT...]   replace a file's content
cat NAME              print a file's content
cd NAME               enter a directory (.. for parent, / for root)
cdup                  go to the parent directory
pwd                   print the current path (alias: fullpath)
rm NAME               remove an entry and everything below it
mov NAME DEST         move an entry into the sibling directory DEST
rename OLD NEW        rename an entry
symlink TARGET LINK   create LINK pointing at TARGET
sortBy name|date      reorder the current directory
merge SRC DEST        move everything in SRC into DEST
countFiles            count all files in the tree
save FILE             write a snapshot
load FILE             replace the tree with a snapshot
help                  show this text
exit                  leave the shell";

/// Split off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

fn usage(text: &str) -> CliError {
    CliError::Usage(format!("usage: {}", text))
}

fn args<const N: usize>(rest: &str, text: &str) -> CliResult<[String; N]> {
    let words: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
    words.try_into().map_err(|_| usage(text))
}

impl ShellCommand {
    /// Parse one line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> CliResult<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (word, rest) = split_word(line);

        let command = match word {
            "mkdir" => {
                let [name] = args(rest, "mkdir NAME")?;
                Self::Mkdir(name)
            }
            "touch" => {
                let [name] = args(rest, "touch NAME")?;
                Self::Touch(name)
            }
            "ls" => {
                args::<0>(rest, "ls")?;
                Self::Ls
            }
            "tree" | "lsrecursive" => {
                args::<0>(rest, "tree")?;
                Self::Tree
            }
            "edit" => {
                let (name, text) = split_word(rest);
                if name.is_empty() {
                    return Err(usage("edit NAME [TEXT...]"));
                }
                Self::Edit {
                    name: name.to_string(),
                    text: (!text.is_empty()).then(|| text.to_string()),
                }
            }
            "cat" => {
                let [name] = args(rest, "cat NAME")?;
                Self::Cat(name)
            }
            "cd" => {
                let [name] = args(rest, "cd NAME")?;
                if name == ".." {
                    Self::CdUp
                } else {
                    Self::Cd(name)
                }
            }
            "cdup" => {
                args::<0>(rest, "cdup")?;
                Self::CdUp
            }
            "pwd" | "fullpath" => {
                args::<0>(rest, "pwd")?;
                Self::Pwd
            }
            "rm" => {
                let [name] = args(rest, "rm NAME")?;
                Self::Rm(name)
            }
            "mov" | "mv" => {
                let [name, destination] = args(rest, "mov NAME DEST")?;
                Self::Mov { name, destination }
            }
            "rename" => {
                let [old, new] = args(rest, "rename OLD NEW")?;
                Self::Rename { old, new }
            }
            "symlink" => {
                let [target, link] = args(rest, "symlink TARGET LINK")?;
                Self::Symlink { target, link }
            }
            "sortBy" => {
                let [criterion] = args(rest, "sortBy name|date")?;
                let key = SortKey::parse(&criterion).ok_or_else(|| {
                    CliError::InvalidArgs(format!("unknown sort criterion: {}", criterion))
                })?;
                Self::SortBy(key)
            }
            "merge" => {
                let [src, dest] = args(rest, "merge SRC DEST")?;
                Self::Merge { src, dest }
            }
            "countFiles" => {
                args::<0>(rest, "countFiles")?;
                Self::CountFiles
            }
            "save" => {
                let [file] = args(rest, "save FILE")?;
                Self::Save(PathBuf::from(file))
            }
            "load" => {
                let [file] = args(rest, "load FILE")?;
                Self::Load(PathBuf::from(file))
            }
            "help" => Self::Help,
            "exit" | "quit" => Self::Exit,
            other => return Err(CliError::Usage(format!("unknown command: {}", other))),
        };
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mkdir docs", ShellCommand::Mkdir("docs".into()))]
    #[case("  touch a.txt  ", ShellCommand::Touch("a.txt".into()))]
    #[case("lsrecursive", ShellCommand::Tree)]
    #[case("cd ..", ShellCommand::CdUp)]
    #[case("fullpath", ShellCommand::Pwd)]
    #[case("mov a.txt archive", ShellCommand::Mov { name: "a.txt".into(), destination: "archive".into() })]
    #[case("symlink a.txt latest", ShellCommand::Symlink { target: "a.txt".into(), link: "latest".into() })]
    #[case("sortBy date", ShellCommand::SortBy(SortKey::ModifiedTime))]
    #[case("countFiles", ShellCommand::CountFiles)]
    #[case("save /tmp/snap.txt", ShellCommand::Save(PathBuf::from("/tmp/snap.txt")))]
    fn test_parse_commands(#[case] line: &str, #[case] expected: ShellCommand) {
        assert_eq!(ShellCommand::parse(line).unwrap(), Some(expected));
    }

    #[test]
    fn given_edit_with_text_when_parsing_then_keeps_inner_spacing() {
        let cmd = ShellCommand::parse("edit a.txt hello   world").unwrap();
        assert_eq!(
            cmd,
            Some(ShellCommand::Edit {
                name: "a.txt".into(),
                text: Some("hello   world".into())
            })
        );
    }

    #[test]
    fn given_edit_without_text_when_parsing_then_text_is_none() {
        let cmd = ShellCommand::parse("edit a.txt").unwrap();
        assert_eq!(
            cmd,
            Some(ShellCommand::Edit {
                name: "a.txt".into(),
                text: None
            })
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("# comment")]
    fn given_blank_or_comment_when_parsing_then_none(#[case] line: &str) {
        assert_eq!(ShellCommand::parse(line).unwrap(), None);
    }

    #[rstest]
    #[case("mkdir")]
    #[case("mkdir a b")]
    #[case("mov a")]
    #[case("ls extra")]
    #[case("frobnicate")]
    fn given_bad_arity_or_unknown_when_parsing_then_usage_error(#[case] line: &str) {
        assert!(matches!(
            ShellCommand::parse(line),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn given_unknown_sort_criterion_when_parsing_then_invalid_args() {
        assert!(matches!(
            ShellCommand::parse("sortBy size"),
            Err(CliError::InvalidArgs(_))
        ));
    }
}
