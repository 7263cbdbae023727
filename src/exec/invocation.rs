// src/exec/invocation.rs

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::process::Command;

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// A program on `PATH` (or an explicit path) with arguments.
    Command { program: String, args: Vec<String> },
    /// An executable from the scripts directory, run with that directory as
    /// its working directory.
    Script { name: String, args: Vec<String> },
    /// A command line handed to the platform shell.
    Shell(String),
}

impl Invocation {
    /// Build a command from a whitespace-separated command line.
    pub fn command(line: &str) -> Self {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();
        Invocation::Command {
            program,
            args: parts.collect(),
        }
    }

    pub fn script<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::Script {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn shell(line: impl Into<String>) -> Self {
        Invocation::Shell(line.into())
    }

    /// The script or program name, without arguments.
    pub fn name(&self) -> &str {
        match self {
            Invocation::Command { program, .. } => program,
            Invocation::Script { name, .. } => name,
            Invocation::Shell(line) => line,
        }
    }

    /// Build the process command.
    ///
    /// Scripts are resolved to an absolute path inside `working_dir`, so the
    /// result does not depend on how the platform interprets relative program
    /// paths combined with `current_dir`.
    pub fn to_command(&self, working_dir: Option<&Path>) -> std::io::Result<Command> {
        let dir = working_dir.map(std::path::absolute).transpose()?;

        let mut cmd = match self {
            Invocation::Command { program, args } => {
                let mut c = Command::new(program);
                c.args(args);
                c
            }
            Invocation::Script { name, args } => {
                let dir = dir.as_deref().ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("script '{name}' needs a working directory"),
                    )
                })?;
                let mut c = Command::new(script_path(dir, name));
                c.args(args);
                c
            }
            Invocation::Shell(line) => {
                if cfg!(windows) {
                    let mut c = Command::new("cmd");
                    c.arg("/C").arg(line);
                    c
                } else {
                    let mut c = Command::new("sh");
                    c.arg("-c").arg(line);
                    c
                }
            }
        };

        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        Ok(cmd)
    }
}

fn script_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (head, args) = match self {
            Invocation::Command { program, args } => (program, args.as_slice()),
            Invocation::Script { name, args } => (name, args.as_slice()),
            Invocation::Shell(line) => return f.write_str(line),
        };
        f.write_str(head)?;
        for arg in args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
