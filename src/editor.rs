use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};
use crate::signals::ForegroundChild;

/// Something that lets the operator change the contents of a file in place.
pub trait Editor {
    fn edit(&self, path: &Path) -> Result<()>;
}

/// Runs an external editor command attached to the current terminal.
#[derive(Debug, Clone)]
pub struct CommandEditor {
    command: String,
}

impl CommandEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Editor for CommandEditor {
    fn edit(&self, path: &Path) -> Result<()> {
        let launch_error = |reason: String| Error::EditorLaunch {
            command: self.command.clone(),
            reason,
        };

        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| launch_error("is empty".to_string()))?;
        let mut cmd = Command::new(program);
        cmd.args(parts)
            .arg(path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        tracing::debug!(program, "launching editor");
        let status = {
            // The editor shares our process group and handles Ctrl+C itself.
            let _foreground = ForegroundChild::enter();
            cmd.status()
        }
        .map_err(|err| launch_error(format!("could not be started: {err}")))?;
        if !status.success() {
            return Err(launch_error(format!("exited with {status}")));
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn successful_command_edits_file() {
        let td = tempfile::tempdir().expect("tempdir");
        let path = td.path().join("value.txt");
        std::fs::write(&path, "old").unwrap();

        // `cp <src> <path>` stands in for an editor that rewrites the file.
        let src = td.path().join("replacement.txt");
        std::fs::write(&src, "new").unwrap();
        let editor = CommandEditor::new(format!("cp {}", src.display()));

        editor.edit(&path).expect("edit");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn non_zero_exit_is_a_launch_error() {
        let td = tempfile::tempdir().expect("tempdir");
        let err = CommandEditor::new("false").edit(&td.path().join("x")).unwrap_err();
        match err {
            Error::EditorLaunch { command, reason } => {
                assert_eq!(command, "false");
                assert!(reason.starts_with("exited with"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let td = tempfile::tempdir().expect("tempdir");
        let err = CommandEditor::new("kv-definitely-not-an-editor")
            .edit(&td.path().join("x"))
            .unwrap_err();
        assert!(matches!(err, Error::EditorLaunch { .. }));
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = CommandEditor::new("   ").edit(Path::new("x")).unwrap_err();
        assert!(err.to_string().contains("is empty"));
    }
}
