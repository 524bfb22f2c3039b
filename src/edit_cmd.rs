use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::{AppConfig, EditCli, resolve_editor, resolve_scratch_dir};
use crate::editor::{CommandEditor, Editor};
use crate::review::{Decision, Reviewer, TerminalReviewer};
use crate::scratch::ScratchFile;
use crate::store::{AzCliStore, SecretStore};
use crate::theme::Theme;

/// Result of one edit-review round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub value: String,
    pub changed: bool,
    /// The operator confirmed the change in review.
    pub committed: bool,
}

pub fn run(config: &AppConfig, cmd: EditCli) -> Result<()> {
    let scratch_dir = resolve_scratch_dir(config);
    let store = AzCliStore::new(&config.az_path, &cmd.vault, &scratch_dir);
    let editor = CommandEditor::new(resolve_editor(config, cmd.editor));
    let mut reviewer = TerminalReviewer::new(Theme::default());

    edit_secret(
        &store,
        &cmd.secret,
        &scratch_dir,
        &editor,
        &mut reviewer,
        &mut std::io::stdout(),
    )?;
    Ok(())
}

/// Edit the latest version of `name` and write it back if the operator confirms.
///
/// Returns whether a new value was written to the store.
pub fn edit_secret(
    store: &dyn SecretStore,
    name: &str,
    scratch_dir: &Path,
    editor: &CommandEditor,
    reviewer: &mut dyn Reviewer,
    out: &mut dyn Write,
) -> Result<bool> {
    edit_secret_with(store, name, scratch_dir, editor.command(), editor, reviewer, out)
}

fn edit_secret_with(
    store: &dyn SecretStore,
    name: &str,
    scratch_dir: &Path,
    editor_label: &str,
    editor: &dyn Editor,
    reviewer: &mut dyn Reviewer,
    out: &mut dyn Write,
) -> Result<bool> {
    let versions = store
        .list_versions(name)
        .context("failed to list secret versions")?;
    let latest = versions
        .first()
        .with_context(|| format!("no versions found for secret: {name}"))?;

    writeln!(out, "Editing secret '{name}' (version: {})", latest.short_id())?;
    writeln!(out, "Opening editor: {editor_label}\n")?;
    out.flush().ok();

    let outcome = edit_value(name, &latest.value, scratch_dir, editor, reviewer)?;
    if !outcome.changed {
        writeln!(out, "No changes detected. Secret not updated.")?;
        return Ok(false);
    }
    if !outcome.committed {
        writeln!(out, "Changes discarded.")?;
        return Ok(false);
    }

    store
        .set_value(name, &outcome.value)
        .context("failed to update secret")?;
    tracing::info!(secret = name, "secret updated");
    writeln!(out, "✓ Secret '{name}' updated successfully")?;
    Ok(true)
}

/// Hand `original` to the editor through a scratch file and review the result.
///
/// The scratch file is erased and removed before this returns, whatever the
/// outcome; if the editor leaves the value untouched no review is shown.
pub fn edit_value(
    secret_name: &str,
    original: &str,
    scratch_dir: &Path,
    editor: &dyn Editor,
    reviewer: &mut dyn Reviewer,
) -> Result<EditOutcome> {
    let scratch =
        ScratchFile::create(scratch_dir, original).context("failed to create temporary file")?;
    let res = edit_in_scratch(&scratch, secret_name, original, editor, reviewer);
    scratch.release_or_warn();
    res
}

fn edit_in_scratch(
    scratch: &ScratchFile,
    secret_name: &str,
    original: &str,
    editor: &dyn Editor,
    reviewer: &mut dyn Reviewer,
) -> Result<EditOutcome> {
    editor.edit(scratch.path()).context("failed to open editor")?;
    let edited = scratch
        .read_to_string()
        .context("failed to read edited file")?;
    tracing::debug!(
        before = scratch.size_at_creation(),
        after = edited.len(),
        "editor closed"
    );

    if edited == original {
        return Ok(EditOutcome {
            value: edited,
            changed: false,
            committed: false,
        });
    }

    let decision = reviewer.review(secret_name, original, &edited)?;
    Ok(EditOutcome {
        value: edited,
        changed: true,
        committed: decision == Decision::Confirmed,
    })
}
