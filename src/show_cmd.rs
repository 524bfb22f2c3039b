use anyhow::{Context, Result};

use crate::browse::BrowseSession;
use crate::config::{AppConfig, ShowCli, resolve_scratch_dir};
use crate::store::{AzCliStore, SecretStore, Version};
use crate::theme::Theme;
use crate::ui::Ui;

pub fn run(config: &AppConfig, cmd: ShowCli) -> Result<()> {
    let store = AzCliStore::new(&config.az_path, &cmd.vault, resolve_scratch_dir(config));
    let versions = store
        .list_versions(&cmd.secret)
        .context("failed to list secret versions")?;

    if versions.is_empty() {
        println!("No versions found for this secret.");
        return Ok(());
    }

    browse(&cmd.secret, versions, &Theme::default())
}

/// Page through `versions` (newest first) until the operator quits.
pub fn browse(secret_name: &str, versions: Vec<Version>, theme: &Theme) -> Result<()> {
    let mut ui = Ui::new()?;
    let res = BrowseSession::new(secret_name, versions).run(&mut ui, theme);
    ui.restore().ok();
    res.context("TUI error")
}
