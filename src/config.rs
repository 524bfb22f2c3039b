use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use confique::Config as _;
use confique::Layer as _;

const FALLBACK_EDITOR: &str = "vim";

#[derive(confique::Config, Debug, Clone)]
pub struct AppConfig {
    /// Editor command for `kv edit`; `$VISUAL`/`$EDITOR` are consulted when unset.
    #[config(env = "KV_EDITOR")]
    pub editor: Option<String>,
    /// Azure CLI executable.
    #[config(default = "az", env = "KV_AZ_PATH")]
    pub az_path: String,
    /// Where plaintext scratch files are created (default: the system temp dir).
    #[config(env = "KV_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,
}

#[derive(Parser)]
#[command(
    name = "kv",
    version,
    about = "Azure Key Vault CLI tool",
    long_about = "A CLI tool to browse and manage Azure Key Vault secrets with a terminal UI."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Optional path to a config file to load in addition to the standard locations.
    #[arg(long = "config-file", global = true)]
    pub config_file: Option<PathBuf>,

    /// Azure CLI executable (default: `az` from PATH).
    #[arg(long = "az-path", global = true)]
    pub az_path: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Browse secret versions in an interactive viewer.
    Show(ShowCli),
    /// Edit the latest version of a secret in your editor.
    Edit(EditCli),
}

#[derive(Args, Debug, Clone)]
pub struct ShowCli {
    /// Key Vault name (the `<name>` in https://<name>.vault.azure.net).
    pub vault: String,
    /// Secret name.
    pub secret: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditCli {
    /// Key Vault name (the `<name>` in https://<name>.vault.azure.net).
    pub vault: String,
    /// Secret name.
    pub secret: String,
    /// Editor to use (default: $VISUAL, $EDITOR or vim).
    #[arg(long = "editor", short = 'e')]
    pub editor: Option<String>,
}

pub fn load_config(global: &GlobalArgs) -> Result<AppConfig> {
    let mut cli_layer = <AppConfig as confique::Config>::Layer::empty();
    cli_layer.az_path = global.az_path.clone();

    let mut builder = AppConfig::builder().preloaded(cli_layer).env();
    if let Some(path) = &global.config_file {
        builder = builder.file(path);
    }

    if let Ok(cwd) = std::env::current_dir() {
        let local_root = cwd.join(".config");
        builder = add_if_exists(builder, local_root.join("kv.toml"));
        builder = add_if_exists(builder, local_root.join("kv").join("config.toml"));
    }

    if let Some(dir) = dirs::config_dir() {
        builder = add_if_exists(builder, dir.join("kv").join("config.toml"));
    }

    builder.load().context("load kv config")
}

fn add_if_exists(
    mut builder: confique::Builder<AppConfig>,
    path: impl AsRef<Path>,
) -> confique::Builder<AppConfig> {
    let path = path.as_ref();
    if path.exists() {
        builder = builder.file(path);
    }
    builder
}

/// `--editor`, then the config file, then `$VISUAL`, `$EDITOR`, and finally `vim`.
pub fn resolve_editor(config: &AppConfig, cli_editor: Option<String>) -> String {
    resolve_editor_with(config, cli_editor, |key| std::env::var(key).ok())
}

fn resolve_editor_with(
    config: &AppConfig,
    cli_editor: Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> String {
    cli_editor
        .and_then(non_blank)
        .or_else(|| config.editor.clone().and_then(non_blank))
        .or_else(|| env("VISUAL").and_then(non_blank))
        .or_else(|| env("EDITOR").and_then(non_blank))
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

fn non_blank(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

pub fn resolve_scratch_dir(config: &AppConfig) -> PathBuf {
    config
        .scratch_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(editor: Option<&str>) -> AppConfig {
        AppConfig {
            editor: editor.map(str::to_string),
            az_path: "az".to_string(),
            scratch_dir: None,
        }
    }

    #[test]
    fn editor_precedence() {
        let env = |key: &str| match key {
            "VISUAL" => Some("code --wait".to_string()),
            "EDITOR" => Some("nano".to_string()),
            _ => None,
        };
        assert_eq!(
            resolve_editor_with(&config(Some("hx")), Some("emacs".to_string()), env),
            "emacs"
        );
        assert_eq!(resolve_editor_with(&config(Some("hx")), None, env), "hx");
        assert_eq!(resolve_editor_with(&config(None), None, env), "code --wait");
        let editor_only = |k: &str| (k == "EDITOR").then(|| "nano".to_string());
        assert_eq!(resolve_editor_with(&config(None), None, editor_only), "nano");
        assert_eq!(resolve_editor_with(&config(None), None, |_| None), "vim");
    }

    #[test]
    fn blank_editor_falls_back() {
        assert_eq!(
            resolve_editor_with(&config(None), Some("  ".to_string()), |_| None),
            "vim"
        );
    }

    #[test]
    fn blank_sources_fall_through_to_the_next() {
        assert_eq!(
            resolve_editor_with(&config(Some("hx")), Some(String::new()), |_| None),
            "hx"
        );
        let visual_only = |k: &str| (k == "VISUAL").then(|| "code --wait".to_string());
        assert_eq!(
            resolve_editor_with(&config(Some(" ")), None, visual_only),
            "code --wait"
        );
        let env = |key: &str| match key {
            "VISUAL" => Some(String::new()),
            "EDITOR" => Some("nano".to_string()),
            _ => None,
        };
        assert_eq!(resolve_editor_with(&config(None), None, env), "nano");
    }

    #[test]
    fn scratch_dir_defaults_to_temp_dir() {
        assert_eq!(resolve_scratch_dir(&config(None)), std::env::temp_dir());
        let mut c = config(None);
        c.scratch_dir = Some(PathBuf::from("/dev/shm"));
        assert_eq!(resolve_scratch_dir(&c), PathBuf::from("/dev/shm"));
    }

    #[test]
    fn parses_subcommands() {
        let cli =
            Cli::try_parse_from(["kv", "edit", "myvault", "db-password", "-e", "nano"]).unwrap();
        match cli.command {
            Command::Edit(cmd) => {
                assert_eq!(cmd.vault, "myvault");
                assert_eq!(cmd.secret, "db-password");
                assert_eq!(cmd.editor.as_deref(), Some("nano"));
            }
            Command::Show(_) => panic!("expected edit"),
        }

        let cli = Cli::try_parse_from([
            "kv",
            "show",
            "myvault",
            "db-password",
            "--config-file",
            "/tmp/kv.toml",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Show(_)));
        assert_eq!(cli.global.config_file, Some(PathBuf::from("/tmp/kv.toml")));

        assert!(Cli::try_parse_from(["kv", "show", "only-vault"]).is_err());
    }

    #[test]
    fn loads_explicit_config_file() {
        let td = tempfile::tempdir().expect("tempdir");
        let path = td.path().join("kv.toml");
        std::fs::write(&path, "editor = \"hx\"\naz_path = \"/opt/az/bin/az\"\n").unwrap();

        let mut global = GlobalArgs {
            config_file: Some(path),
            az_path: None,
        };
        let config = load_config(&global).expect("load config");
        assert_eq!(config.az_path, "/opt/az/bin/az");
        assert_eq!(config.editor.as_deref(), Some("hx"));

        global.az_path = Some("/usr/local/bin/az".to_string());
        let config = load_config(&global).expect("load config");
        assert_eq!(config.az_path, "/usr/local/bin/az");
    }
}
