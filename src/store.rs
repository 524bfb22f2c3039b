//! Secret versions and the remote store that holds them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::scratch::ScratchFile;

const SHORT_ID_LEN: usize = 8;

/// One historical version of a secret. Read-only input to the sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Version {
    pub id: String,
    pub value: String,
    pub enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub tags: BTreeMap<String, String>,
}

impl Version {
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(SHORT_ID_LEN) {
            Some((i, _)) => &self.id[..i],
            None => &self.id,
        }
    }
}

/// Newest `created_at` first; versions without a timestamp go last, in their original order.
pub fn sort_newest_first(versions: &mut [Version]) {
    versions.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

pub trait SecretStore {
    /// All versions of `name`, newest first.
    fn list_versions(&self, name: &str) -> Result<Vec<Version>>;
    /// Write `value` as a new version of `name`.
    fn set_value(&self, name: &str, value: &str) -> Result<()>;
}

/// Azure Key Vault through the `az` command line client.
///
/// Credentials are whatever `az login` has established.
#[derive(Debug, Clone)]
pub struct AzCliStore {
    program: String,
    vault: String,
    scratch_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct AzSecretItem {
    id: Option<String>,
    #[serde(default)]
    attributes: Option<AzAttributes>,
    #[serde(default)]
    tags: Option<BTreeMap<String, Option<String>>>,
}

#[derive(Debug, Default, Deserialize)]
struct AzAttributes {
    enabled: Option<bool>,
    created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
    expires: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct AzSecretValue {
    value: Option<String>,
}

impl AzCliStore {
    pub fn new(
        program: impl Into<String>,
        vault: impl Into<String>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            vault: vault.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    fn az(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = Command::new(&self.program)
            .args(args)
            .args(["--vault-name", self.vault.as_str()])
            .stdin(Stdio::null())
            .output()
            .map_err(|err| Error::remote(format!("run {}: {err}", self.program)))?;
        check_output(&self.program, args, output)
    }

    fn fetch_value(&self, name: &str, version: &str) -> Result<String> {
        let out = self.az(&[
            "keyvault", "secret", "show", "--name", name, "--version", version, "-o", "json",
        ])?;
        let parsed: AzSecretValue = serde_json::from_slice(&out)
            .map_err(|err| Error::remote(format!("parse secret value: {err}")))?;
        Ok(parsed.value.unwrap_or_default())
    }

    fn stage_value(&self, value: &str) -> Result<ScratchFile> {
        ScratchFile::create(&self.scratch_dir, value)
    }
}

impl SecretStore for AzCliStore {
    fn list_versions(&self, name: &str) -> Result<Vec<Version>> {
        let out = self.az(&[
            "keyvault", "secret", "list-versions", "--name", name, "-o", "json",
        ])?;
        let items: Vec<AzSecretItem> = serde_json::from_slice(&out)
            .map_err(|err| Error::remote(format!("parse secret versions: {err}")))?;

        let mut versions = Vec::with_capacity(items.len());
        for item in items {
            let Some(mut version) = version_from_item(item) else {
                continue;
            };
            version.value = match self.fetch_value(name, &version.id) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(
                        version = %version.short_id(),
                        error = %err,
                        "failed to fetch secret value"
                    );
                    format!("Error fetching value: {err}")
                }
            };
            versions.push(version);
        }

        sort_newest_first(&mut versions);
        tracing::debug!(count = versions.len(), "listed secret versions");
        Ok(versions)
    }

    fn set_value(&self, name: &str, value: &str) -> Result<()> {
        // Passed by file so the value never shows up in a process listing.
        let staged = self.stage_value(value)?;
        let path = path_arg(staged.path())?;
        let res = self.az(&[
            "keyvault",
            "secret",
            "set",
            "--name",
            name,
            "--file",
            &path,
            "--encoding",
            "utf-8",
            "-o",
            "none",
        ]);
        staged.release_or_warn();
        res.map(|_| ())
    }
}

fn path_arg(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| {
            Error::remote(format!("scratch path is not valid UTF-8: {}", path.display()))
        })
}

fn check_output(program: &str, args: &[&str], output: Output) -> Result<Vec<u8>> {
    if output.status.success() {
        return Ok(output.stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    Err(Error::remote(format!(
        "{program} {} failed ({}): {detail}",
        args.iter().take(3).copied().collect::<Vec<_>>().join(" "),
        output.status
    )))
}

/// Identifiers look like `https://<vault>.vault.azure.net/secrets/<name>/<version>`.
fn version_from_item(item: AzSecretItem) -> Option<Version> {
    let id = item.id?;
    let (_, rest) = id.split_once("/secrets/")?;
    let version = rest.split('/').nth(1).filter(|v| !v.is_empty())?.to_string();
    let attributes = item.attributes.unwrap_or_default();
    let tags = item
        .tags
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect();
    Some(Version {
        id: version,
        value: String::new(),
        enabled: attributes.enabled.unwrap_or(false),
        created_at: attributes.created,
        updated_at: attributes.updated,
        expires_at: attributes.expires,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> Option<DateTime<Utc>> {
        Some(Utc.timestamp_opt(secs, 0).unwrap())
    }

    fn v(id: &str, created_at: Option<DateTime<Utc>>) -> Version {
        Version {
            id: id.to_string(),
            created_at,
            ..Version::default()
        }
    }

    #[test]
    fn sorts_newest_first_with_untimed_last_and_stable() {
        let mut versions = vec![
            v("none-1", None),
            v("old", at(100)),
            v("none-2", None),
            v("new", at(300)),
            v("mid", at(200)),
        ];
        sort_newest_first(&mut versions);
        let ids: Vec<&str> = versions.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old", "none-1", "none-2"]);
    }

    #[test]
    fn short_id_truncates_to_eight_chars() {
        assert_eq!(v("0123456789abcdef", None).short_id(), "01234567");
        assert_eq!(v("abc", None).short_id(), "abc");
    }

    #[test]
    fn parses_az_list_versions_output() {
        let json = r#"[
          {
            "attributes": {
              "created": "2024-03-01T10:00:00+00:00",
              "enabled": true,
              "expires": null,
              "notBefore": null,
              "recoveryLevel": "Recoverable+Purgeable",
              "updated": "2024-03-02T10:00:00+00:00"
            },
            "contentType": null,
            "id": "https://myvault.vault.azure.net/secrets/db-password/4387e9f3d6e14c459867679a90fd0f79",
            "managed": null,
            "name": "db-password",
            "tags": {"env": "prod", "owner": null}
          },
          {
            "attributes": {"enabled": false},
            "id": "https://myvault.vault.azure.net/secrets/db-password/",
            "tags": null
          },
          {"id": null}
        ]"#;
        let items: Vec<AzSecretItem> = serde_json::from_str(json).unwrap();
        let versions: Vec<Version> = items.into_iter().filter_map(version_from_item).collect();

        assert_eq!(versions.len(), 1);
        let first = &versions[0];
        assert_eq!(first.id, "4387e9f3d6e14c459867679a90fd0f79");
        assert!(first.enabled);
        assert_eq!(
            first.created_at.unwrap().to_rfc3339(),
            "2024-03-01T10:00:00+00:00"
        );
        assert!(first.expires_at.is_none());
        assert_eq!(first.tags.get("env").map(String::as_str), Some("prod"));
        assert!(!first.tags.contains_key("owner"));
    }

    #[test]
    fn missing_attributes_mean_disabled() {
        let item: AzSecretItem = serde_json::from_str(
            r#"{"id": "https://myvault.vault.azure.net/secrets/db-password/abc123"}"#,
        )
        .unwrap();
        let version = version_from_item(item).expect("version");
        assert_eq!(version.id, "abc123");
        assert!(!version.enabled);
        assert!(version.created_at.is_none());
    }

    #[test]
    fn failed_command_is_a_remote_error() {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            let output = Output {
                status: std::process::ExitStatus::from_raw(1 << 8),
                stdout: Vec::new(),
                stderr: b"\nERROR: (SecretNotFound) A secret with (name/id) nope was not found\n".to_vec(),
            };
            let err =
                check_output("az", &["keyvault", "secret", "list-versions"], output).unwrap_err();
            let msg = err.to_string();
            assert!(matches!(err, Error::Remote(_)));
            assert!(msg.contains("az keyvault secret list-versions failed"));
            assert!(msg.contains("SecretNotFound"));
        }
    }
}
