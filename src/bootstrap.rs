//! bootstrap.rs
//!
//! Provisions the per-language working copies that file backends read
//! from. Every configured version lives at `<root>/<version key>`, with
//! `~/.bible` as the default root. A missing copy is created with
//!
//! ```text
//! git clone --depth 1 <source> <root>/<key>
//! git checkout <version>
//! ```
//!
//! and an existing one is used as is. Versions are installed one after
//! another and the first failure aborts the whole bootstrap.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::config::{BibleConfig, VersionConfig};
use crate::error::BootstrapError;

/// One version available on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub key: String,
    pub version: VersionConfig,
    pub path: PathBuf,
}

/// Installed versions by lower-cased language tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Languages {
    by_language: BTreeMap<String, InstalledVersion>,
}

impl Languages {
    pub fn get(&self, language: &str) -> Option<&InstalledVersion> {
        self.by_language.get(&language.to_lowercase())
    }

    pub fn insert(&mut self, installed: InstalledVersion) {
        self.by_language
            .insert(installed.version.language.to_lowercase(), installed);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InstalledVersion)> {
        self.by_language.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.by_language.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_language.is_empty()
    }
}

/// `~/.bible`
pub fn default_root() -> Result<PathBuf, BootstrapError> {
    dirs::home_dir()
        .map(|home| home.join(".bible"))
        .ok_or(BootstrapError::HomeDirectory)
}

/// Installs every configured version under [`default_root`].
pub async fn init(config: &BibleConfig) -> Result<Languages, BootstrapError> {
    init_at(config, &default_root()?).await
}

/// Installs every configured version under `root`.
pub async fn init_at(config: &BibleConfig, root: &Path) -> Result<Languages, BootstrapError> {
    if config.versions.is_empty() {
        return Err(BootstrapError::NoVersions);
    }

    tokio::fs::create_dir_all(root)
        .await
        .map_err(|source| io_error(root, source))?;

    let mut languages = Languages::default();
    for (key, version) in &config.versions {
        let path = root.join(key);
        install(version, &path).await?;
        languages.insert(InstalledVersion {
            key: key.clone(),
            version: version.clone(),
            path,
        });
    }
    Ok(languages)
}

fn io_error(path: &Path, source: std::io::Error) -> BootstrapError {
    BootstrapError::Io {
        path: path.display().to_string(),
        source,
    }
}

async fn install(version: &VersionConfig, path: &Path) -> Result<(), BootstrapError> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|source| io_error(path, source))?;
    if exists {
        tracing::debug!(path = %path.display(), "version already installed");
        return Ok(());
    }

    tracing::info!(source = %version.source, version = %version.version, path = %path.display(), "installing version");
    let dir = path.display().to_string();
    let result = async {
        git(&["clone", "--depth", "1", version.source.as_str(), dir.as_str()], None).await?;
        git(&["checkout", version.version.as_str()], Some(path)).await
    }
    .await;

    // A half-made copy would otherwise be taken as installed next time.
    if result.is_err() && tokio::fs::try_exists(path).await.unwrap_or(false) {
        if let Err(err) = tokio::fs::remove_dir_all(path).await {
            tracing::warn!(path = %path.display(), error = %err, "cannot remove partial install");
        }
    }
    result
}

async fn git(args: &[&str], cwd: Option<&Path>) -> Result<(), BootstrapError> {
    let mut command = Command::new("git");
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let printable = format!("git {}", args.join(" "));
    let output = command
        .output()
        .await
        .map_err(|source| io_error(cwd.unwrap_or(Path::new(".")), source))?;
    if !output.status.success() {
        return Err(BootstrapError::Git {
            command: printable,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
