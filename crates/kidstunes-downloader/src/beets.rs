// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `beet` as the optional tagging pass.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use kidstunes_core::{AdapterType, HealthStatus, KidsTunesError, PluginAdapter, TagTool};
use tracing::debug;

/// Settings for invoking `beet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeetsSettings {
    pub binary: String,
    /// Beets library database. Its directory is exported as `BEETSDIR`.
    pub library_path: PathBuf,
    /// Working directory for the subprocess.
    pub music_directory: PathBuf,
}

/// Runs `beet move --yes --quiet <file>` on each finished download.
#[derive(Debug, Clone)]
pub struct BeetsTagTool {
    settings: BeetsSettings,
}

impl BeetsTagTool {
    pub fn new(settings: BeetsSettings) -> Self {
        Self { settings }
    }

    /// Directory exported as `BEETSDIR`.
    pub fn beets_dir(&self) -> PathBuf {
        self.settings
            .library_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.settings.binary);
        command
            .env("BEETSDIR", self.beets_dir())
            .current_dir(&self.settings.music_directory)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

fn tagging_err(message: String, e: std::io::Error) -> KidsTunesError {
    KidsTunesError::Tagging {
        message,
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for BeetsTagTool {
    fn name(&self) -> &str {
        "beets"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Tagger
    }

    async fn health_check(&self) -> Result<HealthStatus, KidsTunesError> {
        let output = match self.command().arg("version").output().await {
            Ok(output) => output,
            Err(e) => {
                return Ok(HealthStatus::Unhealthy(format!(
                    "failed to run {}: {e}",
                    self.settings.binary
                )));
            }
        };
        if output.status.success() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(format!(
                "{} version exited with {}",
                self.settings.binary, output.status
            )))
        }
    }
}

#[async_trait]
impl TagTool for BeetsTagTool {
    async fn apply(&self, path: &Path) -> Result<(), KidsTunesError> {
        let output = self
            .command()
            .args(["move", "--yes", "--quiet"])
            .arg(path)
            .output()
            .await
            .map_err(|e| tagging_err(format!("failed to run {}: {e}", self.settings.binary), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KidsTunesError::tagging(format!(
                "{} move exited with {}: {}",
                self.settings.binary,
                output.status,
                stderr.trim()
            )));
        }

        debug!(path = %path.display(), "tagging pass complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tool(binary: &str, music_directory: &Path) -> BeetsTagTool {
        BeetsTagTool::new(BeetsSettings {
            binary: binary.to_string(),
            library_path: PathBuf::from("/var/lib/beets/library.db"),
            music_directory: music_directory.to_path_buf(),
        })
    }

    #[test]
    fn beets_dir_is_library_parent() {
        let dir = tempdir().unwrap();
        assert_eq!(
            tool("beet", dir.path()).beets_dir(),
            PathBuf::from("/var/lib/beets")
        );
    }

    #[tokio::test]
    async fn missing_binary_is_tagging_error() {
        let dir = tempdir().unwrap();
        let err = tool("/nonexistent/beet", dir.path())
            .apply(Path::new("/lib/a.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, KidsTunesError::Tagging { .. }));
        assert!(!err.is_fatal());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_tagging_error() {
        let dir = tempdir().unwrap();
        let err = tool("false", dir.path())
            .apply(Path::new("/lib/a.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, KidsTunesError::Tagging { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_exit_is_ok() {
        let dir = tempdir().unwrap();
        tool("true", dir.path())
            .apply(Path::new("/lib/a.mp3"))
            .await
            .unwrap();
    }
}
