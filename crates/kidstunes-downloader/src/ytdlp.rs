// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `yt-dlp` as the media index and fetch/encode tool.
//!
//! Search runs `--dump-single-json --flat-playlist` against a one-result search
//! prefix and reads the first entry. Fetch extracts audio to the requested
//! format, writes the metadata overrides through the metadata post-processor,
//! and prints the final file path once the file is in place. On cancellation
//! the child is killed and reaped before the fetch returns; it is also killed
//! if the fetch future is dropped.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use kidstunes_core::types::{FetchOutcome, FetchRequest, SearchHit};
use kidstunes_core::{
    AdapterType, HealthStatus, KidsTunesError, MediaFetcher, MediaSearch, PluginAdapter,
};
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Settings for invoking `yt-dlp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YtDlpSettings {
    pub binary: String,
    pub audio_quality: String,
    pub search_prefix: String,
}

impl Default for YtDlpSettings {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            audio_quality: "192".to_string(),
            search_prefix: "ytsearch1:".to_string(),
        }
    }
}

/// `yt-dlp` adapter implementing both [`MediaSearch`] and [`MediaFetcher`].
#[derive(Debug, Clone)]
pub struct YtDlp {
    settings: YtDlpSettings,
}

impl YtDlp {
    pub fn new(settings: YtDlpSettings) -> Self {
        Self { settings }
    }

    /// Arguments for a search invocation.
    pub fn search_args(&self, term: &str) -> Vec<String> {
        vec![
            "--dump-single-json".to_string(),
            "--flat-playlist".to_string(),
            "--no-warnings".to_string(),
            format!("{}{term}", self.settings.search_prefix),
        ]
    }

    /// Arguments for a fetch invocation.
    pub fn fetch_args(&self, request: &FetchRequest) -> Vec<String> {
        let metadata = &request.metadata;
        let ppa = format!(
            "Metadata:-metadata artist={} -metadata title={} -metadata album={}",
            shell_quote(&metadata.artist),
            shell_quote(&metadata.title),
            shell_quote(&metadata.album),
        );
        vec![
            "--format".to_string(),
            "bestaudio/best".to_string(),
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--no-simulate".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            request.target_format.clone(),
            "--audio-quality".to_string(),
            self.settings.audio_quality.clone(),
            "--embed-metadata".to_string(),
            "--postprocessor-args".to_string(),
            ppa,
            "--output".to_string(),
            request.output_template.display().to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            request.url.clone(),
        ]
    }

    async fn run(&self, args: &[String]) -> Result<String, KidsTunesError> {
        self.run_until(args, &CancellationToken::new()).await
    }

    /// Run the tool to completion, or kill it and wait for it to exit once
    /// `cancel` fires.
    async fn run_until(
        &self,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<String, KidsTunesError> {
        let binary = &self.settings.binary;
        let mut child = tokio::process::Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| KidsTunesError::Download {
                message: format!("failed to run {binary}: {e}"),
                source: Some(Box::new(e)),
            })?;
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        let (status, stdout, stderr) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    warn!(binary = %binary, error = %e, "failed to kill cancelled process");
                }
                return Err(KidsTunesError::Cancelled);
            }
            finished = async {
                let (out, err) = tokio::join!(read_pipe(stdout.take()), read_pipe(stderr.take()));
                (child.wait().await, out, err)
            } => finished,
        };

        let status = status.map_err(|e| KidsTunesError::Download {
            message: format!("failed to wait for {binary}: {e}"),
            source: Some(Box::new(e)),
        })?;
        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(KidsTunesError::download(format!(
                "{binary} exited with code {exit_code}: {}",
                last_line(&stderr).unwrap_or("no output")
            )));
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe
        && let Err(e) = pipe.read_to_end(&mut buf).await
    {
        debug!(error = %e, "stopped reading child output");
    }
    buf
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    entries: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Read the first hit from `--dump-single-json` output.
pub fn parse_search_output(stdout: &str) -> Result<Option<SearchHit>, KidsTunesError> {
    let result: SearchResult =
        serde_json::from_str(stdout.trim()).map_err(|e| KidsTunesError::Download {
            message: format!("unreadable search output: {e}"),
            source: Some(Box::new(e)),
        })?;

    let Some(entry) = result.entries.into_iter().next() else {
        return Ok(None);
    };
    let url = entry
        .webpage_url
        .or(entry.url)
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| KidsTunesError::download("search result has no url"))?;
    let title = entry.title.unwrap_or_else(|| url.clone());
    Ok(Some(SearchHit { url, title }))
}

/// Read the final path printed by `--print after_move:filepath`.
pub fn parse_fetch_output(stdout: &str) -> FetchOutcome {
    FetchOutcome {
        file_path: last_line(stdout).map(PathBuf::from),
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).last()
}

/// Quote `value` for the shell-style splitting `yt-dlp` applies to
/// post-processor arguments.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[async_trait]
impl PluginAdapter for YtDlp {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MediaSource
    }

    async fn health_check(&self) -> Result<HealthStatus, KidsTunesError> {
        match self.run(&["--version".to_string()]).await {
            Ok(version) => {
                debug!(version = %version.trim(), "yt-dlp available");
                Ok(HealthStatus::Healthy)
            }
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl MediaSearch for YtDlp {
    async fn search(&self, term: &str) -> Result<Option<SearchHit>, KidsTunesError> {
        let stdout = self.run(&self.search_args(term)).await?;
        parse_search_output(&stdout)
    }
}

#[async_trait]
impl MediaFetcher for YtDlp {
    async fn fetch(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, KidsTunesError> {
        debug!(url = %request.url, template = %request.output_template.display(), "fetching");
        let stdout = self.run_until(&self.fetch_args(request), cancel).await?;
        Ok(parse_fetch_output(&stdout))
    }
}
