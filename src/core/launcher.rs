//! Download launchers - hand a built `/download` URL to something that transfers it

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use chrono::Local;
use colored::Colorize;
use regex::Regex;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::error::{Result, StreamSaverError};
use crate::types::DownloadRequest;
use crate::utils::paths::ensure_dir;

const MAX_DUPLICATE_SUFFIX: usize = 1000;

static FILENAME_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)filename\*=UTF-8''([^;]+)").expect("Invalid regex"));
static FILENAME_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename="?([^";]+)"?"#).expect("Invalid regex"));

/// What the caller can observe about a started download
#[derive(Debug)]
pub enum DownloadTicket {
    /// Fire-and-forget: no completion signal
    Detached,
    /// Resolves once the transfer has finished, successfully or not
    Tracked(oneshot::Receiver<()>),
}

pub trait DownloadLauncher: Send + Sync {
    fn launch(&self, request: &DownloadRequest) -> Result<DownloadTicket>;
}

/// Opens the download URL with the system handler, like a browser navigation
#[derive(Debug, Default)]
pub struct BrowserLauncher;

impl BrowserLauncher {
    pub fn new() -> Self {
        Self
    }

    fn opener() -> (&'static str, &'static [&'static str]) {
        if cfg!(target_os = "macos") {
            ("open", &[])
        } else if cfg!(target_os = "windows") {
            ("cmd", &["/C", "start", ""])
        } else {
            ("xdg-open", &[])
        }
    }
}

impl DownloadLauncher for BrowserLauncher {
    fn launch(&self, request: &DownloadRequest) -> Result<DownloadTicket> {
        let (program, args) = Self::opener();
        Command::new(program)
            .args(args)
            .arg(&request.url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| StreamSaverError::Launch(format!("Failed to start {}: {}", program, e)))?;

        info!(format = %request.format_id, "download handed to {}", program);
        Ok(DownloadTicket::Detached)
    }
}

/// Streams the download into a directory in a background task
#[derive(Debug, Clone)]
pub struct FileLauncher {
    client: reqwest::Client,
    output_dir: PathBuf,
}

impl FileLauncher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            output_dir: output_dir.into(),
        }
    }
}

impl DownloadLauncher for FileLauncher {
    fn launch(&self, request: &DownloadRequest) -> Result<DownloadTicket> {
        let (done_tx, done_rx) = oneshot::channel();
        let client = self.client.clone();
        let output_dir = self.output_dir.clone();
        let request = request.clone();

        tokio::spawn(async move {
            match save_download(&client, &request, &output_dir).await {
                Ok(path) => {
                    info!(path = %path.display(), "download saved");
                    println!("{} {}", "✓ Saved".green(), path.display());
                }
                Err(e) => {
                    error!(error = %e, format = %request.format_id, "download failed");
                    eprintln!("{} {}", "Download failed:".red(), e);
                }
            }
            let _ = done_tx.send(());
        });

        Ok(DownloadTicket::Tracked(done_rx))
    }
}

async fn save_download(
    client: &reqwest::Client,
    request: &DownloadRequest,
    output_dir: &Path,
) -> Result<PathBuf> {
    let mut response = client.get(&request.url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(StreamSaverError::Backend {
            status: status.as_u16(),
            message,
        });
    }

    let filename = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| fallback_filename(&request.format_id));

    ensure_dir(output_dir).await?;
    let (path, mut file) = create_unique(output_dir, &filename).await?;

    let written: Result<()> = async {
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok::<(), StreamSaverError>(())
    }
    .await;

    if let Err(e) = written {
        drop(file);
        let _ = fs::remove_file(&path).await;
        return Err(e);
    }

    Ok(path)
}

/// Candidate names for `filename`: as-is, then `stem_1.ext`, `stem_2.ext`, ...
fn unique_candidates(filename: &str) -> impl Iterator<Item = String> + '_ {
    let (stem, ext) = match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    };
    std::iter::once(filename.to_string())
        .chain((1..MAX_DUPLICATE_SUFFIX).map(move |i| format!("{stem}_{i}{ext}")))
}

/// Create a file that did not exist before; never truncates an existing one
async fn create_unique(dir: &Path, filename: &str) -> Result<(PathBuf, File)> {
    for name in unique_candidates(filename) {
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(StreamSaverError::File(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free name for {} in {}", filename, dir.display()),
    )))
}

/// Extract a safe file name from a `Content-Disposition` header
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let raw = if let Some(caps) = FILENAME_STAR.captures(header) {
        urlencoding::decode(caps[1].trim()).ok()?.into_owned()
    } else {
        FILENAME_PLAIN.captures(header)?[1].trim().to_string()
    };

    let clean = sanitize_filename(&raw);
    if clean.is_empty() { None } else { Some(clean) }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .trim_start_matches('.')
        .to_string()
}

fn fallback_filename(format_id: &str) -> String {
    let ext = sanitize_filename(format_id);
    let ext = if ext.is_empty() { "bin".to_string() } else { ext };
    format!("download_{}.{}", Local::now().format("%Y%m%d_%H%M%S"), ext)
}
