// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streamed HTTP downloads with progress reporting.

use crate::FsError;
use berth_core::{Line, OnLine};
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_secs(30);
const CHUNK: usize = 8192;
/// Progress lines are throttled to one per this many bytes.
const PROGRESS_STRIDE: u64 = 1024 * 1024;

/// Download `url` into `dest_dir`, returning the downloaded file path.
///
/// The filename is taken from the last URL path segment, falling back
/// to `downloaded_file`. The body is streamed in small chunks with
/// progress reported through the sink.
pub fn download(url: &str, dest_dir: &Path, on_line: OnLine) -> Result<PathBuf, FsError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| FsError::BadUrl { url: url.to_string(), message: e.to_string() })?;
    let filename = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .unwrap_or("downloaded_file")
        .to_string();
    let dest_path = dest_dir.join(&filename);

    std::fs::create_dir_all(dest_dir).map_err(|source| FsError::Io {
        op: "create download directory",
        path: dest_dir.to_path_buf(),
        source,
    })?;

    on_line(&Line::stdout(format!("downloading {url} -> {}", dest_path.display())));

    let client = reqwest::blocking::Client::builder()
        .read_timeout(READ_TIMEOUT)
        .build()
        .map_err(|source| FsError::Network { url: url.to_string(), source })?;
    let mut response = client
        .get(parsed)
        .send()
        .map_err(|source| FsError::Network { url: url.to_string(), source })?;
    if !response.status().is_success() {
        return Err(FsError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total = response.content_length();
    if let Some(total) = total {
        on_line(&Line::stdout(format!("file size: {total} bytes")));
    }

    let mut file = std::fs::File::create(&dest_path).map_err(|source| FsError::Io {
        op: "create download file",
        path: dest_path.clone(),
        source,
    })?;

    let mut buf = [0u8; CHUNK];
    let mut downloaded: u64 = 0;
    let mut next_report: u64 = PROGRESS_STRIDE;
    loop {
        let n = response
            .read(&mut buf)
            .map_err(|source| FsError::Read { url: url.to_string(), source })?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(|source| FsError::Io {
            op: "write download chunk",
            path: dest_path.clone(),
            source,
        })?;
        downloaded += n as u64;
        if downloaded >= next_report {
            next_report = downloaded + PROGRESS_STRIDE;
            on_line(&Line::stdout(progress_line(downloaded, total)));
        }
    }
    file.sync_all().map_err(|source| FsError::Io {
        op: "sync download file",
        path: dest_path.clone(),
        source,
    })?;

    on_line(&Line::stdout(format!(
        "download complete: {} ({downloaded} bytes)",
        dest_path.display()
    )));
    tracing::info!(url, path = %dest_path.display(), bytes = downloaded, "download complete");
    Ok(dest_path)
}

fn progress_line(downloaded: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => {
            let percent = downloaded as f64 / total as f64 * 100.0;
            format!("progress: {percent:.1}% ({downloaded}/{total} bytes)")
        }
        _ => format!("progress: {downloaded} bytes"),
    }
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
