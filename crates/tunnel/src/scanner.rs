// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UI-ready line scanning.

use regex::Regex;
use std::sync::LazyLock;

/// Framework startup lines the scanner recognizes, most specific first.
/// Each pattern captures the URL as `url`.
// Allow expect here as the regexes are compile-time verified to be valid
#[allow(clippy::expect_used)]
static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Gradio
        r"(?i)running on local url:\s+(?P<url>https?://\S+)",
        // Flask / Werkzeug
        r"(?i)running on (?P<url>https?://\S+)",
        // Uvicorn / FastAPI
        r"(?i)uvicorn running on (?P<url>https?://\S+)",
        // ComfyUI
        r"(?i)starting server.*?(?P<url>https?://\S+)",
        r"(?i)to see the gui go to:\s+(?P<url>https?://\S+)",
        // Streamlit
        r"(?i)local url:\s+(?P<url>https?://\S+)",
        r"(?i)you can now view your streamlit app.*?(?P<url>https?://\S+)",
        // Jupyter
        r"(?i)jupyter server.*?running.*?(?P<url>https?://\S+)",
        // Generic development servers
        r"(?i)server started.*?(?P<url>https?://\S+)",
        r"(?i)local server running at.*?(?P<url>https?://\S+)",
        r"(?i)dev server.*?listening.*?(?P<url>https?://\S+)",
        r"(?i)application startup complete.*?(?P<url>https?://\S+)",
        // Bare loopback URL anywhere in the line
        r"(?i)(?P<url>https?://(?:localhost|127\.0\.0\.1|0\.0\.0\.0|\[::\]|\[::1\]):\d+\S*)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("constant regex pattern is valid"))
    .collect()
});

/// Scan one line of process output for a web-UI-ready signal.
///
/// Returns the first matching pattern's URL capture, and only when the
/// host is a local loopback address — a public hostname never comes
/// back from here, no matter how well the line matches.
pub fn scan(line: &str) -> Option<String> {
    for pattern in PATTERNS.iter() {
        if let Some(caps) = pattern.captures(line) {
            if let Some(m) = caps.name("url") {
                let url = m.as_str().trim_end_matches(['.', ',', ';', ')', '"', '\'']);
                if is_local(url) {
                    return Some(url.to_string());
                }
            }
        }
    }
    None
}

/// Local TCP port of a scanned URL.
pub fn local_port(url: &str) -> Option<u16> {
    let parsed = url::Url::parse(url).ok()?;
    parsed.port_or_known_default()
}

/// Loopback allowlist: anything else is not tunnelable.
fn is_local(raw: &str) -> bool {
    let Ok(parsed) = url::Url::parse(raw) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    matches!(
        host.to_ascii_lowercase().as_str(),
        "localhost" | "127.0.0.1" | "0.0.0.0" | "::1" | "::"
    )
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
