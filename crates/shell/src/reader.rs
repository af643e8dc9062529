// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-stream line pumping.

use berth_core::{Line, LineTag, OnLine};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Read a stream to EOF, delivering each completed line to the sink.
///
/// Lines are split on `\n`; a trailing partial line (no newline before
/// EOF) is still delivered. Invalid UTF-8 is replaced, never dropped.
/// One task per stream keeps per-stream callback invocations serial.
pub(crate) async fn pump<R>(stream: R, tag: LineTag, on_line: OnLine)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => on_line(&Line { tag, text: decode_line(&buf) }),
            Err(e) => {
                on_line(&Line::error(format!("{tag} read failed: {e}")));
                break;
            }
        }
    }
}

/// Lossy-decode one raw line, stripping the line terminator.
fn decode_line(bytes: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
