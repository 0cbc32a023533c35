//! Windows-1252 encoding for Portuguese receipts
//!
//! Receipt printers sold in Brazil ship with the WPC1252 code page, which
//! covers every accented letter used in Portuguese (ç, ã, õ, é, ...).
//! Every mappable character is exactly one byte wide, so the column width
//! of a line equals its character count.

use encoding_rs::WINDOWS_1252;
use tracing::instrument;

/// ESC t 16 - select character code table WPC1252
const SELECT_WPC1252: [u8; 3] = [0x1B, 0x74, 16];

/// Byte printed for characters the code page cannot represent
const REPLACEMENT: u8 = b'?';

/// Printed column width of a string
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to at most `max_width` columns
pub fn truncate_text(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to exactly `width` columns
///
/// Longer strings are truncated.
pub fn pad_text(s: &str, width: usize, align_right: bool) -> String {
    let current = text_width(s);
    if current >= width {
        return truncate_text(s, width);
    }
    let spaces = " ".repeat(width - current);
    if align_right {
        format!("{spaces}{s}")
    } else {
        format!("{s}{spaces}")
    }
}

/// Convert UTF-8 content (with ESC/POS commands) to Windows-1252
///
/// ASCII bytes pass through untouched so that command sequences survive.
/// Runs of non-ASCII bytes are decoded as UTF-8 and re-encoded one
/// character at a time; unmappable characters become `?`. The code page
/// is selected at the start and again after every INIT (ESC @), which
/// resets it.
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn encode_latin(bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len() + SELECT_WPC1252.len());
    result.extend_from_slice(&SELECT_WPC1252);

    let mut pending = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];

        if b == 0x1B && bytes.get(i + 1) == Some(&0x40) {
            flush_pending(&mut pending, &mut result);
            result.extend_from_slice(&[0x1B, 0x40]);
            result.extend_from_slice(&SELECT_WPC1252);
            i += 2;
            continue;
        }

        if b.is_ascii() {
            flush_pending(&mut pending, &mut result);
            result.push(b);
        } else {
            pending.push(b);
        }
        i += 1;
    }
    flush_pending(&mut pending, &mut result);

    result
}

fn flush_pending(pending: &mut Vec<u8>, result: &mut Vec<u8>) {
    if pending.is_empty() {
        return;
    }
    let text = String::from_utf8_lossy(pending);
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let (encoded, _, had_errors) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if had_errors || encoded.len() != 1 {
            result.push(REPLACEMENT);
        } else {
            result.push(encoded[0]);
        }
    }
    pending.clear();
}
