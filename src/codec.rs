//! Text codec for binary payloads
//!
//! Host maps only hold text, so binary pages are stored in a pure-ASCII
//! encoding before they reach [`KvBackend`](crate::kv::KvBackend).
//!
//! ## Encoding
//! - A non-zero byte becomes two uppercase hex digits: `0x3f` → `3F`
//! - A run of N zero bytes becomes N written as a little-endian base-26
//!   number with digits `a..z`: one zero is `b`, two are `c`, 26 are `ab`
//!
//! Zero runs are always maximal, so two runs never sit next to each other
//! and the lowercase digits are unambiguous against the uppercase hex.

use crate::error::{HostKvError, Result};

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Encode `data` as text
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != 0 {
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0f) as usize] as char);
            i += 1;
            continue;
        }

        let run = data[i..].iter().take_while(|&&b| b == 0).count();
        i += run;

        let mut n = run;
        while n > 0 {
            out.push((b'a' + (n % 26) as u8) as char);
            n /= 26;
        }
    }

    out
}

/// Largest payload [`decode`] will produce
pub const MAX_DECODED_LEN: usize = 16 * 1024 * 1024;

/// Decode text produced by [`encode`], up to [`MAX_DECODED_LEN`] bytes
pub fn decode(text: &str) -> Result<Vec<u8>> {
    decode_bounded(text, MAX_DECODED_LEN)
}

/// Decode text produced by [`encode`] into at most `limit` bytes.
///
/// Text that would decode past `limit` is rejected as corrupt before any
/// memory is reserved for it.
pub fn decode_bounded(text: &str, limit: usize) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity((bytes.len() / 2).min(limit));
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];

        if c.is_ascii_lowercase() {
            let mut run = 0usize;
            let mut mult = 1usize;
            while i < bytes.len() && bytes[i].is_ascii_lowercase() {
                let digit = (bytes[i] - b'a') as usize;
                run = digit
                    .checked_mul(mult)
                    .and_then(|d| run.checked_add(d))
                    .filter(|&n| n <= limit - out.len())
                    .ok_or_else(|| overrun(limit))?;
                mult = mult.saturating_mul(26);
                i += 1;
            }
            out.try_reserve(run).map_err(|e| {
                HostKvError::OutOfMemory(format!("{}-byte zero run: {}", run, e))
            })?;
            out.resize(out.len() + run, 0);
            continue;
        }

        let high = hex_value(c)?;
        let low = match bytes.get(i + 1) {
            Some(&next) => hex_value(next)?,
            None => {
                return Err(HostKvError::Corruption(
                    "odd number of hex digits".to_string(),
                ))
            }
        };
        if out.len() == limit {
            return Err(overrun(limit));
        }
        out.push((high << 4) | low);
        i += 2;
    }

    Ok(out)
}

fn overrun(limit: usize) -> HostKvError {
    HostKvError::Corruption(format!("encoded payload decodes past {} bytes", limit))
}

fn hex_value(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(HostKvError::Corruption(format!(
            "unexpected character {:?} in encoded payload",
            c as char
        ))),
    }
}
