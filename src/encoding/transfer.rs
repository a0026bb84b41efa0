//! Content-Transfer-Encoding decoding.

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::{DecodePaddingMode, GeneralPurpose};
use base64::Engine as _;

use super::qp;
use crate::report::Diagnostic;

/// Accepts missing or extra padding and non-zero trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode base64, skipping whitespace and other non-alphabet bytes.
pub fn decode_base64_lenient(data: &[u8]) -> Option<Vec<u8>> {
    let mut clean: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/')
        .collect();
    // A single dangling symbol cannot encode a byte.
    if clean.len() % 4 == 1 {
        clean.pop();
    }
    LENIENT.decode(&clean).ok()
}

/// Decode an `x-uuencode` body (`begin` line, data lines, `end`).
pub fn decode_uuencode(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 3 / 4);
    let mut started = false;

    for line in data.split(|b| *b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if !started {
            started = line.starts_with(b"begin ");
            continue;
        }
        if line == b"end" {
            return Some(out);
        }
        let Some((&len_char, rest)) = line.split_first() else {
            continue;
        };
        let len = (len_char.wrapping_sub(b' ') & 0x3F) as usize;
        if len == 0 {
            continue;
        }
        let mut decoded = Vec::with_capacity(len + 2);
        for quad in rest.chunks(4) {
            let mut v = [0u8; 4];
            for (slot, c) in v.iter_mut().zip(quad) {
                *slot = c.wrapping_sub(b' ') & 0x3F;
            }
            decoded.push((v[0] << 2) | (v[1] >> 4));
            decoded.push((v[1] << 4) | (v[2] >> 2));
            decoded.push((v[2] << 6) | v[3]);
        }
        decoded.truncate(len);
        out.extend_from_slice(&decoded);
    }

    started.then_some(out)
}

/// Undo the declared transfer encoding. Unknown or undecodable encodings
/// return the bytes unchanged with a warning.
pub fn decode_transfer(encoding: &str, data: &[u8]) -> (Vec<u8>, Option<Diagnostic>) {
    match encoding.trim().to_ascii_lowercase().as_str() {
        "" | "7bit" | "8bit" | "binary" => (data.to_vec(), None),
        "base64" => match decode_base64_lenient(data) {
            Some(bytes) => (bytes, None),
            None => (
                data.to_vec(),
                Some(Diagnostic::warning(
                    "Content could not be decoded as 'base64'; the raw bytes were kept",
                )),
            ),
        },
        "quoted-printable" => (qp::decode(data), None),
        "x-uuencode" | "uuencode" | "x-uue" => match decode_uuencode(data) {
            Some(bytes) => (bytes, None),
            None => (
                data.to_vec(),
                Some(Diagnostic::warning(
                    "Content could not be decoded as 'x-uuencode'; the raw bytes were kept",
                )),
            ),
        },
        other => (
            data.to_vec(),
            Some(Diagnostic::warning(format!(
                "Unknown Content-Transfer-Encoding '{other}'; the raw bytes were kept"
            ))),
        ),
    }
}
