//! Character set detection for JPK files
//!
//! Exports from Polish accounting software are frequently Windows-1250 or
//! ISO-8859-2 even when the declaration claims otherwise.

use std::borrow::Cow;

use encoding_rs::{Encoding, ISO_8859_2, WINDOWS_1250};
use ksef_domain::{KsefError, Result};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode raw JPK bytes and check that they look like a JPK document.
///
/// # Errors
/// `ImportValidation` when no encoding applies or the text mentions neither
/// `JPK` nor `Faktura`.
pub fn decode_document(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let text = decode(bytes).ok_or_else(|| {
        KsefError::ImportValidation("file is not valid UTF-8, Windows-1250 or ISO-8859-2".into())
    })?;

    if !text.contains("JPK") && !text.contains("Faktura") {
        return Err(KsefError::ImportValidation(
            "file does not look like a JPK_FA document (no JPK or Faktura element)".into(),
        ));
    }
    Ok(text)
}

fn decode(bytes: &[u8]) -> Option<Cow<'_, str>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(Cow::Borrowed(text));
    }

    let fallbacks: [&'static Encoding; 2] = [WINDOWS_1250, ISO_8859_2];
    fallbacks.into_iter().find_map(|encoding| {
        let decoded = encoding.decode_without_bom_handling_and_without_replacement(bytes)?;
        debug!(encoding = encoding.name(), "decoded JPK file with legacy encoding");
        Some(decoded)
    })
}
