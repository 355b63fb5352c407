//! Version patching of the binary shortcut template.
//!
//! The template embeds its version text as UTF-16BE-like pairs (`0x00`
//! followed by each ASCII byte). Every occurrence of the placeholder is
//! rewritten; the rest of the blob is copied byte for byte.

use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::io;
use crate::version::Version;

/// Interleave a null byte before every byte of `text`.
pub fn encode_lnk(text: &str) -> Vec<u8> {
    text.bytes().flat_map(|b| [0x00, b]).collect()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Replace every encoded `placeholder` in `template` with `replacement`.
///
/// Returns `None` when the placeholder does not occur.
pub fn patch_bytes(template: &[u8], placeholder: &str, replacement: &str) -> Option<Vec<u8>> {
    let needle = encode_lnk(placeholder);
    let encoded = encode_lnk(replacement);

    let mut at = find(template, &needle)?;
    let mut patched = Vec::with_capacity(template.len());
    let mut rest = template;
    loop {
        patched.extend_from_slice(&rest[..at]);
        patched.extend_from_slice(&encoded);
        rest = &rest[at + needle.len()..];
        match find(rest, &needle) {
            Some(next) => at = next,
            None => break,
        }
    }
    patched.extend_from_slice(rest);
    Some(patched)
}

/// Write `output` as `template` with the placeholder replaced by `v<version>`.
pub fn patch_shortcut(
    template: &Path,
    output: &Path,
    placeholder: &str,
    version: &Version,
) -> Result<()> {
    let bytes = io::read_bytes(template, "read shortcut template")?;
    let patched = patch_bytes(&bytes, placeholder, &version.tag()).ok_or_else(|| {
        Error::shortcut_template_invalid(template.display().to_string(), placeholder)
    })?;

    log_status!("shortcut", "{} -> {}", placeholder, version.tag());
    io::write_bytes(output, &patched, "write shortcut")
}
