//! Raw POM bytes in and out. The text is decoded with the encoding named by
//! the BOM or the XML declaration, and encoded back the same way, so a splice
//! in the decoded text leaves every other byte of the file as it was.

use anyhow::Result;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use regex::bytes::Regex;
use std::path::Path;

use crate::error::SetVersionError;

fn declared_encoding_regex() -> Result<Regex> {
    Ok(Regex::new(
        r#"^\s*<\?xml[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:\-]+)["']"#,
    )?)
}

#[derive(Debug, Clone)]
pub struct PomSource {
    pub text: String,
    encoding: &'static Encoding,
    bom: Vec<u8>,
}

impl PomSource {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| SetVersionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes, path)
    }

    pub fn decode(bytes: &[u8], path: &Path) -> Result<Self> {
        let (encoding, bom_len) = match Encoding::for_bom(bytes) {
            Some((encoding, bom_len)) => (encoding, bom_len),
            None => (declared_encoding(bytes)?.unwrap_or(UTF_8), 0),
        };
        let (bom, body) = bytes.split_at(bom_len);

        let text = encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .ok_or_else(|| SetVersionError::Decode {
                path: path.to_path_buf(),
                encoding: encoding.name().to_string(),
            })?
            .into_owned();

        Ok(PomSource {
            text,
            encoding,
            bom: bom.to_vec(),
        })
    }

    #[cfg(test)]
    pub(crate) fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Encodes `text` the way the original file was. Characters the target
    /// encoding cannot hold become numeric character references.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let mut bytes = self.bom.clone();
        if self.encoding == UTF_16LE {
            bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        } else if self.encoding == UTF_16BE {
            bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        } else {
            let (encoded, _, _) = self.encoding.encode(text);
            bytes.extend_from_slice(&encoded);
        }
        bytes
    }
}

/// Encoding label from `<?xml ... encoding="..."?>`, if there is one.
/// A declaration without BOM is ASCII-compatible, so the raw bytes are matched.
fn declared_encoding(bytes: &[u8]) -> Result<Option<&'static Encoding>> {
    let head = &bytes[..bytes.len().min(256)];
    let Some(captures) = declared_encoding_regex()?.captures(head) else {
        return Ok(None);
    };
    Ok(Encoding::for_label(&captures[1]))
}
