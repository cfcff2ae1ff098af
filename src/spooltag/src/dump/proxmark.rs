//! Proxmark3 dump parsing
//!
//! Two shapes are produced by `hf mf dump`: a raw `.bin` file (blocks
//! concatenated in order, no header) and a `.json` export carrying the card
//! identification plus a map of block index to hex string.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{spaced_hex, Block, DumpFormat, DumpIssue, TagDump, BLOCK_SIZE, TAG_CAPACITY};

#[derive(Debug, Deserialize)]
struct JsonDump {
    #[serde(rename = "Card", default)]
    card: JsonCard,
    #[serde(default)]
    blocks: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonCard {
    #[serde(rename = "UID")]
    uid: Option<String>,
    #[serde(rename = "ATQA")]
    atqa: Option<String>,
    #[serde(rename = "SAK")]
    sak: Option<String>,
}

/// Parse a Proxmark dump, trying the JSON export before raw binary
///
/// Content that parses as JSON is never re-read as binary. A JSON document
/// without usable `blocks` yields an empty dump.
pub fn assemble(content: &[u8]) -> TagDump {
    if looks_like_json(content) {
        match serde_json::from_slice::<serde_json::Value>(content) {
            Ok(value) => return assemble_json_value(value),
            Err(e) => tracing::debug!(error = %e, "not a Proxmark JSON export, reading as binary"),
        }
    }
    assemble_binary(content)
}

fn assemble_json_value(value: serde_json::Value) -> TagDump {
    match serde_json::from_value::<JsonDump>(value) {
        Ok(json) => assemble_json(json),
        Err(e) => {
            let mut dump = TagDump::new(DumpFormat::Proxmark);
            dump.flag(DumpIssue::InvalidBlock {
                entry: "json document".to_string(),
                reason: format!("not a Proxmark export: {}", e),
            });
            dump
        }
    }
}

/// Whether the content starts like a JSON object
pub fn looks_like_json(content: &[u8]) -> bool {
    content
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

/// Slice raw bytes into consecutive blocks
fn assemble_binary(content: &[u8]) -> TagDump {
    let mut dump = TagDump::new(DumpFormat::Proxmark);

    let chunks = content.chunks_exact(BLOCK_SIZE);
    let trailing = chunks.remainder().len();
    let total = chunks.len();

    for (index, chunk) in chunks.take(TAG_CAPACITY).enumerate() {
        if let Some(block) = Block::from_slice(chunk) {
            dump.insert(index, block);
        }
    }

    if total > TAG_CAPACITY {
        dump.flag(DumpIssue::ExcessBlocks {
            dropped: total - TAG_CAPACITY,
        });
    }
    if trailing > 0 {
        dump.flag(DumpIssue::Truncated {
            trailing_bytes: trailing,
        });
    }

    dump
}

fn assemble_json(json: JsonDump) -> TagDump {
    let mut dump = TagDump::new(DumpFormat::Proxmark);

    dump.header.uid = json.card.uid.as_deref().map(normalize_hex);
    dump.header.atqa = json.card.atqa.as_deref().map(normalize_hex);
    dump.header.sak = json.card.sak.as_deref().map(normalize_hex);

    for (key, value) in &json.blocks {
        match parse_json_block(key, value) {
            Ok((index, block)) => dump.insert(index, block),
            Err(reason) => dump.flag(DumpIssue::InvalidBlock {
                entry: format!("block \"{}\"", key),
                reason,
            }),
        }
    }

    dump
}

fn parse_json_block(key: &str, value: &serde_json::Value) -> Result<(usize, Block), String> {
    let index: usize = key
        .trim()
        .parse()
        .map_err(|_| format!("invalid block index '{}'", key))?;
    let value = value
        .as_str()
        .ok_or_else(|| format!("block {} is not a hex string", index))?;
    let bytes = hex::decode(value.trim()).map_err(|e| format!("invalid hex: {}", e))?;
    let block = Block::from_slice(&bytes).ok_or_else(|| {
        format!(
            "block {} has {} bytes, expected {}",
            index,
            bytes.len(),
            BLOCK_SIZE
        )
    })?;
    Ok((index, block))
}

/// Render compact hex (`75886B1D`) the way Flipper headers show it (`75 88 6B 1D`)
fn normalize_hex(value: &str) -> String {
    match hex::decode(value.trim()) {
        Ok(bytes) => spaced_hex(&bytes),
        Err(_) => value.trim().to_string(),
    }
}
