//! Flipper Zero `.nfc` dump parsing
//!
//! ```text
//! Filetype: Flipper NFC device
//! Version: 4
//! UID: 75 88 6B 1D
//! ATQA: 00 04
//! SAK: 08
//! Mifare Classic type: 1K
//! # Mifare Classic blocks, '??' means unknown data
//! Block 0: 75 88 6B 1D 8B 08 04 00 04 5B 13 6F 5F 57 7D 90
//! Block 1: 41 30 30 2D 4B 30 00 00 47 46 41 30 30 00 00 00
//! ```

use super::{Block, DumpFormat, DumpIssue, TagDump, BLOCK_SIZE};

/// First line of every Flipper NFC file
pub const FILETYPE_SIGNATURE: &str = "Filetype: Flipper NFC device";

const BLOCK_PREFIX: &str = "Block ";
const UNREAD_TOKEN: &str = "??";

/// Parse a Flipper dump into blocks and header fields
pub fn assemble(content: &[u8]) -> TagDump {
    let text = String::from_utf8_lossy(content);
    let mut dump = TagDump::new(DumpFormat::Flipper);

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix(BLOCK_PREFIX) {
            match parse_block_line(rest) {
                Ok((index, block)) => dump.insert(index, block),
                Err(reason) => dump.flag(DumpIssue::InvalidBlock {
                    entry: format!("line {}", line_no + 1),
                    reason,
                }),
            }
        } else if let Some((key, value)) = line.split_once(':') {
            apply_header(&mut dump, key.trim(), value.trim());
        }
    }

    dump
}

/// Whether a line looks like a Flipper block line (`Block <n>: ...`)
pub fn is_block_line(line: &str) -> bool {
    line.trim()
        .strip_prefix(BLOCK_PREFIX)
        .and_then(|rest| rest.split_once(':'))
        .is_some_and(|(index, _)| index.trim().parse::<usize>().is_ok())
}

fn apply_header(dump: &mut TagDump, key: &str, value: &str) {
    let value = Some(value.to_string());
    match key {
        "UID" => dump.header.uid = value,
        "ATQA" => dump.header.atqa = value,
        "SAK" => dump.header.sak = value,
        "Mifare Classic type" => dump.header.card_type = value,
        _ => {}
    }
}

/// Parse the part after `Block `: `<index>: <16 hex tokens>`
fn parse_block_line(rest: &str) -> Result<(usize, Block), String> {
    let (index, data) = rest
        .split_once(':')
        .ok_or_else(|| "missing ':' after block index".to_string())?;
    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid block index '{}'", index.trim()))?;

    let tokens: Vec<&str> = data.split_whitespace().collect();
    if tokens.len() != BLOCK_SIZE {
        return Err(format!(
            "block {} has {} bytes, expected {}",
            index,
            tokens.len(),
            BLOCK_SIZE
        ));
    }

    let mut bytes = [0u8; BLOCK_SIZE];
    let mut unread = 0u16;
    for (i, token) in tokens.iter().enumerate() {
        if *token == UNREAD_TOKEN {
            unread |= 1 << i;
            continue;
        }
        match hex::decode(token).as_deref() {
            Ok([byte]) => bytes[i] = *byte,
            _ => return Err(format!("block {}: invalid hex byte '{}'", index, token)),
        }
    }

    Ok((index, Block::with_unread(bytes, unread)))
}
