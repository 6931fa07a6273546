//! Tagged-data locking script codec
//!
//! Decodes the PushDrop-style locking script layout used by KVStore tokens:
//!
//! ```text
//! <push: locking public key> OP_CHECKSIG
//! <push: field 0> ... <push: field n-1> <push: signature>
//! OP_DROP / OP_2DROP ...
//! ```
//!
//! The trailing drop opcodes remove the data pushes from the evaluation
//! stack, leaving an ordinary pay-to-public-key spend condition. The final
//! data push is a signature from the locking key over the preceding fields;
//! this module extracts it but does not verify it.
//!
//! The admission filter consumes the codec through the [`ScriptDecoder`]
//! trait so tests can substitute a scripted implementation.

use bitcoin::ScriptBuf;

pub mod error;

pub use error::{DecoderError, DecoderResult};

const OP_CHECKSIG: u8 = 0xac;
const OP_DROP: u8 = 0x75;
const OP_2DROP: u8 = 0x6d;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;

/// A decoded tagged-data token
///
/// `fields` holds the embedded data pushes in protocol order, after the
/// leading public key and before the trailing signature push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    /// SEC-encoded locking public key (33 bytes compressed or 65 uncompressed)
    pub locking_public_key: Vec<u8>,
    /// Embedded data fields as raw byte buffers
    pub fields: Vec<Vec<u8>>,
    /// Trailing signature push (shape only - never verified here)
    pub signature: Vec<u8>,
}

/// Decoding seam consumed by the admission filter
pub trait ScriptDecoder {
    /// Decode a hex-encoded locking script into its embedded data fields
    fn decode(&self, script_hex: &str) -> DecoderResult<DecodedToken>;
}

/// Default decoder for the PushDrop-style tagged-data layout
#[derive(Debug, Clone, Copy, Default)]
pub struct PushDropDecoder;

impl ScriptDecoder for PushDropDecoder {
    fn decode(&self, script_hex: &str) -> DecoderResult<DecodedToken> {
        decode_tagged_script(script_hex)
    }
}

/// Decode a hex-encoded tagged-data locking script
///
/// Fails with a typed [`DecoderError`] for anything that does not match the
/// layout: plain P2PK/P2PKH spends, OP_RETURN carriers, truncated pushes,
/// or drop opcodes that do not account for every data push.
pub fn decode_tagged_script(script_hex: &str) -> DecoderResult<DecodedToken> {
    let script_bytes = hex::decode(script_hex)?;

    // Leading push must be an SEC-encoded public key
    let (locking_public_key, mut pos) = match read_push(&script_bytes, 0)? {
        Some(push) => push,
        None => {
            return Err(DecoderError::NotTaggedData(
                "script does not start with a data push".to_string(),
            ))
        }
    };
    if !is_sec_public_key(&locking_public_key) {
        return Err(DecoderError::NotTaggedData(format!(
            "leading push of {} bytes is not an SEC public key",
            locking_public_key.len()
        )));
    }

    // The key must be protected by OP_CHECKSIG
    if script_bytes.get(pos) != Some(&OP_CHECKSIG) {
        return Err(DecoderError::NotTaggedData(
            "missing OP_CHECKSIG after the locking public key".to_string(),
        ));
    }
    pos += 1;

    // Collect the data pushes; the last one is the signature
    let mut pushes: Vec<Vec<u8>> = Vec::new();
    while let Some((data, next)) = read_push(&script_bytes, pos)? {
        pushes.push(data);
        pos = next;
    }
    if pushes.is_empty() {
        return Err(DecoderError::NotTaggedData(
            "no data pushes after OP_CHECKSIG".to_string(),
        ));
    }

    // Remaining opcodes must drop exactly the pushed items from the stack
    let mut dropped = 0usize;
    for &op in &script_bytes[pos..] {
        match op {
            OP_DROP => dropped += 1,
            OP_2DROP => dropped += 2,
            other => {
                return Err(DecoderError::NotTaggedData(format!(
                    "unexpected opcode 0x{:02x} after the data pushes",
                    other
                )))
            }
        }
    }
    if dropped != pushes.len() {
        return Err(DecoderError::DropCountMismatch {
            dropped,
            pushed: pushes.len(),
        });
    }

    let signature = pushes.pop().unwrap_or_default();
    Ok(DecodedToken {
        locking_public_key,
        fields: pushes,
        signature,
    })
}

/// Build a tagged-data locking script (the encode counterpart)
///
/// Emits minimal pushes for each element and the drop opcodes that remove
/// the data pushes (fields plus signature) from the stack again.
pub fn build_locking_script(
    locking_public_key: &[u8],
    fields: &[Vec<u8>],
    signature: &[u8],
) -> ScriptBuf {
    let mut script = Vec::new();
    push_data(&mut script, locking_public_key);
    script.push(OP_CHECKSIG);

    for field in fields {
        push_data(&mut script, field);
    }
    push_data(&mut script, signature);

    let mut remaining = fields.len() + 1;
    while remaining >= 2 {
        script.push(OP_2DROP);
        remaining -= 2;
    }
    if remaining == 1 {
        script.push(OP_DROP);
    }

    ScriptBuf::from_bytes(script)
}

/// Read one data push starting at `pos`
///
/// Returns `Ok(None)` when the byte at `pos` is not a push opcode (or the
/// script ended), so callers can treat "no more pushes" as an ordinary
/// branch. Respects declared PUSHDATA lengths and fails on truncation.
fn read_push(script_bytes: &[u8], pos: usize) -> DecoderResult<Option<(Vec<u8>, usize)>> {
    let Some(&opcode) = script_bytes.get(pos) else {
        return Ok(None);
    };

    let (data_start, declared_len) = match opcode {
        // OP_0 pushes an empty buffer
        0x00 => (pos + 1, 0),
        op @ 0x01..=0x4b => (pos + 1, op as usize),
        OP_PUSHDATA1 => {
            let Some(&len) = script_bytes.get(pos + 1) else {
                return Err(DecoderError::TruncatedPush {
                    offset: pos,
                    declared: 1,
                    available: 0,
                });
            };
            (pos + 2, len as usize)
        }
        OP_PUSHDATA2 => {
            if script_bytes.len() < pos + 3 {
                return Err(DecoderError::TruncatedPush {
                    offset: pos,
                    declared: 2,
                    available: script_bytes.len() - pos - 1,
                });
            }
            let len = u16::from_le_bytes([script_bytes[pos + 1], script_bytes[pos + 2]]) as usize;
            (pos + 3, len)
        }
        OP_PUSHDATA4 => {
            if script_bytes.len() < pos + 5 {
                return Err(DecoderError::TruncatedPush {
                    offset: pos,
                    declared: 4,
                    available: script_bytes.len() - pos - 1,
                });
            }
            let len = u32::from_le_bytes([
                script_bytes[pos + 1],
                script_bytes[pos + 2],
                script_bytes[pos + 3],
                script_bytes[pos + 4],
            ]) as usize;
            (pos + 5, len)
        }
        _ => return Ok(None),
    };

    if script_bytes.len() < data_start + declared_len {
        return Err(DecoderError::TruncatedPush {
            offset: pos,
            declared: declared_len,
            available: script_bytes.len().saturating_sub(data_start),
        });
    }

    Ok(Some((
        script_bytes[data_start..data_start + declared_len].to_vec(),
        data_start + declared_len,
    )))
}

/// Emit a minimal push for `data`
fn push_data(script: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        0 => script.push(0x00),
        len @ 1..=0x4b => script.push(len as u8),
        len @ 0x4c..=0xff => {
            script.push(OP_PUSHDATA1);
            script.push(len as u8);
        }
        len @ 0x100..=0xffff => {
            script.push(OP_PUSHDATA2);
            script.extend_from_slice(&(len as u16).to_le_bytes());
        }
        len => {
            script.push(OP_PUSHDATA4);
            script.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    script.extend_from_slice(data);
}

/// Check for a 33-byte compressed or 65-byte uncompressed SEC encoding
fn is_sec_public_key(data: &[u8]) -> bool {
    match data.len() {
        33 => data[0] == 0x02 || data[0] == 0x03,
        65 => data[0] == 0x04,
        _ => false,
    }
}
