//! Canonical CBOR serialization for deterministic signing bytes.
//!
//! A certificate signature covers the exact byte encoding of the record, so
//! identical field values must always serialize to identical bytes. The
//! canonical profile follows RFC 8949 section 4.2:
//!
//! 1. Map keys sorted by encoded byte string
//! 2. Integers in minimal form
//! 3. No indefinite-length items
//! 4. No floating-point fields in signed records
//!
//! `ciborium` emits this profile for derived structs; [`encode_canonical`]
//! additionally audits the produced bytes so a regression in field types
//! (or a hand-built value) cannot silently produce unsignable output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("CBOR encoding error: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),

    #[error("CBOR decoding error: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),

    #[error("encoding is not canonical: {0}")]
    NotCanonical(&'static str),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

/// Serialize a value to canonical CBOR bytes.
pub fn encode_canonical<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)?;
    audit_canonical(&buf)?;
    Ok(buf)
}

/// Deserialize a value from canonical CBOR bytes.
pub fn decode_canonical<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    let value = ciborium::from_reader(bytes)?;
    Ok(value)
}

/// Check that `bytes` hold exactly one data item in canonical form.
fn audit_canonical(bytes: &[u8]) -> Result<()> {
    let mut scanner = Scanner { bytes, pos: 0 };
    scanner.item()?;
    if scanner.pos != bytes.len() {
        return Err(SerializationError::NotCanonical(
            "trailing bytes after root item",
        ));
    }
    Ok(())
}

/// Walks CBOR item headers without materializing values.
struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Scanner<'_> {
    fn take(&mut self, n: usize) -> Result<&[u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(SerializationError::NotCanonical("truncated item"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn item(&mut self) -> Result<()> {
        let head = self.take(1)?[0];
        let major = head >> 5;
        let info = head & 0x1f;

        let extra = match info {
            0..=23 => 0,
            24 => 1,
            25 => 2,
            26 => 4,
            27 => 8,
            28..=30 => {
                return Err(SerializationError::NotCanonical(
                    "reserved additional-information value",
                ))
            }
            _ => {
                return Err(SerializationError::NotCanonical(
                    "indefinite-length item",
                ))
            }
        };

        let arg = if extra == 0 {
            u64::from(info)
        } else {
            let raw = self.take(extra)?;
            let mut arg = 0u64;
            for &b in raw {
                arg = arg << 8 | u64::from(b);
            }
            // Minimality only applies where the argument is an integer or a
            // length; for major type 7 the same bytes carry float payloads.
            if major != 7 {
                let minimal = match extra {
                    1 => arg >= 24,
                    2 => arg > u64::from(u8::MAX),
                    4 => arg > u64::from(u16::MAX),
                    _ => arg > u64::from(u32::MAX),
                };
                if !minimal {
                    return Err(SerializationError::NotCanonical(
                        "non-minimal integer encoding",
                    ));
                }
            }
            arg
        };

        match major {
            // Integers and simple/float values carry no nested data.
            0 | 1 | 7 => {}
            // Byte and text strings: skip the payload.
            2 | 3 => {
                self.take(arg as usize)?;
            }
            4 => {
                for _ in 0..arg {
                    self.item()?;
                }
            }
            5 => {
                for _ in 0..arg {
                    self.item()?; // key
                    self.item()?; // value
                }
            }
            6 => self.item()?,
            _ => unreachable!("major type is three bits"),
        }

        Ok(())
    }
}
