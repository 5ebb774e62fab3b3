//! The frozen binary record format for `statistics`/`repository` values
//! (spec §3): byte 0 is a version tag (currently 1), an optional 8-byte
//! little-endian timestamp for statistics entries, a 4-byte
//! little-endian pair count, then per pair a 2-byte key length, the key
//! bytes, a 1-byte type tag (`1`=int64, `2`=float64, `3`=string) and the
//! value bytes (strings carry their own 2-byte length prefix). Unknown
//! versions are rejected.

use anyhow::{anyhow, bail, Context, Result};

const VERSION: u8 = 1;
const TYPE_INT64: u8 = 1;
const TYPE_FLOAT64: u8 = 2;
const TYPE_STRING: u8 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int64(i64),
    Float64(f64),
    Str(String),
}

impl Value {
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// Encode one record. `timestamp` is `Some` for statistics entries,
/// `None` for repository entries.
#[must_use]
pub fn encode(timestamp: Option<i64>, fields: &[(&str, Value)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(VERSION);
    if let Some(ts) = timestamp {
        out.extend_from_slice(&ts.to_le_bytes());
    }
    out.extend_from_slice(&(fields.len() as u32).to_le_bytes());
    for (key, value) in fields {
        let key_bytes = key.as_bytes();
        out.extend_from_slice(&(key_bytes.len() as u16).to_le_bytes());
        out.extend_from_slice(key_bytes);
        match value {
            Value::Int64(v) => {
                out.push(TYPE_INT64);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Value::Float64(v) => {
                out.push(TYPE_FLOAT64);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Value::Str(s) => {
                out.push(TYPE_STRING);
                let bytes = s.as_bytes();
                out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
                out.extend_from_slice(bytes);
            }
        }
    }
    out
}

/// Decode one record. `expect_timestamp` selects whether to read the
/// optional 8-byte timestamp field.
pub fn decode(bytes: &[u8], expect_timestamp: bool) -> Result<(Option<i64>, Vec<(String, Value)>)> {
    let mut cursor = Cursor::new(bytes);
    let version = cursor.read_u8().context("truncated record: missing version byte")?;
    if version != VERSION {
        bail!("unsupported record version: {version}");
    }

    let timestamp = if expect_timestamp {
        Some(cursor.read_i64()?)
    } else {
        None
    };

    let count = cursor.read_u32()?;
    let mut fields = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let key_len = cursor.read_u16()? as usize;
        let key = String::from_utf8(cursor.read_bytes(key_len)?.to_vec()).context("non-utf8 key")?;
        let type_tag = cursor.read_u8()?;
        let value = match type_tag {
            TYPE_INT64 => Value::Int64(cursor.read_i64()?),
            TYPE_FLOAT64 => Value::Float64(f64::from_le_bytes(cursor.read_bytes(8)?.try_into().unwrap())),
            TYPE_STRING => {
                let len = cursor.read_u16()? as usize;
                let s = String::from_utf8(cursor.read_bytes(len)?.to_vec()).context("non-utf8 string value")?;
                Value::Str(s)
            }
            other => bail!("unknown value type tag: {other}"),
        };
        fields.push((key, value));
    }
    Ok((timestamp, fields))
}

/// Whether `bytes` looks like it starts with a supported version byte,
/// used by `get_statistics` to silently skip legacy JSON-encoded
/// entries (spec §4.2: "skipping entries whose first byte indicates the
/// legacy JSON format").
#[must_use]
pub fn looks_like_current_format(bytes: &[u8]) -> bool {
    bytes.first() == Some(&VERSION)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            bail!("truncated record at offset {}", self.pos);
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_bytes(2)?.try_into().map_err(|_| anyhow!("bad u16"))?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_bytes(4)?.try_into().map_err(|_| anyhow!("bad u32"))?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_bytes(8)?.try_into().map_err(|_| anyhow!("bad i64"))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_mixed_field_types() {
        let fields = vec![
            ("suite", Value::Str("stable".to_string())),
            ("packages_total", Value::Int64(42)),
            ("duration_secs", Value::Float64(3.5)),
        ];
        let encoded = encode(Some(1_700_000_000), &fields);
        let (ts, decoded) = decode(&encoded, true).unwrap();
        assert_eq!(ts, Some(1_700_000_000));
        assert_eq!(decoded, fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<Vec<_>>());
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = encode(None, &[]);
        bytes[0] = 99;
        assert!(decode(&bytes, false).is_err());
    }

    #[test]
    fn legacy_json_bytes_are_not_current_format() {
        assert!(!looks_like_current_format(b"{\"suite\":\"stable\"}"));
        assert!(looks_like_current_format(&encode(None, &[])));
    }

    #[test]
    fn no_timestamp_variant_omits_the_eight_bytes() {
        let encoded = encode(None, &[("a", Value::Int64(1))]);
        let (ts, fields) = decode(&encoded, false).unwrap();
        assert_eq!(ts, None);
        assert_eq!(fields, vec![("a".to_string(), Value::Int64(1))]);
    }
}
