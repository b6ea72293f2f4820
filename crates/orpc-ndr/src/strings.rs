//! NDR string types
//!
//! Two representations of a UTF-16 string body are supported:
//!
//! Counted and terminated (`[string] wchar_t*`), a conformant varying array:
//! ```text
//! max_count: u32    # elements including the terminator
//! offset: u32       # always 0
//! actual_count: u32 # elements including the terminator
//! chars[actual_count]
//! ```
//!
//! Free-form (`BSTR`, sent as FLAGGED_WORD_BLOB), a conformant structure
//! without terminator:
//! ```text
//! max_count: u32    # clSize
//! cBytes: u32       # byte length
//! clSize: u32       # character count
//! chars[clSize]
//! ```
//!
//! Both are string *bodies*. A nullable string is a pointer to one of them,
//! e.g. `UniquePtr<BString>`; a null pointer is an absent string, which is
//! distinct from a present empty string.

use crate::error::MAX_NDR_ALLOCATION_SIZE;
use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

fn utf16_len(len: u32) -> Result<usize> {
    let len = len as usize;
    if len > MAX_NDR_ALLOCATION_SIZE / 2 {
        return Err(NdrError::AllocationLimitExceeded {
            requested: len,
            limit: MAX_NDR_ALLOCATION_SIZE / 2,
        });
    }
    Ok(len)
}

fn read_units(r: &mut NdrReader, count: usize) -> Result<Vec<u16>> {
    let mut units = Vec::with_capacity(count);
    for _ in 0..count {
        units.push(r.get_u16()?);
    }
    Ok(units)
}

fn units_to_string(units: Vec<u16>) -> Result<String> {
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(NdrError::from)
}

fn count_of(units: &[u16]) -> Result<u32> {
    u32::try_from(units.len())
        .map_err(|_| NdrError::IntegerOverflow)
}

/// Counted, NUL-terminated UTF-16 string body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdrWString(pub String);

impl NdrWString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for NdrWString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NdrWString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl NdrEncode for NdrWString {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        let mut units: Vec<u16> = self.0.encode_utf16().collect();
        units.push(0);
        let count = count_of(&units)?;

        w.put_u32(count);
        w.put_u32(0);
        w.put_u32(count);
        for unit in units {
            w.put_u16(unit);
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for NdrWString {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let max_count = r.get_u32()?;
        let offset = r.get_u32()?;
        let actual_count = r.get_u32()?;

        if offset != 0 {
            return Err(NdrError::InvalidString(format!("non-zero offset {}", offset)));
        }
        if actual_count > max_count {
            return Err(NdrError::ConformanceMismatch { max_count, actual_count });
        }

        let mut units = read_units(r, utf16_len(actual_count)?)?;
        if units.pop() != Some(0) {
            return Err(NdrError::InvalidString("missing terminator".to_string()));
        }
        units_to_string(units).map(Self)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// Free-form BSTR body (FLAGGED_WORD_BLOB)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BString(pub String);

impl BString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for BString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl NdrEncode for BString {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        let units: Vec<u16> = self.0.encode_utf16().collect();
        let count = count_of(&units)?;
        let byte_len = count.checked_mul(2).ok_or(NdrError::IntegerOverflow)?;

        w.put_u32(count);
        w.put_u32(byte_len);
        w.put_u32(count);
        for unit in units {
            w.put_u16(unit);
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for BString {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let max_count = r.get_u32()?;
        let byte_len = r.get_u32()?;
        let count = r.get_u32()?;

        if count != max_count {
            return Err(NdrError::ConformanceMismatch {
                max_count,
                actual_count: count,
            });
        }
        if u64::from(byte_len) != u64::from(count) * 2 {
            return Err(NdrError::InvalidString(format!(
                "byte length {} does not match {} characters",
                byte_len, count
            )));
        }

        let units = read_units(r, utf16_len(count)?)?;
        units_to_string(units).map(Self)
    }

    fn ndr_align() -> usize {
        4
    }
}
