//! NDR primitive type implementations
//!
//! | IDL Type       | Rust Type     | Size | Alignment |
//! |----------------|---------------|------|-----------|
//! | boolean        | bool          | 1    | 1         |
//! | byte/char      | u8            | 1    | 1         |
//! | small          | i8            | 1    | 1         |
//! | short          | i16           | 2    | 2         |
//! | unsigned short | u16           | 2    | 2         |
//! | VARIANT_BOOL   | VariantBool   | 2    | 2         |
//! | long           | i32           | 4    | 4         |
//! | unsigned long  | u32           | 4    | 4         |
//! | hyper          | i64           | 8    | 8         |
//! | unsigned hyper | u64           | 8    | 8         |
//! | float          | f32           | 4    | 4         |
//! | double         | f64           | 8    | 8         |
//! | GUID           | Uuid          | 16   | 4         |

use std::fmt;
use std::str::FromStr;

use crate::{NdrDecode, NdrElement, NdrEncode, NdrReader, NdrWriter, Result};

macro_rules! impl_ndr_primitive {
    ($($ty:ty: $size:expr, $put:ident, $get:ident;)*) => {
        $(
            impl NdrEncode for $ty {
                fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
                    w.$put(*self);
                    Ok(())
                }

                fn ndr_align() -> usize {
                    $size
                }
            }

            impl NdrDecode for $ty {
                fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
                    r.$get()
                }

                fn ndr_align() -> usize {
                    $size
                }
            }

            impl NdrElement for $ty {
                const WIDTH: u32 = $size;
            }
        )*
    };
}

impl_ndr_primitive! {
    u8: 1, put_u8, get_u8;
    i8: 1, put_i8, get_i8;
    u16: 2, put_u16, get_u16;
    i16: 2, put_i16, get_i16;
    u32: 4, put_u32, get_u32;
    i32: 4, put_i32, get_i32;
    u64: 8, put_u64, get_u64;
    i64: 8, put_i64, get_i64;
    f32: 4, put_f32, get_f32;
    f64: 8, put_f64, get_f64;
}

/// NDR boolean - a single byte, any nonzero value decodes as true
impl NdrEncode for bool {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.put_u8(u8::from(*self));
        Ok(())
    }
}

impl NdrDecode for bool {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        Ok(r.get_u8()? != 0)
    }
}

impl NdrElement for bool {
    const WIDTH: u32 = 1;
}

/// Empty parameter list; occupies no bytes
impl NdrEncode for () {
    fn ndr_encode(&self, _w: &mut NdrWriter) -> Result<()> {
        Ok(())
    }
}

impl NdrDecode for () {
    fn ndr_decode(_r: &mut NdrReader) -> Result<Self> {
        Ok(())
    }
}

/// Automation boolean: 16 bits, `0xFFFF` for true and `0` for false.
///
/// Decoding treats any nonzero value as true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VariantBool(pub bool);

impl VariantBool {
    pub const TRUE: i16 = -1;
    pub const FALSE: i16 = 0;

    pub fn get(self) -> bool {
        self.0
    }
}

impl From<bool> for VariantBool {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl From<VariantBool> for bool {
    fn from(value: VariantBool) -> Self {
        value.0
    }
}

impl NdrEncode for VariantBool {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.put_i16(if self.0 { Self::TRUE } else { Self::FALSE });
        Ok(())
    }

    fn ndr_align() -> usize {
        2
    }
}

impl NdrDecode for VariantBool {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        Ok(Self(r.get_i16()? != Self::FALSE))
    }

    fn ndr_align() -> usize {
        2
    }
}

impl NdrElement for VariantBool {
    const WIDTH: u32 = 2;
}

/// GUID in its NDR field layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Uuid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Uuid {
    pub const NIL: Self = Self {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };

    /// Build from the 128-bit value of the canonical textual form, so
    /// `from_u128(0x00000131_0000_0000_c000_000000000046)` reads like the
    /// GUID it names.
    pub const fn from_u128(v: u128) -> Self {
        Self {
            data1: (v >> 96) as u32,
            data2: (v >> 80) as u16,
            data3: (v >> 64) as u16,
            data4: [
                (v >> 56) as u8,
                (v >> 48) as u8,
                (v >> 40) as u8,
                (v >> 32) as u8,
                (v >> 24) as u8,
                (v >> 16) as u8,
                (v >> 8) as u8,
                v as u8,
            ],
        }
    }

    pub const fn as_u128(&self) -> u128 {
        ((self.data1 as u128) << 96)
            | ((self.data2 as u128) << 80)
            | ((self.data3 as u128) << 64)
            | (u64::from_be_bytes(self.data4) as u128)
    }

    /// Random (version 4) UUID
    pub fn generate() -> Self {
        Self::from_u128(uuid::Uuid::new_v4().as_u128())
    }

    /// Parse "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
    pub fn parse(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s.trim())
            .ok()
            .map(|u| Self::from_u128(u.as_u128()))
    }

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }
}

impl FromStr for Uuid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s.trim())
            .map(|u| Self::from_u128(u.as_u128()))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&uuid::Uuid::from_u128(self.as_u128()).hyphenated(), f)
    }
}

impl NdrEncode for Uuid {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.put_u32(self.data1);
        w.put_u16(self.data2);
        w.put_u16(self.data3);
        w.put_slice(&self.data4);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Uuid {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let data1 = r.get_u32()?;
        let data2 = r.get_u16()?;
        let data3 = r.get_u16()?;
        let tail = r.get_bytes(8)?;
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&tail);
        Ok(Self { data1, data2, data3, data4 })
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrElement for Uuid {
    const WIDTH: u32 = 16;
}
