//! NDR data representation
//!
//! The context carries the byte order negotiated for a message and the
//! alignment arithmetic shared by the writer and the reader.

use bytes::{Buf, BufMut};

/// NDR encoding/decoding context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdrContext {
    /// Whether multi-byte primitives use little-endian byte order
    pub little_endian: bool,
}

macro_rules! ordered_accessors {
    ($($ty:ty => $put:ident, $put_le:ident, $get:ident, $get_le:ident;)*) => {
        $(
            #[inline]
            pub fn $put<B: BufMut>(&self, buf: &mut B, value: $ty) {
                if self.little_endian {
                    buf.$put_le(value)
                } else {
                    buf.$put(value)
                }
            }

            #[inline]
            pub fn $get<B: Buf>(&self, buf: &mut B) -> $ty {
                if self.little_endian {
                    buf.$get_le()
                } else {
                    buf.$get()
                }
            }
        )*
    };
}

impl NdrContext {
    /// Little-endian context (the common case)
    pub fn new() -> Self {
        Self { little_endian: true }
    }

    pub fn big_endian() -> Self {
        Self { little_endian: false }
    }

    pub fn with_byte_order(little_endian: bool) -> Self {
        Self { little_endian }
    }

    /// Padding needed to bring `position` up to a multiple of `alignment`
    #[inline]
    pub fn align_padding(position: usize, alignment: usize) -> usize {
        if alignment <= 1 {
            return 0;
        }
        match position % alignment {
            0 => 0,
            rem => alignment - rem,
        }
    }

    ordered_accessors! {
        u16 => put_u16, put_u16_le, get_u16, get_u16_le;
        i16 => put_i16, put_i16_le, get_i16, get_i16_le;
        u32 => put_u32, put_u32_le, get_u32, get_u32_le;
        i32 => put_i32, put_i32_le, get_i32, get_i32_le;
        u64 => put_u64, put_u64_le, get_u64, get_u64_le;
        i64 => put_i64, put_i64_le, get_i64, get_i64_le;
        f32 => put_f32, put_f32_le, get_f32, get_f32_le;
        f64 => put_f64, put_f64_le, get_f64, get_f64_le;
    }
}

impl Default for NdrContext {
    fn default() -> Self {
        Self::new()
    }
}
