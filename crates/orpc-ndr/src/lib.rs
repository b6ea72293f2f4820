//! NDR (Network Data Representation) wire codec
//!
//! Values are encoded under fixed layout rules:
//! - Primitives align to their natural size (1, 2, 4, or 8 bytes)
//! - Structures align to their most-aligned member
//! - Enumerations are 16-bit ordinals over a closed set
//! - Unique and full pointers are a referent ID inline, with the referent in
//!   a deferred region that follows the item containing the pointer
//! - Strings and vectors carry their own counts
//!
//! Typed values implement [`NdrEncode`] / [`NdrDecode`]. Values whose shape
//! is only known at run time use [`Shape`] and [`Value`].

mod arrays;
mod context;
mod decode;
mod encode;
mod enums;
mod error;
mod pointers;
mod primitives;
mod stream;
mod strings;
mod structs;
mod value;

pub use arrays::{ConformantArray, ConformantVaryingArray, CountedArray, FixedArray, NdrElement};
pub use context::NdrContext;
pub use decode::NdrDecode;
pub use encode::NdrEncode;
pub use error::{NdrError, Result, MAX_NDR_ALLOCATION_SIZE, MAX_NDR_ARRAY_ELEMENTS};
pub use pointers::{FullPtr, RefPtr, UniquePtr};
pub use primitives::{Uuid, VariantBool};
pub use stream::{NdrReader, NdrWriter, FIRST_REFERENT_ID};
pub use strings::{BString, NdrWString};
pub use value::{decode_value, encode_value, Field, PointerKind, Shape, StringForm, Value};

/// Re-export bytes for convenience
pub use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Encode a single item as a complete message
pub fn encode<T: NdrEncode>(value: &T, ctx: NdrContext) -> Result<Bytes> {
    let mut w = NdrWriter::new(ctx);
    w.write(value)?;
    w.finish()
}

/// Decode a complete message holding a single item
pub fn decode<T: NdrDecode>(bytes: Bytes, ctx: NdrContext) -> Result<T> {
    let mut r = NdrReader::new(bytes, ctx);
    let value = r.read()?;
    r.finish()?;
    Ok(value)
}
