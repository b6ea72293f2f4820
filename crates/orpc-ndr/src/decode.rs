//! NDR decoding trait

use crate::{NdrReader, Result};

/// Types that can be read from NDR format.
///
/// Mirrors [`NdrEncode`](crate::NdrEncode): `ndr_decode` reads the inline
/// representation and leaves non-null pointers pending, then
/// `ndr_decode_deferred` resolves them from the deferred region.
pub trait NdrDecode: Sized {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self>;

    fn ndr_decode_deferred(&mut self, _r: &mut NdrReader) -> Result<()> {
        Ok(())
    }

    fn ndr_align() -> usize {
        1
    }
}
