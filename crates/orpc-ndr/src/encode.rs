//! NDR encoding trait

use crate::{NdrWriter, Result};

/// Types that can be written in NDR format.
///
/// Encoding happens in two phases. [`ndr_encode`](NdrEncode::ndr_encode)
/// writes the inline representation, where a unique or full pointer is only
/// its referent ID. [`ndr_encode_deferred`](NdrEncode::ndr_encode_deferred)
/// then writes the referents of those pointers in the order they were
/// written. Types without embedded pointers only implement the first phase.
pub trait NdrEncode {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()>;

    fn ndr_encode_deferred(&self, _w: &mut NdrWriter) -> Result<()> {
        Ok(())
    }

    /// Alignment of the inline representation
    fn ndr_align() -> usize {
        1
    }
}
