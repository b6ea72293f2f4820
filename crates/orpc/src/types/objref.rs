//! OBJREF and embedded interface pointers
//!
//! An interface pointer travels inside a message as an `MInterfacePointer`:
//! a counted byte blob whose contents are an OBJREF. The OBJREF itself is
//! always little-endian, whatever the byte order of the enclosing message.
//! Only the standard variant is produced or accepted:
//!
//! ```text
//! signature: u32      # "MEOW"
//! flags: u32          # OBJREF_STANDARD
//! iid: GUID
//! std: STDOBJREF
//! resolver: DUALSTRINGARRAY  # written empty
//! ```

use bytes::Bytes;
use orpc_ndr::{
    NdrContext, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Uuid, MAX_NDR_ALLOCATION_SIZE,
};

use super::error::{OrpcError, Result};
use super::stdobjref::StdObjRef;

/// OBJREF signature, "MEOW" read as a little-endian u32
pub const OBJREF_SIGNATURE: u32 = 0x574F_454D;

pub mod objref_flags {
    pub const OBJREF_STANDARD: u32 = 0x0000_0001;
    pub const OBJREF_HANDLER: u32 = 0x0000_0002;
    pub const OBJREF_CUSTOM: u32 = 0x0000_0004;
    pub const OBJREF_EXTENDED: u32 = 0x0000_0008;
}

/// Standard OBJREF
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjRef {
    /// Interface the reference is for
    pub iid: Uuid,
    pub std: StdObjRef,
}

impl ObjRef {
    pub fn new(iid: Uuid, std: StdObjRef) -> Self {
        Self { iid, std }
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut w = NdrWriter::with_capacity(NdrContext::new(), 72);
        w.put_u32(OBJREF_SIGNATURE);
        w.put_u32(objref_flags::OBJREF_STANDARD);
        w.write(&self.iid)?;
        w.write(&self.std)?;
        // empty DUALSTRINGARRAY
        w.put_u16(0);
        w.put_u16(0);
        Ok(w.finish()?)
    }

    pub fn from_bytes(bytes: Bytes) -> Result<Self> {
        let mut r = NdrReader::new(bytes, NdrContext::new());

        let signature = r.get_u32()?;
        if signature != OBJREF_SIGNATURE {
            return Err(OrpcError::InvalidObjRef(format!(
                "bad signature 0x{:08x}",
                signature
            )));
        }
        let flags = r.get_u32()?;
        if flags != objref_flags::OBJREF_STANDARD {
            return Err(OrpcError::InvalidObjRef(format!(
                "unsupported OBJREF flags 0x{:x}",
                flags
            )));
        }

        let iid = r.read::<Uuid>()?;
        let std = r.read::<StdObjRef>()?;

        // Resolver bindings are not used; skip whatever the sender put there.
        let entries = r.get_u16()?;
        let _security_offset = r.get_u16()?;
        r.get_bytes(usize::from(entries) * 2)?;
        r.finish()?;

        Ok(Self { iid, std })
    }
}

/// Marshaled interface pointer (`MInterfacePointer`)
///
/// Wire format:
/// ```text
/// max_count: u32
/// ulCntData: u32
/// abData[ulCntData]   # OBJREF
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfacePointer {
    objref: ObjRef,
}

impl InterfacePointer {
    pub fn new(objref: ObjRef) -> Self {
        Self { objref }
    }

    pub fn objref(&self) -> &ObjRef {
        &self.objref
    }

    pub fn into_objref(self) -> ObjRef {
        self.objref
    }
}

fn codec_error(err: OrpcError) -> NdrError {
    match err {
        OrpcError::Codec(err) => err,
        other => NdrError::ShapeMismatch(other.to_string()),
    }
}

impl NdrEncode for InterfacePointer {
    fn ndr_encode(&self, w: &mut NdrWriter) -> orpc_ndr::Result<()> {
        let data = self.objref.to_bytes().map_err(codec_error)?;
        let len = u32::try_from(data.len())
            .map_err(|_| NdrError::IntegerOverflow)?;
        w.put_u32(len);
        w.put_u32(len);
        w.put_slice(&data);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for InterfacePointer {
    fn ndr_decode(r: &mut NdrReader) -> orpc_ndr::Result<Self> {
        let max_count = r.get_u32()?;
        let len = r.get_u32()?;
        if len != max_count {
            return Err(NdrError::ConformanceMismatch {
                max_count,
                actual_count: len,
            });
        }
        let len = len as usize;
        if len > MAX_NDR_ALLOCATION_SIZE {
            return Err(NdrError::AllocationLimitExceeded {
                requested: len,
                limit: MAX_NDR_ALLOCATION_SIZE,
            });
        }
        let data = r.get_bytes(len)?;
        let objref = ObjRef::from_bytes(data).map_err(codec_error)?;
        Ok(Self { objref })
    }

    fn ndr_align() -> usize {
        4
    }
}
