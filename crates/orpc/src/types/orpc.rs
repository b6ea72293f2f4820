//! ORPC call envelope (ORPCTHIS / ORPCTHAT)
//!
//! Every request starts with an [`OrpcThis`] and every response with an
//! [`OrpcThat`]. Both may carry an extension array, which is decoded and
//! handed to the receiver untouched.

use orpc_ndr::{
    ndr_struct, ConformantArray, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, UniquePtr,
    Uuid, MAX_NDR_ALLOCATION_SIZE,
};

ndr_struct! {
    /// COM protocol version
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ComVersion {
        pub major: u16,
        pub minor: u16,
    }
}

impl ComVersion {
    pub const DCOM_5_1: Self = Self { major: 5, minor: 1 };
    pub const DCOM_5_4: Self = Self { major: 5, minor: 4 };
    pub const DCOM_5_6: Self = Self { major: 5, minor: 6 };
    pub const DCOM_5_7: Self = Self { major: 5, minor: 7 };

    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl Default for ComVersion {
    fn default() -> Self {
        Self::DCOM_5_7
    }
}

impl std::fmt::Display for ComVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// ORPC extension
///
/// Conformant structure; the data array is padded to a multiple of 8:
/// ```text
/// max_count: u32   # (size + 7) & !7
/// id: GUID
/// size: u32
/// data[max_count]
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrpcExtent {
    pub id: Uuid,
    /// Unpadded extension data
    pub data: Vec<u8>,
}

impl OrpcExtent {
    pub fn new(id: Uuid, data: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }

    fn padded_len(size: u32) -> Option<u32> {
        size.checked_add(7).map(|n| n & !7)
    }
}

impl NdrEncode for OrpcExtent {
    fn ndr_encode(&self, w: &mut NdrWriter) -> orpc_ndr::Result<()> {
        let size = u32::try_from(self.data.len())
            .map_err(|_| NdrError::IntegerOverflow)?;
        let padded = Self::padded_len(size).ok_or(NdrError::IntegerOverflow)?;

        w.put_u32(padded);
        self.id.ndr_encode(w)?;
        w.put_u32(size);
        w.put_slice(&self.data);
        w.put_slice(&[0u8; 8][..(padded - size) as usize]);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for OrpcExtent {
    fn ndr_decode(r: &mut NdrReader) -> orpc_ndr::Result<Self> {
        let max_count = r.get_u32()?;
        let id = Uuid::ndr_decode(r)?;
        let size = r.get_u32()?;

        if Self::padded_len(size) != Some(max_count) {
            return Err(NdrError::ConformanceMismatch {
                max_count,
                actual_count: size,
            });
        }
        if max_count as usize > MAX_NDR_ALLOCATION_SIZE {
            return Err(NdrError::AllocationLimitExceeded {
                requested: max_count as usize,
                limit: MAX_NDR_ALLOCATION_SIZE,
            });
        }

        let mut data = r.get_bytes(max_count as usize)?.to_vec();
        data.truncate(size as usize);
        Ok(Self { id, data })
    }

    fn ndr_align() -> usize {
        4
    }
}

ndr_struct! {
    /// ORPC extension array
    ///
    /// `extent` points to `(size + 1) & !1` slots; slots past `size` are null.
    #[derive(Clone, Debug, PartialEq, Eq, Default)]
    pub struct OrpcExtentArray {
        pub size: u32,
        pub reserved: u32,
        pub extent: UniquePtr<ConformantArray<UniquePtr<OrpcExtent>>>,
    }
}

impl OrpcExtentArray {
    pub fn new(extents: Vec<OrpcExtent>) -> Self {
        let size = extents.len() as u32;
        let mut slots: Vec<UniquePtr<OrpcExtent>> =
            extents.into_iter().map(UniquePtr::new).collect();
        if slots.len() % 2 == 1 {
            slots.push(UniquePtr::null());
        }
        Self {
            size,
            reserved: 0,
            extent: UniquePtr::new(ConformantArray::new(slots)),
        }
    }

    /// Present extents, in order
    pub fn extents(&self) -> impl Iterator<Item = &OrpcExtent> + '_ {
        self.extent
            .get()
            .into_iter()
            .flat_map(|arr| arr.elements.iter())
            .filter_map(UniquePtr::get)
            .take(self.size as usize)
    }

    pub fn find(&self, id: &Uuid) -> Option<&OrpcExtent> {
        self.extents().find(|e| e.id == *id)
    }
}

ndr_struct! {
    /// Request envelope, the first item of every request
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct OrpcThis {
        pub version: ComVersion,
        /// Must be 0
        pub flags: u32,
        /// Must be 0
        pub reserved1: u32,
        /// Correlates the calls of one logical operation; diagnostic only
        pub causality_id: Uuid,
        pub extensions: UniquePtr<OrpcExtentArray>,
    }
}

impl OrpcThis {
    /// Envelope with a fresh causality id
    pub fn new() -> Self {
        Self::with_causality(Uuid::generate())
    }

    pub fn with_causality(causality_id: Uuid) -> Self {
        Self {
            version: ComVersion::default(),
            flags: 0,
            reserved1: 0,
            causality_id,
            extensions: UniquePtr::null(),
        }
    }

    pub fn with_version(mut self, version: ComVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_extensions(mut self, extensions: OrpcExtentArray) -> Self {
        self.extensions = UniquePtr::new(extensions);
        self
    }
}

impl Default for OrpcThis {
    fn default() -> Self {
        Self::new()
    }
}

ndr_struct! {
    /// Response envelope, the first item of every response
    #[derive(Clone, Debug, PartialEq, Eq, Default)]
    pub struct OrpcThat {
        /// Must be 0
        pub flags: u32,
        pub extensions: UniquePtr<OrpcExtentArray>,
    }
}

impl OrpcThat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions(extensions: OrpcExtentArray) -> Self {
        Self {
            flags: 0,
            extensions: UniquePtr::new(extensions),
        }
    }
}

/// Well-known extension ids
pub mod extent_ids {
    use orpc_ndr::Uuid;

    /// Extended error information
    pub const ERROR_INFO: Uuid = Uuid::from_u128(0x0000_031c_0000_0000_c000_0000_0000_0046);
}
