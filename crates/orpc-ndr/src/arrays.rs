//! NDR array types
//!
//! - Fixed arrays: size known at compile time, elements only.
//! - Conformant arrays: `max_count` prefix, then the elements.
//! - Conformant varying arrays: `max_count`, `offset`, `actual_count`, then
//!   the transmitted elements.
//! - Counted arrays: `count` and element width, then the elements. This is
//!   the self-describing buffer used for variable-length vectors; an absent
//!   vector is a null pointer to one.
//!
//! Elements are written inline one after another. Pointers embedded in the
//! elements have their referents written after the whole array, in element
//! order.

use crate::error::MAX_NDR_ARRAY_ELEMENTS;
use crate::{FullPtr, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result, UniquePtr};

/// Element with a fixed inline width, usable in a [`CountedArray`]
pub trait NdrElement: NdrEncode + NdrDecode {
    /// Bytes one element occupies inline, excluding alignment padding
    const WIDTH: u32;
}

impl<T: NdrEncode + NdrDecode> NdrElement for UniquePtr<T> {
    const WIDTH: u32 = 4;
}

impl<T: NdrEncode + NdrDecode> NdrElement for FullPtr<T> {
    const WIDTH: u32 = 4;
}

fn element_count(count: u32) -> Result<usize> {
    let count = count as usize;
    if count > MAX_NDR_ARRAY_ELEMENTS {
        return Err(NdrError::AllocationLimitExceeded {
            requested: count,
            limit: MAX_NDR_ARRAY_ELEMENTS,
        });
    }
    Ok(count)
}

fn wire_count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| NdrError::IntegerOverflow)
}

fn encode_elements<T: NdrEncode>(elements: &[T], w: &mut NdrWriter) -> Result<()> {
    for elem in elements {
        w.align(<T as NdrEncode>::ndr_align());
        elem.ndr_encode(w)?;
    }
    Ok(())
}

fn encode_elements_deferred<T: NdrEncode>(elements: &[T], w: &mut NdrWriter) -> Result<()> {
    for elem in elements {
        elem.ndr_encode_deferred(w)?;
    }
    Ok(())
}

fn decode_elements<T: NdrDecode>(r: &mut NdrReader, count: usize) -> Result<Vec<T>> {
    let mut elements = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        r.align(<T as NdrDecode>::ndr_align())?;
        elements.push(T::ndr_decode(r)?);
    }
    Ok(elements)
}

fn decode_elements_deferred<T: NdrDecode>(elements: &mut [T], r: &mut NdrReader) -> Result<()> {
    for elem in elements {
        elem.ndr_decode_deferred(r)?;
    }
    Ok(())
}

/// Fixed-size array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedArray<T, const N: usize> {
    pub elements: [T; N],
}

impl<T: Default + Copy, const N: usize> Default for FixedArray<T, N> {
    fn default() -> Self {
        Self {
            elements: [T::default(); N],
        }
    }
}

impl<T, const N: usize> FixedArray<T, N> {
    pub fn new(elements: [T; N]) -> Self {
        Self { elements }
    }
}

impl<T: NdrEncode, const N: usize> NdrEncode for FixedArray<T, N> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        encode_elements(&self.elements, w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        encode_elements_deferred(&self.elements, w)
    }

    fn ndr_align() -> usize {
        <T as NdrEncode>::ndr_align()
    }
}

impl<T: NdrDecode, const N: usize> NdrDecode for FixedArray<T, N> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let elements: Vec<T> = decode_elements(r, N)?;
        let got = elements.len();
        let elements = elements
            .try_into()
            .map_err(|_| NdrError::ArraySizeMismatch { expected: N, got })?;
        Ok(Self { elements })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        decode_elements_deferred(&mut self.elements, r)
    }

    fn ndr_align() -> usize {
        <T as NdrDecode>::ndr_align()
    }
}

/// Conformant array
///
/// Wire format:
/// ```text
/// max_count: u32
/// elements[max_count]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantArray<T> {
    pub elements: Vec<T>,
}

impl<T> ConformantArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }
}

impl<T> From<Vec<T>> for ConformantArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self { elements }
    }
}

impl<T: NdrEncode> NdrEncode for ConformantArray<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.put_u32(wire_count(self.elements.len())?);
        encode_elements(&self.elements, w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        encode_elements_deferred(&self.elements, w)
    }

    fn ndr_align() -> usize {
        4.max(<T as NdrEncode>::ndr_align())
    }
}

impl<T: NdrDecode> NdrDecode for ConformantArray<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let count = element_count(r.get_u32()?)?;
        decode_elements(r, count).map(Self::new)
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        decode_elements_deferred(&mut self.elements, r)
    }

    fn ndr_align() -> usize {
        4.max(<T as NdrDecode>::ndr_align())
    }
}

/// Conformant varying array
///
/// Wire format:
/// ```text
/// max_count: u32
/// offset: u32
/// actual_count: u32
/// elements[actual_count]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantVaryingArray<T> {
    pub max_count: u32,
    pub offset: u32,
    pub elements: Vec<T>,
}

impl<T> ConformantVaryingArray<T> {
    /// Array whose transmitted elements fill its whole capacity
    pub fn new(elements: Vec<T>) -> Self {
        Self {
            max_count: elements.len() as u32,
            offset: 0,
            elements,
        }
    }

    pub fn with_capacity(max_count: u32, offset: u32, elements: Vec<T>) -> Self {
        Self {
            max_count,
            offset,
            elements,
        }
    }
}

impl<T: NdrEncode> NdrEncode for ConformantVaryingArray<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        let actual_count = wire_count(self.elements.len())?;
        let end = self
            .offset
            .checked_add(actual_count)
            .ok_or(NdrError::IntegerOverflow)?;
        if end > self.max_count {
            return Err(NdrError::ConformanceMismatch {
                max_count: self.max_count,
                actual_count,
            });
        }

        w.put_u32(self.max_count);
        w.put_u32(self.offset);
        w.put_u32(actual_count);
        encode_elements(&self.elements, w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        encode_elements_deferred(&self.elements, w)
    }

    fn ndr_align() -> usize {
        4.max(<T as NdrEncode>::ndr_align())
    }
}

impl<T: NdrDecode> NdrDecode for ConformantVaryingArray<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let max_count = r.get_u32()?;
        let offset = r.get_u32()?;
        let actual_count = r.get_u32()?;

        match offset.checked_add(actual_count) {
            Some(end) if end <= max_count => {}
            _ => return Err(NdrError::ConformanceMismatch { max_count, actual_count }),
        }

        let elements = decode_elements(r, element_count(actual_count)?)?;
        Ok(Self {
            max_count,
            offset,
            elements,
        })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        decode_elements_deferred(&mut self.elements, r)
    }

    fn ndr_align() -> usize {
        4.max(<T as NdrDecode>::ndr_align())
    }
}

/// Self-describing array: element count and element width, then elements.
///
/// ```text
/// count: u32
/// width: u32
/// elements[count]
/// ```
///
/// A decoded width that differs from `T::WIDTH` means the sender and the
/// receiver disagree about the element type, and is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountedArray<T> {
    pub elements: Vec<T>,
}

impl<T> CountedArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }
}

impl<T> From<Vec<T>> for CountedArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self { elements }
    }
}

impl<T: NdrElement> NdrEncode for CountedArray<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.put_u32(wire_count(self.elements.len())?);
        w.put_u32(T::WIDTH);
        encode_elements(&self.elements, w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        encode_elements_deferred(&self.elements, w)
    }

    fn ndr_align() -> usize {
        4.max(<T as NdrEncode>::ndr_align())
    }
}

impl<T: NdrElement> NdrDecode for CountedArray<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let count = element_count(r.get_u32()?)?;
        let width = r.get_u32()?;
        if width != T::WIDTH {
            return Err(NdrError::ElementWidthMismatch {
                expected: T::WIDTH,
                found: width,
            });
        }
        decode_elements(r, count).map(Self::new)
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        decode_elements_deferred(&mut self.elements, r)
    }

    fn ndr_align() -> usize {
        4.max(<T as NdrDecode>::ndr_align())
    }
}
