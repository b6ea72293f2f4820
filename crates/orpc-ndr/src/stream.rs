//! Two-phase message streams
//!
//! A message is written as a sequence of top-level items. Each item is
//! written inline first; the referents of any non-null unique or full
//! pointers it contains follow in its deferred region, in the order the
//! pointers were written. A referent that itself contains pointers emits
//! its own referents immediately after its body, so nested referents always
//! follow their enclosing referent.
//!
//! The reader mirrors the writer and keeps the same two counters, so a
//! message whose pointers and referents disagree is rejected rather than
//! silently truncated.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{NdrContext, NdrDecode, NdrEncode, NdrError, Result};

/// First referent ID handed out by a writer. Subsequent IDs step by 4.
pub const FIRST_REFERENT_ID: u32 = 0x0002_0000;

macro_rules! writer_primitives {
    ($($put:ident: $ty:ty, $size:expr;)*) => {
        $(
            pub fn $put(&mut self, value: $ty) {
                self.align($size);
                self.ctx.$put(&mut self.buf, value);
            }
        )*
    };
}

macro_rules! reader_primitives {
    ($($get:ident: $ty:ty, $size:expr;)*) => {
        $(
            pub fn $get(&mut self) -> Result<$ty> {
                self.align($size)?;
                self.ensure($size)?;
                self.consumed += $size;
                Ok(self.ctx.$get(&mut self.buf))
            }
        )*
    };
}

/// Message writer tracking alignment and pointer/referent balance
#[derive(Debug)]
pub struct NdrWriter {
    buf: BytesMut,
    ctx: NdrContext,
    next_referent: u32,
    pointers: usize,
    referents: usize,
}

impl NdrWriter {
    pub fn new(ctx: NdrContext) -> Self {
        Self::with_capacity(ctx, 256)
    }

    pub fn with_capacity(ctx: NdrContext, capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            ctx,
            next_referent: FIRST_REFERENT_ID,
            pointers: 0,
            referents: 0,
        }
    }

    pub fn context(&self) -> NdrContext {
        self.ctx
    }

    /// Offset from the start of the message
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn align(&mut self, alignment: usize) {
        let padding = NdrContext::align_padding(self.buf.len(), alignment);
        self.buf.put_bytes(0, padding);
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    writer_primitives! {
        put_u16: u16, 2;
        put_i16: i16, 2;
        put_u32: u32, 4;
        put_i32: i32, 4;
        put_u64: u64, 8;
        put_i64: i64, 8;
        put_f32: f32, 4;
        put_f64: f64, 8;
    }

    pub fn put_slice(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    /// Write a referent ID for a unique or full pointer.
    ///
    /// Returns the ID written, 0 for a null pointer.
    pub fn put_pointer(&mut self, present: bool) -> u32 {
        if !present {
            self.put_u32(0);
            return 0;
        }
        let id = self.next_referent;
        self.next_referent = self.next_referent.wrapping_add(4);
        self.pointers += 1;
        self.put_u32(id);
        id
    }

    /// Mark the start of a referent body in the deferred region
    pub fn enter_referent(&mut self) {
        self.referents += 1;
    }

    /// Write one top-level item: its inline part, then its deferred region
    pub fn write<T: NdrEncode>(&mut self, value: &T) -> Result<()> {
        value.ndr_encode(self)?;
        value.ndr_encode_deferred(self)
    }

    /// Non-null pointers written so far
    pub fn pointer_count(&self) -> usize {
        self.pointers
    }

    /// Referent bodies written so far
    pub fn referent_count(&self) -> usize {
        self.referents
    }

    /// Finish the message, checking that every pointer got its referent
    pub fn finish(self) -> Result<Bytes> {
        if self.pointers != self.referents {
            return Err(NdrError::PointerCountMismatch {
                expected: self.pointers,
                found: self.referents,
            });
        }
        Ok(self.buf.freeze())
    }
}

/// Message reader mirroring [`NdrWriter`]
#[derive(Debug)]
pub struct NdrReader {
    buf: Bytes,
    ctx: NdrContext,
    consumed: usize,
    pointer_slots: usize,
    pointers: usize,
    referents: usize,
}

impl NdrReader {
    pub fn new(buf: Bytes, ctx: NdrContext) -> Self {
        Self {
            buf,
            ctx,
            consumed: 0,
            pointer_slots: 0,
            pointers: 0,
            referents: 0,
        }
    }

    pub fn context(&self) -> NdrContext {
        self.ctx
    }

    pub fn position(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(NdrError::TruncatedInput {
                needed,
                have: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = NdrContext::align_padding(self.consumed, alignment);
        self.ensure(padding)?;
        self.buf.advance(padding);
        self.consumed += padding;
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        self.consumed += 1;
        Ok(self.buf.get_u8())
    }

    pub fn get_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        self.consumed += 1;
        Ok(self.buf.get_i8())
    }

    reader_primitives! {
        get_u16: u16, 2;
        get_i16: i16, 2;
        get_u32: u32, 4;
        get_i32: i32, 4;
        get_u64: u64, 8;
        get_i64: i64, 8;
        get_f32: f32, 4;
        get_f64: f64, 8;
    }

    /// Read `len` raw bytes
    pub fn get_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        self.consumed += len;
        Ok(self.buf.copy_to_bytes(len))
    }

    /// Read a referent ID; 0 means null
    pub fn get_pointer(&mut self) -> Result<u32> {
        let id = self.get_u32()?;
        self.pointer_slots += 1;
        if id != 0 {
            self.pointers += 1;
        }
        Ok(id)
    }

    /// Mark the start of a referent body in the deferred region
    pub fn enter_referent(&mut self) -> Result<()> {
        self.referents += 1;
        if self.referents > self.pointers {
            return Err(NdrError::PointerCountMismatch {
                expected: self.pointers,
                found: self.referents,
            });
        }
        Ok(())
    }

    /// Read one top-level item: inline part, then its deferred region
    pub fn read<T: NdrDecode>(&mut self) -> Result<T> {
        let mut value = T::ndr_decode(self)?;
        self.deferred(|r| value.ndr_decode_deferred(r))?;
        Ok(value)
    }

    /// Run a deferred-phase step. Exhausted input while referents are still
    /// owed is reported as a pointer mismatch.
    pub fn deferred<T>(&mut self, step: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        step(self).map_err(|err| match err {
            NdrError::TruncatedInput { .. } => NdrError::PointerCountMismatch {
                expected: self.pointers,
                found: self.referents.saturating_sub(1),
            },
            other => other,
        })
    }

    /// Finish the message, rejecting leftover bytes.
    ///
    /// Leftover bytes in a message that carried pointer slots mean there are
    /// more referent bodies than non-null pointers.
    pub fn finish(self) -> Result<()> {
        let left = self.buf.remaining();
        if left == 0 {
            return Ok(());
        }
        if self.pointer_slots > 0 {
            return Err(NdrError::PointerCountMismatch {
                expected: self.pointers,
                found: self.referents + 1,
            });
        }
        Err(NdrError::TrailingData(left))
    }
}
