//! Interface descriptors
//!
//! A descriptor names an interface, its base, and how many operations it
//! adds on top of the base. Opnums are contiguous: the base owns
//! `[0, base_range)` and the interface owns `[base_range, end)`.

use std::fmt;
use std::ops::Range;

use orpc_ndr::Uuid;

use crate::types::{operation_name, InterfaceId};

#[derive(Clone, Copy)]
pub struct InterfaceDescriptor {
    pub name: &'static str,
    pub id: InterfaceId,
    pub base: Option<&'static InterfaceDescriptor>,
    /// Operations declared by this interface itself
    pub operations: u16,
}

impl InterfaceDescriptor {
    pub const fn new(
        name: &'static str,
        id: InterfaceId,
        base: Option<&'static InterfaceDescriptor>,
        operations: u16,
    ) -> Self {
        Self {
            name,
            id,
            base,
            operations,
        }
    }

    /// Number of opnums owned by the base chain
    pub const fn base_range(&self) -> u16 {
        match self.base {
            Some(base) => base.end(),
            None => 0,
        }
    }

    /// One past the last opnum of this interface
    pub const fn end(&self) -> u16 {
        self.base_range() + self.operations
    }

    /// Opnums declared by this interface
    pub fn local_range(&self) -> Range<u16> {
        self.base_range()..self.end()
    }

    pub fn owns(&self, opnum: u16) -> bool {
        self.local_range().contains(&opnum)
    }

    /// This interface followed by its bases, most-derived first
    pub fn chain(&self) -> impl Iterator<Item = &InterfaceDescriptor> + '_ {
        std::iter::successors(Some(self), |d| d.base)
    }

    /// Whether `iid` names this interface or one of its bases
    pub fn derives_from(&self, iid: &Uuid) -> bool {
        self.chain().any(|d| d.id.uuid == *iid)
    }

    /// Diagnostic name of a member, `/IJob/v1/Run`
    pub fn operation_name(&self, member: &str) -> String {
        operation_name(self.name, self.id.major, member)
    }
}

impl PartialEq for InterfaceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for InterfaceDescriptor {}

impl fmt::Debug for InterfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}..{})", self.name, self.base_range(), self.end())
    }
}
