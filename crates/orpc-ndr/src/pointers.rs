//! NDR pointer types
//!
//! - Reference (`[ref]`): never null, the pointee is written inline.
//! - Unique (`[unique]`): nullable, a 4-byte referent ID inline and the
//!   pointee in the deferred region.
//! - Full (`[ptr]`): same wire form as unique. Aliasing is not tracked, so
//!   every non-null full pointer gets its own referent.

use std::ops::{Deref, DerefMut};

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

/// Reference pointer - non-null, data follows inline
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefPtr<T>(pub T);

impl<T> RefPtr<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for RefPtr<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for RefPtr<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: NdrEncode> NdrEncode for RefPtr<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.ndr_encode(w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.ndr_encode_deferred(w)
    }

    fn ndr_align() -> usize {
        <T as NdrEncode>::ndr_align()
    }
}

impl<T: NdrDecode> NdrDecode for RefPtr<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        T::ndr_decode(r).map(Self)
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.0.ndr_decode_deferred(r)
    }

    fn ndr_align() -> usize {
        <T as NdrDecode>::ndr_align()
    }
}

macro_rules! nullable_pointer {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name<T> {
            referent: Option<Box<T>>,
            // Set between the inline and deferred decode phases.
            pending: bool,
        }

        impl<T> $name<T> {
            pub fn new(value: T) -> Self {
                Self { referent: Some(Box::new(value)), pending: false }
            }

            pub fn null() -> Self {
                Self { referent: None, pending: false }
            }

            pub fn from_option(value: Option<T>) -> Self {
                Self { referent: value.map(Box::new), pending: false }
            }

            pub fn into_option(self) -> Option<T> {
                self.referent.map(|b| *b)
            }

            pub fn is_null(&self) -> bool {
                self.referent.is_none() && !self.pending
            }

            pub fn get(&self) -> Option<&T> {
                self.referent.as_deref()
            }

            pub fn get_mut(&mut self) -> Option<&mut T> {
                self.referent.as_deref_mut()
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self::null()
            }
        }

        impl<T> From<Option<T>> for $name<T> {
            fn from(value: Option<T>) -> Self {
                Self::from_option(value)
            }
        }

        impl<T: PartialEq> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.referent == other.referent
            }
        }

        impl<T: Eq> Eq for $name<T> {}

        impl<T: NdrEncode> NdrEncode for $name<T> {
            fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
                w.put_pointer(self.referent.is_some());
                Ok(())
            }

            fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
                if let Some(value) = &self.referent {
                    w.enter_referent();
                    value.ndr_encode(w)?;
                    value.ndr_encode_deferred(w)?;
                }
                Ok(())
            }

            fn ndr_align() -> usize {
                4
            }
        }

        impl<T: NdrDecode> NdrDecode for $name<T> {
            fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
                let id = r.get_pointer()?;
                Ok(Self { referent: None, pending: id != 0 })
            }

            fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
                if std::mem::take(&mut self.pending) {
                    r.enter_referent()?;
                    let mut value = T::ndr_decode(r)?;
                    value.ndr_decode_deferred(r)?;
                    self.referent = Some(Box::new(value));
                }
                Ok(())
            }

            fn ndr_align() -> usize {
                4
            }
        }
    };
}

nullable_pointer! {
    /// Unique pointer - nullable, no aliasing
    UniquePtr
}

nullable_pointer! {
    /// Full pointer - nullable; written exactly like [`UniquePtr`]
    FullPtr
}
