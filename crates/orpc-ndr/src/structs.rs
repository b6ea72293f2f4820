//! NDR structures
//!
//! A structure is aligned to its most-aligned member. Members are written
//! inline in declaration order, each at its own alignment; the deferred
//! region then carries every member's referents, again in declaration order.

/// Declare a structure together with its NDR codec.
///
/// ```
/// use orpc_ndr::{BString, UniquePtr};
///
/// orpc_ndr::ndr_struct! {
///     #[derive(Debug, Clone, PartialEq, Default)]
///     pub struct Entry {
///         pub id: u32,
///         pub label: UniquePtr<BString>,
///     }
/// }
///
/// let entry = Entry { id: 3, label: UniquePtr::new(BString::new("x")) };
/// let bytes = orpc_ndr::encode(&entry, orpc_ndr::NdrContext::new()).unwrap();
/// let back: Entry = orpc_ndr::decode(bytes, orpc_ndr::NdrContext::new()).unwrap();
/// assert_eq!(back, entry);
/// ```
#[macro_export]
macro_rules! ndr_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $ty ),+
        }

        impl $crate::NdrEncode for $name {
            fn ndr_encode(&self, w: &mut $crate::NdrWriter) -> $crate::Result<()> {
                w.align(<Self as $crate::NdrEncode>::ndr_align());
                $(
                    w.align(<$ty as $crate::NdrEncode>::ndr_align());
                    $crate::NdrEncode::ndr_encode(&self.$field, w)?;
                )+
                Ok(())
            }

            fn ndr_encode_deferred(&self, w: &mut $crate::NdrWriter) -> $crate::Result<()> {
                $( $crate::NdrEncode::ndr_encode_deferred(&self.$field, w)?; )+
                Ok(())
            }

            fn ndr_align() -> usize {
                let mut align = 1;
                $( align = align.max(<$ty as $crate::NdrEncode>::ndr_align()); )+
                align
            }
        }

        impl $crate::NdrDecode for $name {
            fn ndr_decode(r: &mut $crate::NdrReader) -> $crate::Result<Self> {
                r.align(<Self as $crate::NdrDecode>::ndr_align())?;
                Ok(Self {
                    $(
                        $field: {
                            r.align(<$ty as $crate::NdrDecode>::ndr_align())?;
                            <$ty as $crate::NdrDecode>::ndr_decode(r)?
                        },
                    )+
                })
            }

            fn ndr_decode_deferred(&mut self, r: &mut $crate::NdrReader) -> $crate::Result<()> {
                $( $crate::NdrDecode::ndr_decode_deferred(&mut self.$field, r)?; )+
                Ok(())
            }

            fn ndr_align() -> usize {
                let mut align = 1;
                $( align = align.max(<$ty as $crate::NdrDecode>::ndr_align()); )+
                align
            }
        }
    };
}
