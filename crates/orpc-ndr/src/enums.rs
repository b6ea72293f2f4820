//! NDR enumerations
//!
//! Enumerations travel as 16-bit ordinals regardless of how many variants
//! are declared. Decoding an ordinal outside the declared set is an error,
//! never a clamp to some default.

/// Declare a closed 16-bit enumeration with its NDR codec.
///
/// ```
/// orpc_ndr::ndr_enum! {
///     /// Traffic light
///     pub enum Light {
///         Red = 1,
///         Green = 2,
///     }
/// }
///
/// assert_eq!(Light::try_from(2).unwrap(), Light::Green);
/// assert!(Light::try_from(3).is_err());
/// ```
#[macro_export]
macro_rules! ndr_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Every declared variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn ordinal(self) -> u16 {
                self as u16
            }
        }

        impl ::core::convert::TryFrom<u16> for $name {
            type Error = $crate::NdrError;

            fn try_from(value: u16) -> $crate::Result<Self> {
                $(
                    if value == $name::$variant as u16 {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::NdrError::InvalidDiscriminant {
                    type_name: stringify!($name),
                    value: u32::from(value),
                })
            }
        }

        impl $crate::NdrEncode for $name {
            fn ndr_encode(&self, w: &mut $crate::NdrWriter) -> $crate::Result<()> {
                w.put_u16(*self as u16);
                Ok(())
            }

            fn ndr_align() -> usize {
                2
            }
        }

        impl $crate::NdrDecode for $name {
            fn ndr_decode(r: &mut $crate::NdrReader) -> $crate::Result<Self> {
                let ordinal = r.get_u16()?;
                <Self as ::core::convert::TryFrom<u16>>::try_from(ordinal)
            }

            fn ndr_align() -> usize {
                2
            }
        }

        impl $crate::NdrElement for $name {
            const WIDTH: u32 = 2;
        }
    };
}
