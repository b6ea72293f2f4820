//! Typed operations
//!
//! An [`Operation`] ties an opnum on an interface to its request and
//! response parameter types. Clients invoke operations by type; servers
//! register handlers by type.

use orpc_ndr::{NdrDecode, NdrEncode};

use super::descriptor::InterfaceDescriptor;

pub trait Operation: Send + Sync + 'static {
    /// Interface that declares the operation
    const INTERFACE: &'static InterfaceDescriptor;
    const OPNUM: u16;
    /// Member name, e.g. `Run`
    const MEMBER: &'static str;

    /// In-parameters, encoded after ORPCTHIS
    type Request: NdrEncode + NdrDecode + Send + Sync + 'static;

    /// Out-parameters, encoded between ORPCTHAT and the status.
    ///
    /// `Default` supplies the out-parameters of a failure reply that has
    /// nothing partial to report.
    type Response: NdrEncode + NdrDecode + Default + Send + 'static;

    /// `/Interface/vN/Member`
    fn name() -> String {
        Self::INTERFACE.operation_name(Self::MEMBER)
    }
}

/// Declare unit types implementing [`Operation`].
///
/// ```
/// use orpc::dispatch::{well_known::IDISPATCH, InterfaceDescriptor, Operation};
/// use orpc::types::InterfaceId;
///
/// const ICOUNTER: InterfaceDescriptor =
///     InterfaceDescriptor::new("ICounter", InterfaceId::from_u128(0x42), Some(&IDISPATCH), 1);
///
/// orpc::orpc_operations! {
///     /// Current value
///     pub Value(ICOUNTER, 7): () => u32;
/// }
///
/// assert_eq!(Value::name(), "/ICounter/v0/Value");
/// ```
#[macro_export]
macro_rules! orpc_operations {
    (
        $(
            $(#[$meta:meta])*
            $vis:vis $name:ident ($iface:path, $opnum:literal): $req:ty => $resp:ty;
        )+
    ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default)]
            $vis struct $name;

            impl $crate::dispatch::Operation for $name {
                const INTERFACE: &'static $crate::dispatch::InterfaceDescriptor = &$iface;
                const OPNUM: u16 = $opnum;
                const MEMBER: &'static str = stringify!($name);
                type Request = $req;
                type Response = $resp;
            }
        )+
    };
}
