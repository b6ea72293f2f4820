//! Base interfaces every object derives from
//!
//! `IUnknown` opnums are handled locally by the client runtime and are never
//! dispatched remotely; remote lifetime goes through `IRemUnknown` instead.
//! `IDispatch` answers `GetTypeInfoCount` with zero and rejects late binding.

use std::sync::Arc;

use bytes::Bytes;
use orpc_ndr::NdrReader;

use super::context::{CallContext, Reply};
use super::descriptor::InterfaceDescriptor;
use super::table::DispatchTable;
use crate::envelope::encode_response;
use crate::types::{hresult, iid, InterfaceId, OrpcThat, Result};

pub const IUNKNOWN: InterfaceDescriptor =
    InterfaceDescriptor::new("IUnknown", InterfaceId::new(iid::IUNKNOWN, 0, 0), None, 3);

pub const IDISPATCH: InterfaceDescriptor = InterfaceDescriptor::new(
    "IDispatch",
    InterfaceId::new(iid::IDISPATCH, 0, 0),
    Some(&IUNKNOWN),
    4,
);

crate::orpc_operations! {
    /// Number of type information interfaces the object provides
    pub GetTypeInfoCount(IDISPATCH, 3): () => u32;
}

/// Table for `IUnknown`: three opnums, none remotely callable
pub fn iunknown_table() -> Result<Arc<DispatchTable>> {
    DispatchTable::builder(&IUNKNOWN).build()
}

async fn not_implemented(ctx: CallContext, _params: NdrReader) -> Result<Bytes> {
    encode_response(&OrpcThat::new(), &(), hresult::E_NOTIMPL, ctx.ndr)
}

/// Table for `IDispatch` on top of [`iunknown_table`]
pub fn idispatch_table() -> Result<Arc<DispatchTable>> {
    DispatchTable::builder(&IDISPATCH)
        .inherits(iunknown_table()?)
        .operation::<GetTypeInfoCount, _, _>(|_ctx, ()| async { Ok(Reply::ok(0)) })
        .raw_operation(4, "GetTypeInfo", not_implemented)
        .raw_operation(5, "GetIDsOfNames", not_implemented)
        .raw_operation(6, "Invoke", not_implemented)
        .build()
}
