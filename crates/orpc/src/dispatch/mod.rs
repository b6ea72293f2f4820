//! Operation dispatch
//!
//! - [`InterfaceDescriptor`]: interface name, id, base, opnum range
//! - [`Operation`]: one typed opnum
//! - [`DispatchTable`]: handlers for one interface, chained to its base
//! - [`CallContext`] / [`Reply`]: what handlers receive and return

mod context;
mod descriptor;
mod operation;
mod table;
pub mod well_known;

pub use context::{CallContext, Reply};
pub use descriptor::InterfaceDescriptor;
pub use operation::Operation;
pub use table::{DispatchTable, DispatchTableBuilder, OperationHandler};
