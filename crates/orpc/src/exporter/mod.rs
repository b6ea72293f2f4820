//! Object exporter: exported objects, IPIDs and remote reference counts

mod object_exporter;
mod tables;

pub use object_exporter::{ExportedObject, ObjectBinding, ObjectExporter, DEFAULT_PUBLIC_REFS};
pub use tables::IpidEntry;
