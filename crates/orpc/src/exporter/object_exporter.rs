//! Core Object Exporter implementation
//!
//! The exporter owns every object a server has handed out: their dispatch
//! tables, their IPIDs, and the public references clients hold on them.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use orpc_ndr::Uuid;
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::tables::{ExportTables, IpidEntry};
use crate::dispatch::DispatchTable;
use crate::server::ServerStats;
use crate::types::{
    InterfaceId, InterfacePointer, Ipid, ObjRef, Oid, OrpcError, Oxid, Result, StdObjRef,
};

/// Public references handed out with each marshaled pointer by default
pub const DEFAULT_PUBLIC_REFS: u32 = 5;

/// Identity of a freshly exported object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportedObject {
    pub oid: Oid,
    pub ipid: Ipid,
    pub interface: InterfaceId,
}

/// Everything needed to route a call to an exported object
#[derive(Clone, Debug)]
pub struct ObjectBinding {
    pub ipid: Ipid,
    pub oid: Oid,
    pub interface: InterfaceId,
    /// Most-derived table of the object
    pub table: Arc<DispatchTable>,
}

/// Object Exporter - manages the objects of one server
pub struct ObjectExporter {
    oxid: Oxid,
    remunknown_ipid: Ipid,
    public_refs: u32,
    tables: RwLock<ExportTables>,
    stats: Arc<ServerStats>,
}

impl ObjectExporter {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_PUBLIC_REFS, Arc::new(ServerStats::default()))
    }

    /// `public_refs` is the number of references granted with each
    /// marshaled pointer
    pub fn with_config(public_refs: u32, stats: Arc<ServerStats>) -> Self {
        Self {
            oxid: Oxid::generate(),
            remunknown_ipid: Ipid::generate(),
            public_refs,
            tables: RwLock::new(ExportTables::default()),
            stats,
        }
    }

    pub fn oxid(&self) -> Oxid {
        self.oxid
    }

    /// IPID of this exporter's `IRemUnknown` object
    pub fn remunknown_ipid(&self) -> Ipid {
        self.remunknown_ipid
    }

    pub(crate) fn install_remunknown(&self, table: Arc<DispatchTable>) {
        self.tables
            .write()
            .insert_object(self.remunknown_ipid, table, true);
    }

    /// Export an object; it is reachable through one IPID for its
    /// most-derived interface
    pub fn export(&self, table: Arc<DispatchTable>) -> ExportedObject {
        let ipid = Ipid::generate();
        let interface = table.descriptor().id;
        let oid = self.tables.write().insert_object(ipid, table, false);

        self.stats.objects_exported.fetch_add(1, Ordering::Relaxed);
        debug!(%oid, %ipid, %interface, "object exported");

        ExportedObject {
            oid,
            ipid,
            interface,
        }
    }

    /// Marshal a pointer to `ipid`, granting the configured references
    pub fn marshal(&self, ipid: &Ipid) -> Result<InterfacePointer> {
        self.marshal_with_refs(ipid, self.public_refs)
    }

    pub fn marshal_with_refs(&self, ipid: &Ipid, refs: u32) -> Result<InterfacePointer> {
        let mut tables = self.tables.write();
        let entry = tables
            .ipid_mut(ipid)
            .ok_or(OrpcError::UnknownObject(*ipid))?;
        entry.public_refs = entry.public_refs.saturating_add(refs);

        let std = StdObjRef::new_noping(self.oxid, entry.oid, *ipid, refs);
        Ok(InterfacePointer::new(ObjRef::new(entry.interface.uuid, std)))
    }

    pub fn lookup(&self, ipid: &Ipid) -> Option<ObjectBinding> {
        let tables = self.tables.read();
        let entry = tables.ipid(ipid)?;
        let object = tables.object(&entry.oid)?;
        Some(ObjectBinding {
            ipid: *ipid,
            oid: entry.oid,
            interface: entry.interface,
            table: object.table.clone(),
        })
    }

    pub fn lookup_ipid(&self, ipid: &Ipid) -> Option<IpidEntry> {
        self.tables.read().ipid(ipid).cloned()
    }

    /// Query for an interface on the object behind `ipid`.
    ///
    /// Returns the IPID serving `iid` (created on first request) with
    /// `refs` more public references on it.
    pub fn query_interface(&self, ipid: &Ipid, iid: &Uuid, refs: u32) -> Result<StdObjRef> {
        let mut tables = self.tables.write();
        let oid = tables
            .ipid(ipid)
            .map(|e| e.oid)
            .ok_or(OrpcError::UnknownObject(*ipid))?;

        let interface = tables
            .object(&oid)
            .and_then(|o| o.table.node(iid))
            .map(|node| node.descriptor().id)
            .ok_or(OrpcError::InterfaceMismatch {
                ipid: *ipid,
                requested: InterfaceId::new(*iid, 0, 0),
            })?;

        let target = match tables.find_interface(&oid, iid) {
            Some(existing) => existing,
            None => {
                let created = tables
                    .add_interface(oid, interface)
                    .ok_or(OrpcError::UnknownObject(*ipid))?;
                debug!(%oid, ipid = %created, %interface, "interface added");
                created
            }
        };

        let entry = tables
            .ipid_mut(&target)
            .ok_or(OrpcError::UnknownObject(target))?;
        entry.public_refs = entry.public_refs.saturating_add(refs);
        Ok(StdObjRef::new_noping(self.oxid, oid, target, refs))
    }

    /// Add public references, returning the new count
    pub fn add_refs(&self, ipid: &Ipid, count: u32) -> Result<u32> {
        let mut tables = self.tables.write();
        let entry = tables
            .ipid_mut(ipid)
            .ok_or(OrpcError::UnknownObject(*ipid))?;
        entry.public_refs = entry.public_refs.saturating_add(count);
        Ok(entry.public_refs)
    }

    /// Release public references.
    ///
    /// The IPID is dropped when its count reaches zero, and the object with
    /// its last IPID. Returns whether the object was unexported.
    pub fn release_refs(&self, ipid: &Ipid, count: u32) -> Result<bool> {
        let mut tables = self.tables.write();
        let entry = tables
            .ipid_mut(ipid)
            .ok_or(OrpcError::UnknownObject(*ipid))?;

        if count > entry.public_refs {
            warn!(
                %ipid,
                held = entry.public_refs,
                released = count,
                "release exceeds public references"
            );
        }
        entry.public_refs = entry.public_refs.saturating_sub(count);
        if entry.public_refs > 0 {
            return Ok(false);
        }

        let oid = entry.oid;
        if tables.object(&oid).map_or(false, |o| o.pinned) {
            return Ok(false);
        }

        let removal = match tables.remove_interface(ipid) {
            Some(removal) => removal,
            None => return Ok(false),
        };
        debug!(%oid, %ipid, interface = %removal.entry.interface, "interface released");

        if removal.object_removed {
            self.stats.objects_released.fetch_add(1, Ordering::Relaxed);
            debug!(%oid, "object released");
        }
        Ok(removal.object_removed)
    }

    pub fn public_refs(&self, ipid: &Ipid) -> Option<u32> {
        self.tables.read().ipid(ipid).map(|e| e.public_refs)
    }

    /// Exported objects, `IRemUnknown` included
    pub fn object_count(&self) -> usize {
        self.tables.read().object_count()
    }

    pub fn interface_count(&self) -> usize {
        self.tables.read().interface_count()
    }
}

impl Default for ObjectExporter {
    fn default() -> Self {
        Self::new()
    }
}
