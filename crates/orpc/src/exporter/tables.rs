//! OID/IPID table management
//!
//! An object (OID) owns one dispatch table and one IPID per interface it
//! has been asked for. Public references are counted per IPID.

use std::collections::HashMap;
use std::sync::Arc;

use orpc_ndr::Uuid;

use crate::dispatch::DispatchTable;
use crate::types::{InterfaceId, Ipid, Oid};

/// Entry in the IPID table
#[derive(Clone, Debug)]
pub struct IpidEntry {
    pub ipid: Ipid,
    pub oid: Oid,
    /// Interface this IPID was created for
    pub interface: InterfaceId,
    pub public_refs: u32,
}

/// Entry in the OID table
#[derive(Debug)]
pub(crate) struct ObjectEntry {
    pub table: Arc<DispatchTable>,
    pub interfaces: Vec<Ipid>,
    /// Never unexported by a release
    pub pinned: bool,
}

/// Result of dropping an IPID
pub(crate) struct Removal {
    pub entry: IpidEntry,
    /// The object lost its last IPID and is gone
    pub object_removed: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ExportTables {
    objects: HashMap<Oid, ObjectEntry>,
    ipids: HashMap<Ipid, IpidEntry>,
}

impl ExportTables {
    /// Register a new object reachable through `ipid`
    pub fn insert_object(&mut self, ipid: Ipid, table: Arc<DispatchTable>, pinned: bool) -> Oid {
        let mut oid = Oid::generate();
        while self.objects.contains_key(&oid) {
            oid = Oid::generate();
        }

        let interface = table.descriptor().id;
        self.objects.insert(
            oid,
            ObjectEntry {
                table,
                interfaces: vec![ipid],
                pinned,
            },
        );
        self.ipids.insert(
            ipid,
            IpidEntry {
                ipid,
                oid,
                interface,
                public_refs: 0,
            },
        );
        oid
    }

    pub fn ipid(&self, ipid: &Ipid) -> Option<&IpidEntry> {
        self.ipids.get(ipid)
    }

    pub fn ipid_mut(&mut self, ipid: &Ipid) -> Option<&mut IpidEntry> {
        self.ipids.get_mut(ipid)
    }

    pub fn object(&self, oid: &Oid) -> Option<&ObjectEntry> {
        self.objects.get(oid)
    }

    /// IPID already serving `iid` on the object
    pub fn find_interface(&self, oid: &Oid, iid: &Uuid) -> Option<Ipid> {
        let object = self.objects.get(oid)?;
        object
            .interfaces
            .iter()
            .find(|ipid| {
                self.ipids
                    .get(ipid)
                    .map_or(false, |e| e.interface.uuid == *iid)
            })
            .copied()
    }

    /// Add an IPID for another interface of an existing object
    pub fn add_interface(&mut self, oid: Oid, interface: InterfaceId) -> Option<Ipid> {
        let object = self.objects.get_mut(&oid)?;
        let ipid = Ipid::generate();
        object.interfaces.push(ipid);
        self.ipids.insert(
            ipid,
            IpidEntry {
                ipid,
                oid,
                interface,
                public_refs: 0,
            },
        );
        Some(ipid)
    }

    pub fn remove_interface(&mut self, ipid: &Ipid) -> Option<Removal> {
        let entry = self.ipids.remove(ipid)?;
        let mut object_removed = false;
        if let Some(object) = self.objects.get_mut(&entry.oid) {
            object.interfaces.retain(|i| i != ipid);
            if object.interfaces.is_empty() {
                self.objects.remove(&entry.oid);
                object_removed = true;
            }
        }
        Some(Removal {
            entry,
            object_removed,
        })
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn interface_count(&self) -> usize {
        self.ipids.len()
    }
}
