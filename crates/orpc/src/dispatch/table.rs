//! Dispatch tables
//!
//! Each interface has a flat table of the opnums it declares plus a link to
//! its base interface's table. Dispatch walks the chain from the
//! most-derived table: an opnum below a table's base range goes to the
//! base, anything else is looked up locally. A derived table never touches
//! its base's slots, so adding an interface leaves the base alone.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use orpc_ndr::{NdrReader, Uuid};
use tracing::{debug, trace};

use super::context::{CallContext, Reply};
use super::descriptor::InterfaceDescriptor;
use super::operation::Operation;
use crate::envelope::encode_response;
use crate::types::{OrpcError, OrpcThat, Result};

/// Operation handler: the in-parameter reader in, the response stub out
pub type OperationHandler = Arc<
    dyn Fn(CallContext, NdrReader) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send>>
        + Send
        + Sync,
>;

fn box_handler<F>(handler: F) -> OperationHandler
where
    F: Fn(CallContext, NdrReader) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(handler)
}

async fn call_typed<O, F, Fut>(
    handler: Arc<F>,
    ctx: CallContext,
    mut reader: NdrReader,
) -> Result<Bytes>
where
    O: Operation,
    F: Fn(CallContext, O::Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply<O::Response>>> + Send + 'static,
{
    let request = reader.read::<O::Request>()?;
    reader.finish()?;

    let ndr = ctx.ndr;
    let reply = handler(ctx, request).await?;
    if reply.status.is_failure() {
        debug!(operation = %O::name(), status = %reply.status, "operation failed");
    }
    encode_response(&OrpcThat::new(), &reply.body, reply.status, ndr)
}

struct Slot {
    member: &'static str,
    handler: OperationHandler,
}

/// Operation table for one interface, linked to its base's table
pub struct DispatchTable {
    descriptor: &'static InterfaceDescriptor,
    base: Option<Arc<DispatchTable>>,
    /// Indexed by `opnum - base_range`
    slots: Vec<Option<Slot>>,
}

impl DispatchTable {
    pub fn builder(descriptor: &'static InterfaceDescriptor) -> DispatchTableBuilder {
        DispatchTableBuilder {
            descriptor,
            base: None,
            slots: (0..descriptor.operations).map(|_| None).collect(),
            errors: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> &'static InterfaceDescriptor {
        self.descriptor
    }

    pub fn base(&self) -> Option<&Arc<DispatchTable>> {
        self.base.as_ref()
    }

    /// The table in this chain serving interface `iid`
    pub fn node(&self, iid: &Uuid) -> Option<&DispatchTable> {
        std::iter::successors(Some(self), |t| t.base.as_deref())
            .find(|t| t.descriptor.id.uuid == *iid)
    }

    pub fn implements(&self, iid: &Uuid) -> bool {
        self.node(iid).is_some()
    }

    fn resolve(&self, opnum: u16) -> Option<(&'static InterfaceDescriptor, &Slot)> {
        let mut table = self;
        loop {
            let base_range = table.descriptor.base_range();
            if opnum < base_range {
                table = table.base.as_deref()?;
                continue;
            }
            let slot = table.slots.get(usize::from(opnum - base_range))?.as_ref()?;
            return Some((table.descriptor, slot));
        }
    }

    /// Interface and member that would serve `opnum`
    pub fn lookup(&self, opnum: u16) -> Option<(&'static InterfaceDescriptor, &'static str)> {
        self.resolve(opnum)
            .map(|(descriptor, slot)| (descriptor, slot.member))
    }

    /// Route one call. `reader` is positioned just after ORPCTHIS.
    pub async fn dispatch(&self, ctx: CallContext, opnum: u16, reader: NdrReader) -> Result<Bytes> {
        let (owner, slot) = self.resolve(opnum).ok_or(OrpcError::UnknownOperation {
            interface: self.descriptor.name,
            opnum,
        })?;

        trace!(
            opnum,
            ipid = %ctx.ipid,
            causality = %ctx.causality_id,
            operation = %owner.operation_name(slot.member),
            "dispatching"
        );

        let handler = slot.handler.clone();
        handler(ctx, reader).await
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<_> = self.slots.iter().flatten().map(|s| s.member).collect();
        f.debug_struct("DispatchTable")
            .field("interface", &self.descriptor)
            .field("members", &members)
            .field("base", &self.base)
            .finish()
    }
}

/// Builder for [`DispatchTable`] with a fluent API
pub struct DispatchTableBuilder {
    descriptor: &'static InterfaceDescriptor,
    base: Option<Arc<DispatchTable>>,
    slots: Vec<Option<Slot>>,
    errors: Vec<String>,
}

impl DispatchTableBuilder {
    /// Table of the base interface; required whenever the descriptor has one
    pub fn inherits(mut self, base: Arc<DispatchTable>) -> Self {
        self.base = Some(base);
        self
    }

    /// Register a typed handler
    pub fn operation<O, F, Fut>(self, handler: F) -> Self
    where
        O: Operation,
        F: Fn(CallContext, O::Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply<O::Response>>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let wrapped = box_handler(move |ctx, reader| {
            Box::pin(call_typed::<O, F, Fut>(handler.clone(), ctx, reader))
        });
        self.register(O::INTERFACE, O::OPNUM, O::MEMBER, wrapped)
    }

    /// Register a handler that decodes its own parameters and encodes its
    /// own response
    pub fn raw_operation<F, Fut>(self, opnum: u16, member: &'static str, handler: F) -> Self
    where
        F: Fn(CallContext, NdrReader) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes>> + Send + 'static,
    {
        let descriptor = self.descriptor;
        let wrapped = box_handler(move |ctx, reader| Box::pin(handler(ctx, reader)));
        self.register(descriptor, opnum, member, wrapped)
    }

    fn register(
        mut self,
        owner: &'static InterfaceDescriptor,
        opnum: u16,
        member: &'static str,
        handler: OperationHandler,
    ) -> Self {
        if owner != self.descriptor {
            self.errors.push(format!(
                "{} is declared by {}, not {}",
                member, owner.name, self.descriptor.name
            ));
            return self;
        }
        if !self.descriptor.owns(opnum) {
            self.errors.push(format!(
                "opnum {} ({}) outside {:?}",
                opnum, member, self.descriptor
            ));
            return self;
        }

        let index = usize::from(opnum - self.descriptor.base_range());
        match &mut self.slots[index] {
            Some(existing) => {
                let message =
                    format!("opnum {} registered twice ({}, {})", opnum, existing.member, member);
                self.errors.push(message);
            }
            slot => *slot = Some(Slot { member, handler }),
        }
        self
    }

    pub fn build(self) -> Result<Arc<DispatchTable>> {
        let mut errors = self.errors;
        match (self.descriptor.base, &self.base) {
            (None, None) => {}
            (Some(expected), Some(table)) if *table.descriptor == *expected => {}
            (Some(expected), Some(table)) => errors.push(format!(
                "{} derives from {}, got a {} table",
                self.descriptor.name, expected.name, table.descriptor.name
            )),
            (Some(expected), None) => errors.push(format!(
                "{} needs a {} base table",
                self.descriptor.name, expected.name
            )),
            (None, Some(table)) => errors.push(format!(
                "{} has no base, got a {} table",
                self.descriptor.name, table.descriptor.name
            )),
        }

        if !errors.is_empty() {
            return Err(OrpcError::InvalidTable(errors.join("; ")));
        }

        Ok(Arc::new(DispatchTable {
            descriptor: self.descriptor,
            base: self.base,
            slots: self.slots,
        }))
    }
}
