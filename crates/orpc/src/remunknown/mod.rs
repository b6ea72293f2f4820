//! IRemUnknown: remote QueryInterface and reference counting

mod client;
mod protocol;
mod server;

pub use client::RemUnknownClient;
pub use protocol::{
    RemAddRef, RemInterfaceRef, RemQiResult, RemQueryInterface, RemQueryInterfaceRequest,
    RemRefsRequest, RemRelease, IREMUNKNOWN,
};
pub use server::remunknown_table;
