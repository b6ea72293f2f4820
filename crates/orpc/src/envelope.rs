//! Request and response framing
//!
//! ```text
//! request:  ORPCTHIS | in-parameters
//! response: ORPCTHAT | out-parameters | status
//! ```
//!
//! Each item is written as a top-level NDR item, so its deferred referents
//! follow it directly. The status is always the final four bytes.

use bytes::Bytes;
use orpc_ndr::{NdrContext, NdrDecode, NdrEncode, NdrReader, NdrWriter};

use crate::types::{OrpcThat, OrpcThis, Result, StatusCode};

pub fn encode_request<T: NdrEncode>(this: &OrpcThis, params: &T, ndr: NdrContext) -> Result<Bytes> {
    let mut w = NdrWriter::new(ndr);
    w.write(this)?;
    w.write(params)?;
    Ok(w.finish()?)
}

/// Decode ORPCTHIS and hand back a reader positioned at the in-parameters
pub fn open_request(stub: Bytes, ndr: NdrContext) -> Result<(OrpcThis, NdrReader)> {
    let mut r = NdrReader::new(stub, ndr);
    let this = r.read::<OrpcThis>()?;
    Ok((this, r))
}

pub fn encode_response<T: NdrEncode>(
    that: &OrpcThat,
    body: &T,
    status: StatusCode,
    ndr: NdrContext,
) -> Result<Bytes> {
    let mut w = NdrWriter::new(ndr);
    w.write(that)?;
    w.write(body)?;
    w.write(&status)?;
    Ok(w.finish()?)
}

/// A decoded response
///
/// Out-parameters are decoded whatever the status says; some operations
/// fill them in partially on failure.
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub that: OrpcThat,
    pub body: T,
    pub status: StatusCode,
}

pub fn decode_response<T: NdrDecode>(stub: Bytes, ndr: NdrContext) -> Result<Response<T>> {
    let mut r = NdrReader::new(stub, ndr);
    let that = r.read::<OrpcThat>()?;
    let body = r.read::<T>()?;
    let status = r.read::<StatusCode>()?;
    r.finish()?;
    Ok(Response { that, body, status })
}
