//! Status codes and protocol failures
//!
//! Every response ends with a 32-bit signed status. Zero is success; any
//! other value, including positive ones, is reported as a failure.

use std::fmt;

use orpc_ndr::{NdrDecode, NdrEncode, NdrReader, NdrWriter};

/// 32-bit signed status code carried at the end of every response
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusCode(pub i32);

impl StatusCode {
    /// From the unsigned form status codes are usually written in
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits as i32)
    }

    pub const fn bits(self) -> u32 {
        self.0 as u32
    }

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    pub const fn is_failure(self) -> bool {
        self.0 != 0
    }

    /// Symbolic name for codes in the [`hresult`] table
    pub fn name(self) -> Option<&'static str> {
        hresult::ALL
            .iter()
            .find(|(_, code)| *code == self)
            .map(|(name, _)| *name)
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusCode({})", self)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (0x{:08X})", name, self.bits()),
            None => write!(f, "0x{:08X}", self.bits()),
        }
    }
}

impl From<i32> for StatusCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl NdrEncode for StatusCode {
    fn ndr_encode(&self, w: &mut NdrWriter) -> orpc_ndr::Result<()> {
        w.put_i32(self.0);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for StatusCode {
    fn ndr_decode(r: &mut NdrReader) -> orpc_ndr::Result<Self> {
        r.get_i32().map(Self)
    }

    fn ndr_align() -> usize {
        4
    }
}

/// Status codes used by the substrate and the stock interfaces
pub mod hresult {
    use super::StatusCode;

    pub const S_OK: StatusCode = StatusCode(0);
    pub const S_FALSE: StatusCode = StatusCode(1);
    pub const E_NOTIMPL: StatusCode = StatusCode::from_bits(0x8000_4001);
    pub const E_NOINTERFACE: StatusCode = StatusCode::from_bits(0x8000_4002);
    pub const E_FAIL: StatusCode = StatusCode::from_bits(0x8000_4005);
    pub const E_INVALIDARG: StatusCode = StatusCode::from_bits(0x8007_0057);
    /// Object or server not available
    pub const CO_E_OBJNOTCONNECTED: StatusCode = StatusCode::from_bits(0x8004_01FD);
    pub const RPC_E_DISCONNECTED: StatusCode = StatusCode::from_bits(0x8001_0108);
    pub const NOT_FOUND: StatusCode = StatusCode::from_bits(0x8004_5301);
    pub const ALREADY_EXISTS: StatusCode = StatusCode::from_bits(0x8004_5303);
    pub const NOT_SUPPORTED: StatusCode = StatusCode::from_bits(0x8004_5311);
    pub const ALREADY_RUNNING: StatusCode = StatusCode::from_bits(0x8004_533D);

    pub(super) const ALL: &[(&str, StatusCode)] = &[
        ("S_OK", S_OK),
        ("S_FALSE", S_FALSE),
        ("E_NOTIMPL", E_NOTIMPL),
        ("E_NOINTERFACE", E_NOINTERFACE),
        ("E_FAIL", E_FAIL),
        ("E_INVALIDARG", E_INVALIDARG),
        ("CO_E_OBJNOTCONNECTED", CO_E_OBJNOTCONNECTED),
        ("RPC_E_DISCONNECTED", RPC_E_DISCONNECTED),
        ("NOT_FOUND", NOT_FOUND),
        ("ALREADY_EXISTS", ALREADY_EXISTS),
        ("NOT_SUPPORTED", NOT_SUPPORTED),
        ("ALREADY_RUNNING", ALREADY_RUNNING),
    ];
}

/// Nonzero failure status returned by an operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub code: StatusCode,
    /// Interface name, e.g. `IJob`
    pub interface: &'static str,
    /// Interface major version
    pub version: u16,
    /// Member name, e.g. `Run`
    pub operation: &'static str,
}

impl Failure {
    pub fn new(
        code: StatusCode,
        interface: &'static str,
        version: u16,
        operation: &'static str,
    ) -> Self {
        Self {
            code,
            interface,
            version,
            operation,
        }
    }

    /// Diagnostic operation name, `/IJob/v1/Run`
    pub fn operation_name(&self) -> String {
        operation_name(self.interface, self.version, self.operation)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation_name(), self.code)
    }
}

impl std::error::Error for Failure {}

/// `/InterfaceName/vMAJOR/Member`
pub fn operation_name(interface: &str, version: u16, member: &str) -> String {
    format!("/{}/v{}/{}", interface, version, member)
}
