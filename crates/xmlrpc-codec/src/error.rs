use std::fmt;

use crate::value::WireKind;

/// A remote fault reported by the server inside `<methodResponse><fault>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fault {
    /// The server's `faultCode`.
    pub code: i64,
    /// The server's `faultString`.
    pub message: String,
}

impl Fault {
    /// Create a new fault.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fault({}): {}", self.code, self.message)
    }
}

/// A fault reported for one entry of a `system.multicall` batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticallFault {
    /// Zero-based position of the failing sub-call.
    pub index: usize,
    /// Method name of the failing sub-call, empty when unknown.
    pub method: String,
    /// The fault the server reported for that entry.
    pub fault: Fault,
}

impl fmt::Display for MulticallFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fault in call {} ({}): {}",
            self.index, self.method, self.fault
        )
    }
}

/// Errors produced while encoding values or decoding XML-RPC documents.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The document is not well-formed XML or breaks the XML-RPC grammar.
    #[error("malformed xml-rpc document: {0}")]
    Malformed(String),

    /// A scalar element holds text that does not parse as its declared type.
    #[error("invalid <{kind}> value {text:?}: {reason}")]
    InvalidScalar {
        kind: WireKind,
        text: String,
        reason: String,
    },

    /// The wire type cannot populate the requested destination type.
    #[error("type mismatch: cannot decode <{wire}> into {target}")]
    TypeMismatch {
        wire: WireKind,
        target: &'static str,
    },

    /// The value has no XML-RPC representation.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// The document or destination shape is inconsistent (arity, duplicate fields).
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    /// The server answered with a fault.
    #[error("{0}")]
    Fault(Fault),

    /// One entry of a multicall batch answered with a fault.
    #[error("{0}")]
    MulticallFault(MulticallFault),
}

impl CodecError {
    pub(crate) fn malformed(err: impl fmt::Display) -> Self {
        Self::Malformed(err.to_string())
    }

    /// Whether this error stems from a destination that cannot hold the wire value.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    /// The remote fault carried by this error, if any.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            Self::MulticallFault(fault) => Some(&fault.fault),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
