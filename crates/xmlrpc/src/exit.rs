use std::fmt;

use xmlrpc_client::ClientError;
use xmlrpc_codec::CodecError;
use xmlrpc_transport::TransportError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PROTOCOL_FAULT: i32 = 4;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Timeout(_) => TIMEOUT,
        TransportError::Http(source) if source.is_timeout() => TIMEOUT,
        TransportError::InvalidUrl { .. } => USAGE,
        TransportError::BodyTooLarge { .. } => DATA_INVALID,
        TransportError::Closed => FAILURE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    let code = match &err {
        CodecError::Fault(_) | CodecError::MulticallFault(_) => PROTOCOL_FAULT,
        CodecError::UnsupportedType(_) => USAGE,
        CodecError::Malformed(_)
        | CodecError::InvalidScalar { .. }
        | CodecError::TypeMismatch { .. }
        | CodecError::StructuralMismatch(_) => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Transport(err) => transport_error(context, err),
        ClientError::Codec(err) => codec_error(context, err),
        ClientError::Closed => {
            CliError::new(FAILURE, format!("{context}: {}", ClientError::Closed))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
