//! The host's status representation.
//!
//! Every externally reachable entry point reports failure as a `Status`.
//! Success is `Ok(..)`; there is no "OK status" value in flight.

use std::fmt;

/// Failure codes of the host. Discriminants match the host's numbering,
/// where 0 is success and therefore has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Fail = 1,
    InvalidArgument = 2,
    NoSuchFile = 3,
    NoModel = 4,
    EngineError = 5,
    RuntimeException = 6,
    InvalidProtobuf = 7,
    ModelLoaded = 8,
    NotImplemented = 9,
    InvalidGraph = 10,
    EpFail = 11,
}

impl ErrorCode {
    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::Fail => "FAIL",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::NoSuchFile => "NO_SUCHFILE",
            ErrorCode::NoModel => "NO_MODEL",
            ErrorCode::EngineError => "ENGINE_ERROR",
            ErrorCode::RuntimeException => "RUNTIME_EXCEPTION",
            ErrorCode::InvalidProtobuf => "INVALID_PROTOBUF",
            ErrorCode::ModelLoaded => "MODEL_LOADED",
            ErrorCode::NotImplemented => "NOT_IMPLEMENTED",
            ErrorCode::InvalidGraph => "INVALID_GRAPH",
            ErrorCode::EpFail => "EP_FAIL",
        };
        f.write_str(name)
    }
}

/// A failure status with code and message, as the host understands it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: ErrorCode,
    message: String,
}

impl Status {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Status {}

/// Result of a host accessor call.
pub type HostResult<T> = std::result::Result<T, Status>;
