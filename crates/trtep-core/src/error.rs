use crate::{ErrorCode, MemcpyKind, Status};

/// Errors raised inside the provider's kernels and registry.
///
/// Converted to a host `Status` at every externally reachable entry point;
/// nothing of this type crosses the plugin boundary directly.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    /// A host accessor call failed. The host's own status is propagated unchanged.
    #[error("{0}")]
    HostApi(#[from] Status),

    #[error("{op}: {kind} copy of {bytes} bytes failed: {message}")]
    DeviceTransfer {
        op: &'static str,
        kind: MemcpyKind,
        bytes: usize,
        code: i32,
        message: String,
    },

    #[error("{op}: output holds {output_bytes} bytes but input holds {input_bytes}")]
    SizeMismatch {
        op: &'static str,
        input_bytes: usize,
        output_bytes: usize,
    },

    #[error("kernel construction failed: {0}")]
    Construction(String),

    #[error("{0}")]
    Unknown(String),

    #[error("invalid kernel definition: {0}")]
    InvalidKernelDef(String),

    #[error("no kernel registered for {0}")]
    NoKernel(String),

    #[error("invalid provider configuration: {0}")]
    Config(String),

    #[error("device runtime unavailable: {0}")]
    RuntimeUnavailable(String),
}

impl KernelError {
    /// Host status code this error is reported with.
    pub fn code(&self) -> ErrorCode {
        match self {
            KernelError::HostApi(status) => status.code(),
            KernelError::DeviceTransfer { .. }
            | KernelError::Construction(_)
            | KernelError::Unknown(_)
            | KernelError::RuntimeUnavailable(_) => ErrorCode::EpFail,
            KernelError::SizeMismatch { .. }
            | KernelError::InvalidKernelDef(_)
            | KernelError::Config(_) => ErrorCode::InvalidArgument,
            KernelError::NoKernel(_) => ErrorCode::NotImplemented,
        }
    }
}

impl From<KernelError> for Status {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::HostApi(status) => status,
            other => Status::new(other.code(), other.to_string()),
        }
    }
}
