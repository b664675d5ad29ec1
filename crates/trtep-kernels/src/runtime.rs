//! Transfer backend the memcpy kernels submit their copies through.

use std::ffi::c_void;

use trtep_core::MemcpyKind;

use crate::host::StreamHandle;

/// Failure reported by the device runtime, with its own code and message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct TransferError {
    pub code: i32,
    pub message: String,
}

impl TransferError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Stream-ordered copy engine of an accelerator runtime.
///
/// Shared by every kernel of a provider, so implementations must be safe to
/// call from any host thread.
pub trait DeviceRuntime: Send + Sync {
    /// Short name used in logs (e.g. `"cuda"`).
    fn name(&self) -> &str;

    /// Submit an asynchronous copy of `bytes` from `src` to `dst` on `stream`.
    ///
    /// Returns once the copy is queued; completion is observed by
    /// synchronizing the stream.
    ///
    /// # Safety
    /// `src` must be readable and `dst` writable for `bytes` bytes in the
    /// memory spaces implied by `kind`, until the copy completes.
    unsafe fn memcpy_async(
        &self,
        dst: *mut c_void,
        src: *const c_void,
        bytes: usize,
        kind: MemcpyKind,
        stream: StreamHandle,
    ) -> Result<(), TransferError>;

    /// Block until every operation queued on `stream` has completed.
    fn stream_synchronize(&self, stream: StreamHandle) -> Result<(), TransferError>;
}
