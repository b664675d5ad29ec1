//! `DeviceRuntime` backed by the CUDA runtime API.

use std::ffi::{c_void, CStr};
use std::fmt;
use std::sync::Arc;

use trtep_core::{KernelError, MemcpyKind, ProviderConfig};

use super::ffi::{CudaApi, CudaErrorT, CUDA_SUCCESS};
use crate::host::StreamHandle;
use crate::runtime::{DeviceRuntime, TransferError};

pub struct CudaRuntime {
    api: CudaApi,
    library: String,
}

impl fmt::Debug for CudaRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CudaRuntime")
            .field("library", &self.library)
            .finish()
    }
}

impl CudaRuntime {
    /// Load the CUDA runtime from the config's library candidates.
    pub fn load(config: &ProviderConfig) -> Result<Self, KernelError> {
        let (api, library) = CudaApi::load(&config.runtime_libraries)?;
        tracing::debug!("loaded CUDA runtime from {}", library);
        Ok(Self { api, library })
    }

    /// Library the runtime was loaded from.
    pub fn library(&self) -> &str {
        &self.library
    }

    /// Human-readable description of a CUDA runtime error code.
    pub fn error_string(&self, code: CudaErrorT) -> String {
        // SAFETY: cudaGetErrorString returns a static NUL-terminated string or null.
        let ptr = unsafe { (self.api.cuda_get_error_string)(code) };
        if ptr.is_null() {
            return format!("unrecognized CUDA error code {code}");
        }
        // SAFETY: checked non-null above; the string has static lifetime.
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    fn check(&self, code: CudaErrorT) -> Result<(), TransferError> {
        if code == CUDA_SUCCESS {
            Ok(())
        } else {
            Err(TransferError::new(code, self.error_string(code)))
        }
    }

    /// Allocate uninitialized device memory.
    pub fn alloc(self: &Arc<Self>, nbytes: usize) -> Result<CudaBuffer, TransferError> {
        let mut ptr: *mut c_void = std::ptr::null_mut();
        if nbytes != 0 {
            // SAFETY: `ptr` is a valid out pointer for cudaMalloc.
            self.check(unsafe { (self.api.cuda_malloc)(&mut ptr, nbytes) })?;
        }
        Ok(CudaBuffer {
            runtime: Arc::clone(self),
            ptr,
            nbytes,
        })
    }
}

impl DeviceRuntime for CudaRuntime {
    fn name(&self) -> &str {
        "cuda"
    }

    unsafe fn memcpy_async(
        &self,
        dst: *mut c_void,
        src: *const c_void,
        bytes: usize,
        kind: MemcpyKind,
        stream: StreamHandle,
    ) -> Result<(), TransferError> {
        self.check((self.api.cuda_memcpy_async)(
            dst,
            src,
            bytes,
            kind.as_raw(),
            stream.as_raw(),
        ))
    }

    fn stream_synchronize(&self, stream: StreamHandle) -> Result<(), TransferError> {
        // SAFETY: the stream handle came from the host or is the default stream.
        self.check(unsafe { (self.api.cuda_stream_synchronize)(stream.as_raw()) })
    }
}

/// Device allocation owned by this process, freed on drop.
///
/// The kernels never allocate; this exists for callers that need device
/// memory outside a host engine, such as hardware tests.
pub struct CudaBuffer {
    runtime: Arc<CudaRuntime>,
    ptr: *mut c_void,
    nbytes: usize,
}

// Device pointers are plain addresses; the runtime is thread-safe.
unsafe impl Send for CudaBuffer {}
unsafe impl Sync for CudaBuffer {}

impl CudaBuffer {
    pub fn len(&self) -> usize {
        self.nbytes
    }

    pub fn is_empty(&self) -> bool {
        self.nbytes == 0
    }

    /// Raw device pointer.
    pub fn as_device_ptr(&self) -> *mut c_void {
        self.ptr
    }
}

impl fmt::Debug for CudaBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CudaBuffer")
            .field("ptr", &self.ptr)
            .field("nbytes", &self.nbytes)
            .finish()
    }
}

impl Drop for CudaBuffer {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            // SAFETY: pointer came from cudaMalloc on this runtime and is freed once.
            let _ = unsafe { (self.runtime.api.cuda_free)(self.ptr) };
        }
    }
}
