//! Runtime-loaded CUDA runtime function pointers via dlopen.
//!
//! Avoids a build-time dependency on the CUDA toolkit: any install that
//! provides one of the configured `libcudart` names works.

use std::ffi::{c_char, c_int, c_void};

use libloading::Library;

use trtep_core::KernelError;

// ---------------------------------------------------------------------------
// CUDA runtime status codes
// ---------------------------------------------------------------------------

pub type CudaErrorT = c_int;
pub const CUDA_SUCCESS: CudaErrorT = 0;

pub type CudaStream = *mut c_void;

// ---------------------------------------------------------------------------
// CUDA runtime API function signatures
// ---------------------------------------------------------------------------

type FnCudaMemcpyAsync = unsafe extern "C" fn(
    *mut c_void, *const c_void, usize, c_int, CudaStream,
) -> CudaErrorT;
type FnCudaStreamSynchronize = unsafe extern "C" fn(CudaStream) -> CudaErrorT;
type FnCudaGetErrorString = unsafe extern "C" fn(CudaErrorT) -> *const c_char;
type FnCudaMalloc = unsafe extern "C" fn(*mut *mut c_void, usize) -> CudaErrorT;
type FnCudaFree = unsafe extern "C" fn(*mut c_void) -> CudaErrorT;

// ---------------------------------------------------------------------------
// Loaded API struct
// ---------------------------------------------------------------------------

pub struct CudaApi {
    _lib: Library,
    pub cuda_memcpy_async: FnCudaMemcpyAsync,
    pub cuda_stream_synchronize: FnCudaStreamSynchronize,
    pub cuda_get_error_string: FnCudaGetErrorString,
    pub cuda_malloc: FnCudaMalloc,
    pub cuda_free: FnCudaFree,
}

// Safety: the CUDA runtime API is thread-safe; the function pointers stay
// valid for as long as `_lib` is loaded.
unsafe impl Send for CudaApi {}
unsafe impl Sync for CudaApi {}

// ---------------------------------------------------------------------------
// Library loading
// ---------------------------------------------------------------------------

impl CudaApi {
    /// Load the first candidate library that resolves every symbol.
    ///
    /// Returns the API and the name of the library it came from.
    pub fn load(candidates: &[String]) -> Result<(Self, String), KernelError> {
        let mut failures = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match Self::load_one(candidate) {
                Ok(api) => return Ok((api, candidate.clone())),
                Err(err) => failures.push(format!("{candidate}: {err}")),
            }
        }
        Err(KernelError::RuntimeUnavailable(format!(
            "failed to load CUDA runtime (tried {})",
            failures.join("; ")
        )))
    }

    fn load_one(name: &str) -> Result<Self, libloading::Error> {
        // SAFETY: loading libcudart runs only its own initializers.
        let lib = unsafe { Library::new(name) }?;
        // SAFETY: symbol types match the CUDA runtime API declarations.
        unsafe {
            Ok(CudaApi {
                cuda_memcpy_async: *lib.get::<FnCudaMemcpyAsync>(b"cudaMemcpyAsync\0")?,
                cuda_stream_synchronize: *lib
                    .get::<FnCudaStreamSynchronize>(b"cudaStreamSynchronize\0")?,
                cuda_get_error_string: *lib.get::<FnCudaGetErrorString>(b"cudaGetErrorString\0")?,
                cuda_malloc: *lib.get::<FnCudaMalloc>(b"cudaMalloc\0")?,
                cuda_free: *lib.get::<FnCudaFree>(b"cudaFree\0")?,
                _lib: lib,
            })
        }
    }
}
