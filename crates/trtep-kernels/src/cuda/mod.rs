//! CUDA runtime binding for the memcpy kernels.
//!
//! Uses `libloading` for runtime-loaded `libcudart` function pointers
//! (no build-time CUDA dependency).
//!
//! Provides:
//! - Stream-ordered asynchronous copies (`cudaMemcpyAsync`)
//! - Platform error strings (`cudaGetErrorString`)
//! - Device allocations for callers outside a host engine

pub mod ffi;
pub mod runtime;

pub use runtime::{CudaBuffer, CudaRuntime};
