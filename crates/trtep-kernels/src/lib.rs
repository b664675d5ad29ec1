//! # trtep-kernels
//!
//! Host/device memcpy kernels and the kernel registry of the TensorRT plugin
//! execution provider.
//!
//! Provides:
//! - The host engine contract (`KernelInfo`, `KernelContext`, `TensorValue`)
//! - Kernel lifecycle with panic-to-status boundaries (`Kernel`, `KernelInstance`)
//! - `MemcpyFromHost` / `MemcpyToHost` stream-ordered transfer kernels
//! - Kernel definitions and the per-provider registry (`create_kernel_registry`)
//! - Runtime-loaded CUDA backend (`CudaRuntime`)

pub mod host;
pub mod runtime;
pub mod cuda;
pub mod state;
pub mod kernel;
pub mod memcpy;
pub mod registry;

pub use host::{KernelContext, KernelInfo, StreamHandle, TensorValue};
pub use runtime::{DeviceRuntime, TransferError};
pub use cuda::{CudaBuffer, CudaRuntime};
pub use state::KernelState;
pub use kernel::{create_kernel, Kernel, KernelInstance, KERNEL_API_VERSION};
pub use memcpy::{
    DeviceToHost, HostToDevice, MemcpyFromHost, MemcpyKernel, MemcpyToHost, TransferDirection,
    SUPPORTED_TYPES,
};
pub use registry::{
    create_kernel_registry, num_kernels, KernelCreateInfo, KernelDef, KernelDefBuilder,
    KernelFactory, KernelRegistry, VersionRange, ONNX_DOMAIN,
};

/// Kernel API version the host must support to load these kernels.
pub fn ort_version_supported() -> u32 {
    KERNEL_API_VERSION
}
