//! # trtep-core
//!
//! Core types shared by the TensorRT plugin execution provider kernels.
//!
//! Provides:
//! - Tensor element types as numbered by the host (`ElementType`)
//! - Non-negative tensor shapes (`Shape`)
//! - Memory-type declarations and copy directions (`MemType`, `MemcpyKind`)
//! - The host status representation (`Status`, `ErrorCode`)
//! - The kernel error taxonomy and its translation to `Status` (`KernelError`)
//! - Provider configuration (`ProviderConfig`)

pub mod dtype;
pub mod shape;
pub mod memory;
pub mod status;
pub mod error;
pub mod config;

pub use dtype::ElementType;
pub use shape::{Shape, TensorTypeAndShape};
pub use memory::{MemType, MemcpyKind};
pub use status::{ErrorCode, HostResult, Status};
pub use error::KernelError;
pub use config::{ProviderConfig, DEFAULT_EP_NAME};
