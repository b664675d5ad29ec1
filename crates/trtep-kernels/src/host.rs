//! The host engine's side of the kernel contract.
//!
//! The host owns every object described here. Kernels only borrow them:
//! `KernelInfo` for the lifetime of the kernel, a `KernelContext` and the
//! values it hands out for the duration of one `compute` call.

use std::collections::BTreeMap;
use std::ffi::c_void;

use trtep_core::{ElementType, HostResult, TensorTypeAndShape};

/// Per-node configuration the host binds a kernel to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelInfo {
    node_name: String,
    op_type: String,
    domain: String,
    since_version: i32,
    type_bindings: BTreeMap<String, ElementType>,
}

impl KernelInfo {
    /// Node of operator `op_type` in the default domain at opset version 1.
    pub fn new(node_name: impl Into<String>, op_type: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            op_type: op_type.into(),
            domain: String::new(),
            since_version: 1,
            type_bindings: BTreeMap::new(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_since_version(mut self, version: i32) -> Self {
        self.since_version = version;
        self
    }

    /// Bind a named type parameter (e.g. `"T"`) to the element type the node uses.
    pub fn with_type(mut self, param: impl Into<String>, element_type: ElementType) -> Self {
        self.type_bindings.insert(param.into(), element_type);
        self
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn since_version(&self) -> i32 {
        self.since_version
    }

    pub fn type_binding(&self, param: &str) -> Option<ElementType> {
        self.type_bindings.get(param).copied()
    }

    pub fn type_bindings(&self) -> impl Iterator<Item = (&str, ElementType)> {
        self.type_bindings.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Opaque device stream handle supplied by the host.
///
/// Stored as `usize` so kernels holding one stay `Send`. The null handle is
/// the device's default stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StreamHandle(usize);

impl StreamHandle {
    pub fn from_raw(stream: *mut c_void) -> Self {
        Self(stream as usize)
    }

    pub fn as_raw(&self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

/// A tensor value bound to a kernel input or output.
///
/// The memory space behind `data`/`mutable_data` is whatever the kernel
/// declared for that input or output; it is never inspected.
pub trait TensorValue {
    fn type_and_shape(&self) -> HostResult<TensorTypeAndShape>;

    fn data(&self) -> HostResult<*const c_void>;

    fn mutable_data(&self) -> HostResult<*mut c_void>;

    /// Byte size as computed by the host for this value's type and shape.
    fn size_in_bytes(&self) -> HostResult<usize>;
}

/// Per-invocation execution context.
pub trait KernelContext {
    fn input(&self, index: usize) -> HostResult<&dyn TensorValue>;

    /// Allocate (or fetch) the output at `index` with the given dimensions.
    fn output(&self, index: usize, dims: &[i64]) -> HostResult<&dyn TensorValue>;

    /// Device stream the kernel must submit its work on.
    fn gpu_compute_stream(&self) -> HostResult<StreamHandle>;
}
