//! Kernel lifecycle shared by every kernel the provider exposes.
//!
//! A kernel goes `constructed -> [computing]* -> released`. Construction only
//! happens through `create_kernel`, compute and release only through
//! `KernelInstance`, and each of these entry points converts every failure,
//! panics included, into a host `Status`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use trtep_core::{KernelError, Status};

use crate::host::KernelContext;

/// Kernel API version the instances are built against.
pub const KERNEL_API_VERSION: u32 = 23;

/// A unit of compute bound to one graph node.
pub trait Kernel: Send {
    /// Operator this kernel implements, e.g. `"MemcpyFromHost"`.
    fn op_type(&self) -> &'static str;

    fn compute(&mut self, ctx: &dyn KernelContext) -> Result<(), KernelError>;
}

/// Kernel handed to the host. Its entry points are fixed at construction.
pub struct KernelInstance {
    kernel: Box<dyn Kernel>,
    api_version: u32,
}

impl KernelInstance {
    fn new(kernel: Box<dyn Kernel>) -> Self {
        Self {
            kernel,
            api_version: KERNEL_API_VERSION,
        }
    }

    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    pub fn op_type(&self) -> &'static str {
        self.kernel.op_type()
    }

    /// Run the kernel for one execution step.
    ///
    /// `&mut self` keeps invocations on the same instance from overlapping.
    pub fn compute(&mut self, ctx: &dyn KernelContext) -> Result<(), Status> {
        let kernel = &mut self.kernel;
        match panic::catch_unwind(AssertUnwindSafe(|| kernel.compute(ctx))) {
            Ok(result) => result.map_err(Status::from),
            Err(payload) => {
                let op = self.kernel.op_type();
                let message = match panic_message(payload.as_ref()) {
                    Some(message) => format!("{op}::compute: {message}"),
                    None => format!("Unknown exception in {op}::compute"),
                };
                Err(KernelError::Unknown(message).into())
            }
        }
    }

    /// Destroy the kernel. Never reports failure.
    pub fn release(self) {
        let op = self.op_type();
        if panic::catch_unwind(AssertUnwindSafe(move || drop(self))).is_err() {
            tracing::warn!("panic while releasing {} kernel was suppressed", op);
        }
    }
}

impl std::fmt::Debug for KernelInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelInstance")
            .field("op_type", &self.op_type())
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Build a kernel behind the no-throw creation boundary.
///
/// Host failures keep the host's status; any other error or a panic with a
/// message becomes a construction failure; a panic without one becomes an
/// unknown failure.
pub fn create_kernel<F>(op: &'static str, build: F) -> Result<KernelInstance, Status>
where
    F: FnOnce() -> Result<Box<dyn Kernel>, KernelError>,
{
    let err = match panic::catch_unwind(AssertUnwindSafe(build)) {
        Ok(Ok(kernel)) => {
            tracing::debug!("created {} kernel", op);
            return Ok(KernelInstance::new(kernel));
        }
        Ok(Err(err @ (KernelError::HostApi(_) | KernelError::Construction(_)))) => err,
        Ok(Err(err)) => KernelError::Construction(err.to_string()),
        Err(payload) => match panic_message(payload.as_ref()) {
            Some(message) => KernelError::Construction(message),
            None => KernelError::Unknown(format!("Unknown exception in {op}::create")),
        },
    };
    tracing::warn!("failed to create {} kernel: {}", op, err);
    Err(err.into())
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        Some((*s).to_string())
    } else {
        payload.downcast_ref::<String>().cloned()
    }
}
