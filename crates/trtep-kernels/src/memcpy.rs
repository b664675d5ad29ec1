//! Host/device transfer kernels.
//!
//! `MemcpyFromHost` copies a host-resident input into device memory and
//! `MemcpyToHost` copies a device-resident input back to host memory. Both
//! issue one asynchronous copy on the context's stream and return without
//! waiting for it.

use std::marker::PhantomData;
use std::sync::Arc;

use trtep_core::{ElementType, KernelError, MemType, MemcpyKind, Status};

use crate::host::{KernelContext, KernelInfo};
use crate::kernel::{create_kernel, Kernel, KernelInstance};
use crate::registry::{KernelCreateInfo, KernelDefBuilder, ONNX_DOMAIN};
use crate::state::KernelState;

/// Element types the transfer kernels are registered for.
pub const SUPPORTED_TYPES: &[ElementType] = &[ElementType::Float];

/// Compile-time description of one transfer direction.
pub trait TransferDirection: Send + Sync + 'static {
    const OP_TYPE: &'static str;
    const KIND: MemcpyKind;
    const INPUT_MEM_TYPE: MemType;
    const OUTPUT_MEM_TYPE: MemType;
}

/// Host memory → device memory.
#[derive(Debug)]
pub enum HostToDevice {}

/// Device memory → host memory.
#[derive(Debug)]
pub enum DeviceToHost {}

impl TransferDirection for HostToDevice {
    const OP_TYPE: &'static str = "MemcpyFromHost";
    const KIND: MemcpyKind = MemcpyKind::HostToDevice;
    const INPUT_MEM_TYPE: MemType = MemType::CpuInput;
    const OUTPUT_MEM_TYPE: MemType = MemType::Default;
}

impl TransferDirection for DeviceToHost {
    const OP_TYPE: &'static str = "MemcpyToHost";
    const KIND: MemcpyKind = MemcpyKind::DeviceToHost;
    const INPUT_MEM_TYPE: MemType = MemType::Default;
    const OUTPUT_MEM_TYPE: MemType = MemType::CpuOutput;
}

pub type MemcpyFromHost = MemcpyKernel<HostToDevice>;
pub type MemcpyToHost = MemcpyKernel<DeviceToHost>;

/// Copies input 0 to output 0 in direction `D`.
pub struct MemcpyKernel<D: TransferDirection> {
    info: Arc<KernelInfo>,
    state: Arc<KernelState>,
    _direction: PhantomData<fn() -> D>,
}

impl<D: TransferDirection> MemcpyKernel<D> {
    fn new(info: Arc<KernelInfo>, state: Arc<KernelState>) -> Self {
        Self {
            info,
            state,
            _direction: PhantomData,
        }
    }

    /// Kernel factory registered with the host.
    pub fn create(
        info: Arc<KernelInfo>,
        state: Arc<KernelState>,
    ) -> Result<KernelInstance, Status> {
        create_kernel(D::OP_TYPE, move || {
            Ok(Box::new(Self::new(info, state)) as Box<dyn Kernel>)
        })
    }
}

impl<D: TransferDirection> Kernel for MemcpyKernel<D> {
    fn op_type(&self) -> &'static str {
        D::OP_TYPE
    }

    fn compute(&mut self, ctx: &dyn KernelContext) -> Result<(), KernelError> {
        let input = ctx.input(0)?;
        let input_info = input.type_and_shape()?;
        let dims = input_info.shape.to_host_dims();

        let output = ctx.output(0, &dims)?;

        let input_data = input.data()?;
        let output_data = output.mutable_data()?;

        // Sized by the host's own query so wider element types stay correct.
        let bytes = input.size_in_bytes()?;
        let output_bytes = output.size_in_bytes()?;
        if output_bytes != bytes {
            return Err(KernelError::SizeMismatch {
                op: D::OP_TYPE,
                input_bytes: bytes,
                output_bytes,
            });
        }

        let stream = ctx.gpu_compute_stream()?;

        tracing::trace!(
            "{} node={} shape={} type={} elements={} bytes={} stream={:?}",
            D::OP_TYPE,
            self.info.node_name(),
            input_info.shape,
            input_info.element_type,
            input_info.element_count(),
            bytes,
            stream
        );

        if bytes == 0 {
            return Ok(());
        }

        let runtime = self.state.runtime();
        // SAFETY: the host guarantees both buffers hold `bytes` bytes in the
        // memory spaces this kernel declared, and keeps them alive until the
        // stream is synchronized.
        let submitted =
            unsafe { runtime.memcpy_async(output_data, input_data, bytes, D::KIND, stream) };
        submitted.map_err(|err| {
            tracing::warn!(
                "{} node={} {} copy failed on {}: {}",
                D::OP_TYPE,
                self.info.node_name(),
                D::KIND,
                runtime.name(),
                err
            );
            KernelError::DeviceTransfer {
                op: D::OP_TYPE,
                kind: D::KIND,
                bytes,
                code: err.code,
                message: err.message,
            }
        })
    }
}

/// Registry entry for the transfer kernel in direction `D`.
pub(crate) fn create_info<D: TransferDirection>(
    ep_name: &str,
) -> Result<KernelCreateInfo, KernelError> {
    let def = KernelDefBuilder::new()
        .set_op_type(D::OP_TYPE)
        .set_domain(ONNX_DOMAIN)
        .set_since_version(1, i32::MAX)
        .set_ep_name(ep_name)
        .set_input_mem_type(0, D::INPUT_MEM_TYPE)
        .set_output_mem_type(0, D::OUTPUT_MEM_TYPE)
        .add_type_constraint("T", SUPPORTED_TYPES)
        .build()?;
    Ok(KernelCreateInfo::new(def, MemcpyKernel::<D>::create))
}
