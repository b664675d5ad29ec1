//! Mock host engine and simulated device shared by the integration tests.
//!
//! `SimulatedDevice` stands in for the accelerator: "device memory" is plain
//! process memory registered as a device range, and copies queue per stream
//! until `stream_synchronize` runs them in submission order.

#![allow(dead_code)]

use std::cell::{OnceCell, UnsafeCell};
use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::Arc;

use parking_lot::Mutex;

use trtep_core::{
    ElementType, ErrorCode, HostResult, MemcpyKind, ProviderConfig, Shape, Status,
    TensorTypeAndShape,
};
use trtep_kernels::{
    DeviceRuntime, KernelContext, KernelInfo, KernelState, StreamHandle, TensorValue,
    TransferError,
};

/// `cudaErrorInvalidValue`, reported for copies that disagree with their kind.
pub const INVALID_VALUE: i32 = 1;

// ============================================================================
// Simulated device
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedCopy {
    pub kind: MemcpyKind,
    pub bytes: usize,
    pub stream: StreamHandle,
}

struct PendingCopy {
    dst: usize,
    src: usize,
    bytes: usize,
}

#[derive(Default)]
struct DeviceInner {
    next_range: u64,
    ranges: HashMap<u64, (usize, usize)>,
    pending: HashMap<StreamHandle, Vec<PendingCopy>>,
    submitted: Vec<SubmittedCopy>,
    fail_next: Option<TransferError>,
}

impl DeviceInner {
    fn is_device(&self, addr: usize, bytes: usize) -> bool {
        self.ranges
            .values()
            .any(|&(start, len)| addr >= start && addr + bytes <= start + len)
    }
}

#[derive(Default)]
pub struct SimulatedDevice {
    inner: Mutex<DeviceInner>,
}

impl SimulatedDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next submission fail with the given runtime error.
    pub fn fail_next(&self, code: i32, message: &str) {
        self.inner.lock().fail_next = Some(TransferError::new(code, message));
    }

    /// Every copy accepted so far, in submission order.
    pub fn submitted(&self) -> Vec<SubmittedCopy> {
        self.inner.lock().submitted.clone()
    }

    pub fn pending(&self, stream: StreamHandle) -> usize {
        self.inner.lock().pending.get(&stream).map_or(0, Vec::len)
    }

    fn register(&self, ptr: *const u8, len: usize) -> u64 {
        let mut inner = self.inner.lock();
        let id = inner.next_range;
        inner.next_range += 1;
        inner.ranges.insert(id, (ptr as usize, len));
        id
    }

    fn unregister(&self, id: u64) {
        self.inner.lock().ranges.remove(&id);
    }
}

impl DeviceRuntime for SimulatedDevice {
    fn name(&self) -> &str {
        "simulated"
    }

    unsafe fn memcpy_async(
        &self,
        dst: *mut c_void,
        src: *const c_void,
        bytes: usize,
        kind: MemcpyKind,
        stream: StreamHandle,
    ) -> Result<(), TransferError> {
        let mut inner = self.inner.lock();
        if let Some(err) = inner.fail_next.take() {
            return Err(err);
        }
        let (dst, src) = (dst as usize, src as usize);
        if inner.is_device(src, bytes) != kind.reads_device()
            || inner.is_device(dst, bytes) != kind.writes_device()
        {
            return Err(TransferError::new(INVALID_VALUE, "invalid argument"));
        }
        inner.submitted.push(SubmittedCopy { kind, bytes, stream });
        inner
            .pending
            .entry(stream)
            .or_default()
            .push(PendingCopy { dst, src, bytes });
        Ok(())
    }

    fn stream_synchronize(&self, stream: StreamHandle) -> Result<(), TransferError> {
        let queued = self.inner.lock().pending.remove(&stream).unwrap_or_default();
        for copy in queued {
            // SAFETY: both ranges were validated at submission and the test
            // keeps their owners alive until the stream is synchronized.
            unsafe {
                std::ptr::copy_nonoverlapping(
                    copy.src as *const u8,
                    copy.dst as *mut u8,
                    copy.bytes,
                );
            }
        }
        Ok(())
    }
}

pub fn state_with(device: &Arc<SimulatedDevice>) -> Arc<KernelState> {
    state_with_config(device, ProviderConfig::default())
}

pub fn state_with_config(device: &Arc<SimulatedDevice>, config: ProviderConfig) -> Arc<KernelState> {
    let runtime: Arc<dyn DeviceRuntime> = device.clone();
    Arc::new(KernelState::new(config, runtime))
}

pub fn state_for_provider(device: &Arc<SimulatedDevice>, ep_name: &str) -> Arc<KernelState> {
    let config = ProviderConfig {
        ep_name: ep_name.to_string(),
        ..ProviderConfig::default()
    };
    state_with_config(device, config)
}

// ============================================================================
// Mock tensor values
// ============================================================================

pub struct MockValue {
    info: TensorTypeAndShape,
    buf: UnsafeCell<Vec<u8>>,
    reported_size: Option<usize>,
    fail_data: Option<Status>,
    device: Option<(Arc<SimulatedDevice>, u64)>,
}

impl MockValue {
    fn with_bytes(element_type: ElementType, dims: &[usize], bytes: Vec<u8>) -> Self {
        Self {
            info: TensorTypeAndShape::new(element_type, dims),
            buf: UnsafeCell::new(bytes),
            reported_size: None,
            fail_data: None,
            device: None,
        }
    }

    /// Host-resident float tensor.
    pub fn host_f32(data: &[f32], dims: &[usize]) -> Self {
        Self::with_bytes(ElementType::Float, dims, bytemuck::cast_slice(data).to_vec())
    }

    /// Host-resident zeroed tensor of `bytes` bytes.
    pub fn host_zeroed(element_type: ElementType, dims: &[usize], bytes: usize) -> Self {
        Self::with_bytes(element_type, dims, vec![0; bytes])
    }

    /// Float tensor resident in the simulated device's memory.
    pub fn device_f32(device: &Arc<SimulatedDevice>, data: &[f32], dims: &[usize]) -> Self {
        Self::host_f32(data, dims).on_device(device)
    }

    pub fn device_zeroed(
        device: &Arc<SimulatedDevice>,
        element_type: ElementType,
        dims: &[usize],
        bytes: usize,
    ) -> Self {
        Self::host_zeroed(element_type, dims, bytes).on_device(device)
    }

    fn on_device(mut self, device: &Arc<SimulatedDevice>) -> Self {
        let bytes = self.buf.get_mut();
        let id = device.register(bytes.as_ptr(), bytes.len());
        self.device = Some((Arc::clone(device), id));
        self
    }

    /// Report `bytes` from `size_in_bytes` regardless of the buffer length.
    pub fn with_reported_size(mut self, bytes: usize) -> Self {
        self.reported_size = Some(bytes);
        self
    }

    pub fn with_data_failure(mut self, status: Status) -> Self {
        self.fail_data = Some(status);
        self
    }

    pub fn is_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn dims(&self) -> &[usize] {
        self.info.shape.dims()
    }

    pub fn bytes(&self) -> Vec<u8> {
        // SAFETY: no copy targeting this buffer is in flight once the test reads it.
        unsafe { (*self.buf.get()).clone() }
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.bytes()
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<f32>)
            .collect()
    }
}

impl Drop for MockValue {
    fn drop(&mut self) {
        if let Some((device, id)) = self.device.take() {
            device.unregister(id);
        }
    }
}

impl TensorValue for MockValue {
    fn type_and_shape(&self) -> HostResult<TensorTypeAndShape> {
        Ok(self.info.clone())
    }

    fn data(&self) -> HostResult<*const c_void> {
        if let Some(status) = &self.fail_data {
            return Err(status.clone());
        }
        // SAFETY: only the pointer is taken; the Vec is never resized.
        Ok(unsafe { (*self.buf.get()).as_ptr() } as *const c_void)
    }

    fn mutable_data(&self) -> HostResult<*mut c_void> {
        if let Some(status) = &self.fail_data {
            return Err(status.clone());
        }
        // SAFETY: as above.
        Ok(unsafe { (*self.buf.get()).as_mut_ptr() } as *mut c_void)
    }

    fn size_in_bytes(&self) -> HostResult<usize> {
        // SAFETY: reads the length only.
        Ok(self
            .reported_size
            .unwrap_or_else(|| unsafe { (*self.buf.get()).len() }))
    }
}

// ============================================================================
// Mock execution context
// ============================================================================

/// Where the host places a kernel's output 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Host,
    Device,
}

pub struct MockContext {
    inputs: Vec<MockValue>,
    output: OnceCell<MockValue>,
    placement: Placement,
    device: Arc<SimulatedDevice>,
    stream: StreamHandle,
    output_size: Option<usize>,
    fail_input: Option<Status>,
    fail_output: Option<Status>,
    fail_stream: Option<Status>,
}

pub fn test_stream() -> StreamHandle {
    StreamHandle::from_raw(0x5a00 as *mut c_void)
}

impl MockContext {
    pub fn new(device: &Arc<SimulatedDevice>, input: MockValue, placement: Placement) -> Self {
        Self {
            inputs: vec![input],
            output: OnceCell::new(),
            placement,
            device: Arc::clone(device),
            stream: test_stream(),
            output_size: None,
            fail_input: None,
            fail_output: None,
            fail_stream: None,
        }
    }

    /// Context for a `MemcpyFromHost` node: host input, device output.
    pub fn upload(device: &Arc<SimulatedDevice>, data: &[f32], dims: &[usize]) -> Self {
        Self::new(device, MockValue::host_f32(data, dims), Placement::Device)
    }

    /// Context for a `MemcpyToHost` node: device input, host output.
    pub fn download(device: &Arc<SimulatedDevice>, input: MockValue) -> Self {
        Self::new(device, input, Placement::Host)
    }

    pub fn with_stream(mut self, stream: StreamHandle) -> Self {
        self.stream = stream;
        self
    }

    /// Allocate output 0 with exactly `bytes` bytes.
    pub fn with_output_size(mut self, bytes: usize) -> Self {
        self.output_size = Some(bytes);
        self
    }

    pub fn with_input_failure(mut self, status: Status) -> Self {
        self.fail_input = Some(status);
        self
    }

    pub fn with_output_failure(mut self, status: Status) -> Self {
        self.fail_output = Some(status);
        self
    }

    pub fn with_stream_failure(mut self, status: Status) -> Self {
        self.fail_stream = Some(status);
        self
    }

    pub fn stream(&self) -> StreamHandle {
        self.stream
    }

    pub fn output_value(&self) -> Option<&MockValue> {
        self.output.get()
    }

    pub fn take_output(&mut self) -> Option<MockValue> {
        self.output.take()
    }
}

impl KernelContext for MockContext {
    fn input(&self, index: usize) -> HostResult<&dyn TensorValue> {
        if let Some(status) = &self.fail_input {
            return Err(status.clone());
        }
        self.inputs
            .get(index)
            .map(|value| value as &dyn TensorValue)
            .ok_or_else(|| {
                Status::new(ErrorCode::InvalidArgument, format!("no input at index {index}"))
            })
    }

    fn output(&self, index: usize, dims: &[i64]) -> HostResult<&dyn TensorValue> {
        if let Some(status) = &self.fail_output {
            return Err(status.clone());
        }
        if index != 0 {
            return Err(Status::new(
                ErrorCode::InvalidArgument,
                format!("no output at index {index}"),
            ));
        }
        let shape = Shape::from_host_dims(dims).ok_or_else(|| {
            Status::new(ErrorCode::InvalidArgument, format!("negative dimension in {dims:?}"))
        })?;
        let element_type = self.inputs[0].info.element_type;
        let value = self.output.get_or_init(|| {
            let bytes = self.output_size.unwrap_or_else(|| {
                shape.numel() * element_type.element_size().unwrap_or(0)
            });
            match self.placement {
                Placement::Host => MockValue::host_zeroed(element_type, shape.dims(), bytes),
                Placement::Device => {
                    MockValue::device_zeroed(&self.device, element_type, shape.dims(), bytes)
                }
            }
        });
        Ok(value)
    }

    fn gpu_compute_stream(&self) -> HostResult<StreamHandle> {
        match &self.fail_stream {
            Some(status) => Err(status.clone()),
            None => Ok(self.stream),
        }
    }
}

pub fn float_node(name: &str, op_type: &str) -> Arc<KernelInfo> {
    Arc::new(KernelInfo::new(name, op_type).with_type("T", ElementType::Float))
}
