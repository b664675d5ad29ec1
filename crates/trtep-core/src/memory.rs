use std::fmt;

/// Memory-type declaration attached to a kernel input or output.
///
/// Tells the host's memory planner where the tensor must live. Inputs and
/// outputs without an explicit declaration use the provider's default
/// (device) memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum MemType {
    /// Input that must reside in host (CPU) memory.
    CpuInput = -2,
    /// Output that must be placed in host (CPU) memory.
    CpuOutput = -1,
    /// Provider default memory (device).
    #[default]
    Default = 0,
}

impl MemType {
    /// Whether the tensor lives in host memory.
    pub fn is_host(&self) -> bool {
        matches!(self, MemType::CpuInput | MemType::CpuOutput)
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for MemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemType::CpuInput => write!(f, "cpu_input"),
            MemType::CpuOutput => write!(f, "cpu_output"),
            MemType::Default => write!(f, "default"),
        }
    }
}

/// Direction of a host/device copy, numbered like the device runtime's copy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MemcpyKind {
    HostToDevice = 1,
    DeviceToHost = 2,
}

impl MemcpyKind {
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Whether the copy reads from device memory.
    pub fn reads_device(&self) -> bool {
        matches!(self, MemcpyKind::DeviceToHost)
    }

    /// Whether the copy writes to device memory.
    pub fn writes_device(&self) -> bool {
        matches!(self, MemcpyKind::HostToDevice)
    }
}

impl fmt::Display for MemcpyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemcpyKind::HostToDevice => write!(f, "host->device"),
            MemcpyKind::DeviceToHost => write!(f, "device->host"),
        }
    }
}
