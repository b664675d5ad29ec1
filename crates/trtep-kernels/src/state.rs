use std::fmt;
use std::sync::Arc;

use trtep_core::{KernelError, ProviderConfig};

use crate::cuda::CudaRuntime;
use crate::runtime::DeviceRuntime;

/// Provider state shared by every kernel the provider creates.
///
/// Kernels hold it through an `Arc` and only read it.
pub struct KernelState {
    config: ProviderConfig,
    runtime: Arc<dyn DeviceRuntime>,
}

impl KernelState {
    pub fn new(config: ProviderConfig, runtime: Arc<dyn DeviceRuntime>) -> Self {
        Self { config, runtime }
    }

    /// Validate the config and load the CUDA runtime it names.
    pub fn with_cuda(config: ProviderConfig) -> Result<Self, KernelError> {
        config.validate()?;
        let runtime = CudaRuntime::load(&config)?;
        Ok(Self::new(config, Arc::new(runtime)))
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn runtime(&self) -> &dyn DeviceRuntime {
        self.runtime.as_ref()
    }
}

impl fmt::Debug for KernelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelState")
            .field("config", &self.config)
            .field("runtime", &self.runtime.name())
            .finish()
    }
}
