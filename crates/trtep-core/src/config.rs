//! Configuration for the execution provider's kernels.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::KernelError;

/// Name the provider registers under with the host.
pub const DEFAULT_EP_NAME: &str = "TensorRTPluginExecutionProvider";

/// Provider-level configuration shared by every kernel the provider creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name. The kernel registry must be created under this name.
    pub ep_name: String,

    /// CUDA runtime libraries to try, in order, when loading the device runtime.
    pub runtime_libraries: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            ep_name: DEFAULT_EP_NAME.into(),
            runtime_libraries: vec![
                "libcudart.so".into(),
                "libcudart.so.12".into(),
                "libcudart.so.11.0".into(),
                "cudart64_12.dll".into(),
                "cudart64_110.dll".into(),
            ],
        }
    }
}

impl ProviderConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, KernelError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| KernelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, KernelError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| KernelError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), KernelError> {
        if self.ep_name.trim().is_empty() {
            return Err(KernelError::Config("ep_name must not be empty".into()));
        }
        if self.runtime_libraries.is_empty() {
            return Err(KernelError::Config(
                "runtime_libraries must list at least one candidate".into(),
            ));
        }
        Ok(())
    }
}
