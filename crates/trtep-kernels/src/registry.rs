//! Kernel registry exposed to the host engine.
//!
//! The host sizes its bookkeeping with `num_kernels`, builds the table once
//! per provider with `create_kernel_registry`, and then matches graph nodes
//! against it. The table is immutable after construction, so lookups from
//! several host threads need no locking.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use trtep_core::{ElementType, KernelError, MemType, Status};

use crate::host::KernelInfo;
use crate::kernel::KernelInstance;
use crate::memcpy::{self, DeviceToHost, HostToDevice};
use crate::state::KernelState;

/// Domain of the standard operator set.
pub const ONNX_DOMAIN: &str = "";

/// Creates a kernel instance for a node.
pub type KernelFactory = fn(Arc<KernelInfo>, Arc<KernelState>) -> Result<KernelInstance, Status>;

type BuildKernelCreateInfoFn = fn(&str) -> Result<KernelCreateInfo, KernelError>;

/// Every kernel definition this plugin registers.
static KERNEL_BUILDERS: [BuildKernelCreateInfoFn; 2] = [
    memcpy::create_info::<HostToDevice>,
    memcpy::create_info::<DeviceToHost>,
];

/// Inclusive range of operator set versions a definition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRange {
    pub start: i32,
    pub end: i32,
}

impl VersionRange {
    pub fn contains(&self, version: i32) -> bool {
        self.start <= version && version <= self.end
    }

    pub fn overlaps(&self, other: &VersionRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.end == i32::MAX {
            write!(f, "{}+", self.start)
        } else {
            write!(f, "{}..={}", self.start, self.end)
        }
    }
}

/// What a kernel declares to the host about the node it can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelDef {
    op_type: String,
    domain: String,
    versions: VersionRange,
    ep_name: String,
    input_mem_types: BTreeMap<usize, MemType>,
    output_mem_types: BTreeMap<usize, MemType>,
    type_constraints: BTreeMap<String, Vec<ElementType>>,
}

impl KernelDef {
    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn versions(&self) -> VersionRange {
        self.versions
    }

    pub fn ep_name(&self) -> &str {
        &self.ep_name
    }

    /// Declared memory type of input `index`; undeclared inputs use the default.
    pub fn input_mem_type(&self, index: usize) -> MemType {
        self.input_mem_types.get(&index).copied().unwrap_or_default()
    }

    /// Declared memory type of output `index`; undeclared outputs use the default.
    pub fn output_mem_type(&self, index: usize) -> MemType {
        self.output_mem_types.get(&index).copied().unwrap_or_default()
    }

    pub fn allowed_types(&self, param: &str) -> Option<&[ElementType]> {
        self.type_constraints.get(param).map(Vec::as_slice)
    }

    pub fn type_constraints(&self) -> impl Iterator<Item = (&str, &[ElementType])> {
        self.type_constraints
            .iter()
            .map(|(name, types)| (name.as_str(), types.as_slice()))
    }

    /// Whether a node satisfies operator, domain, version and every type constraint.
    pub fn matches(&self, info: &KernelInfo) -> bool {
        self.op_type == info.op_type()
            && self.domain == info.domain()
            && self.versions.contains(info.since_version())
            && self.type_constraints.iter().all(|(param, allowed)| {
                info.type_binding(param)
                    .map_or(false, |bound| allowed.contains(&bound))
            })
    }

    /// Whether some node could match both definitions.
    fn overlaps(&self, other: &KernelDef) -> bool {
        if self.op_type != other.op_type
            || self.domain != other.domain
            || !self.versions.overlaps(&other.versions)
        {
            return false;
        }
        self.type_constraints.iter().all(|(param, allowed)| {
            other
                .type_constraints
                .get(param)
                .map_or(true, |theirs| allowed.iter().any(|t| theirs.contains(t)))
        })
    }
}

/// Fluent builder for `KernelDef`; `build` validates the result.
#[derive(Debug, Clone, Default)]
pub struct KernelDefBuilder {
    op_type: String,
    domain: String,
    versions: Option<(i32, i32)>,
    ep_name: String,
    input_mem_types: Vec<(usize, MemType)>,
    output_mem_types: Vec<(usize, MemType)>,
    type_constraints: Vec<(String, Vec<ElementType>)>,
}

impl KernelDefBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_op_type(mut self, op_type: impl Into<String>) -> Self {
        self.op_type = op_type.into();
        self
    }

    pub fn set_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Inclusive version range; pass `i32::MAX` as `end` for an open range.
    pub fn set_since_version(mut self, start: i32, end: i32) -> Self {
        self.versions = Some((start, end));
        self
    }

    pub fn set_ep_name(mut self, ep_name: impl Into<String>) -> Self {
        self.ep_name = ep_name.into();
        self
    }

    pub fn set_input_mem_type(mut self, index: usize, mem_type: MemType) -> Self {
        self.input_mem_types.push((index, mem_type));
        self
    }

    pub fn set_output_mem_type(mut self, index: usize, mem_type: MemType) -> Self {
        self.output_mem_types.push((index, mem_type));
        self
    }

    pub fn add_type_constraint(mut self, param: impl Into<String>, types: &[ElementType]) -> Self {
        self.type_constraints.push((param.into(), types.to_vec()));
        self
    }

    pub fn build(self) -> Result<KernelDef, KernelError> {
        if self.op_type.trim().is_empty() {
            return Err(KernelError::InvalidKernelDef("operator type is empty".into()));
        }
        let op = self.op_type;
        if self.ep_name.trim().is_empty() {
            return Err(KernelError::InvalidKernelDef(format!(
                "{op}: execution provider name is empty"
            )));
        }

        let (start, end) = self.versions.ok_or_else(|| {
            KernelError::InvalidKernelDef(format!("{op}: version range not set"))
        })?;
        if start < 1 || end < start {
            return Err(KernelError::InvalidKernelDef(format!(
                "{op}: invalid version range {start}..={end}"
            )));
        }

        let input_mem_types = collect_mem_types(&op, "input", self.input_mem_types)?;
        let output_mem_types = collect_mem_types(&op, "output", self.output_mem_types)?;

        let mut type_constraints = BTreeMap::new();
        for (param, types) in self.type_constraints {
            if param.trim().is_empty() {
                return Err(KernelError::InvalidKernelDef(format!(
                    "{op}: type constraint name is empty"
                )));
            }
            if types.is_empty() {
                return Err(KernelError::InvalidKernelDef(format!(
                    "{op}: type constraint '{param}' allows no types"
                )));
            }
            if types.contains(&ElementType::Undefined) {
                return Err(KernelError::InvalidKernelDef(format!(
                    "{op}: type constraint '{param}' allows the undefined type"
                )));
            }
            if type_constraints.contains_key(&param) {
                return Err(KernelError::InvalidKernelDef(format!(
                    "{op}: type constraint '{param}' declared twice"
                )));
            }
            type_constraints.insert(param, types);
        }

        Ok(KernelDef {
            op_type: op,
            domain: self.domain,
            versions: VersionRange { start, end },
            ep_name: self.ep_name,
            input_mem_types,
            output_mem_types,
            type_constraints,
        })
    }
}

fn collect_mem_types(
    op: &str,
    what: &str,
    entries: Vec<(usize, MemType)>,
) -> Result<BTreeMap<usize, MemType>, KernelError> {
    let mut map = BTreeMap::new();
    for (index, mem_type) in entries {
        if let Some(previous) = map.insert(index, mem_type) {
            if previous != mem_type {
                return Err(KernelError::InvalidKernelDef(format!(
                    "{op}: {what} {index} declared as both {previous} and {mem_type}"
                )));
            }
        }
    }
    Ok(map)
}

/// A kernel definition paired with the factory that instantiates it.
#[derive(Clone)]
pub struct KernelCreateInfo {
    def: KernelDef,
    factory: KernelFactory,
}

impl KernelCreateInfo {
    pub fn new(def: KernelDef, factory: KernelFactory) -> Self {
        Self { def, factory }
    }

    pub fn def(&self) -> &KernelDef {
        &self.def
    }
}

impl fmt::Debug for KernelCreateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelCreateInfo")
            .field("def", &self.def)
            .finish_non_exhaustive()
    }
}

/// Lookup table from (operator, domain, version, types) to kernel factories.
pub struct KernelRegistry {
    ep_name: String,
    state: Arc<KernelState>,
    entries: Vec<KernelCreateInfo>,
}

impl KernelRegistry {
    /// Build a registry from explicit entries.
    ///
    /// The provider state must carry a valid config for `ep_name`, every
    /// entry must be declared for `ep_name`, and no two entries may match
    /// the same node.
    pub fn from_entries(
        ep_name: &str,
        state: Arc<KernelState>,
        entries: Vec<KernelCreateInfo>,
    ) -> Result<Self, KernelError> {
        if ep_name.trim().is_empty() {
            return Err(KernelError::InvalidKernelDef(
                "execution provider name is empty".into(),
            ));
        }
        let config = state.config();
        config.validate()?;
        if config.ep_name != ep_name {
            return Err(KernelError::Config(format!(
                "provider state is configured for '{}', not '{}'",
                config.ep_name, ep_name
            )));
        }
        if let Some(entry) = entries.iter().find(|e| e.def.ep_name != ep_name) {
            return Err(KernelError::InvalidKernelDef(format!(
                "{} is declared for provider '{}', not '{}'",
                entry.def.op_type, entry.def.ep_name, ep_name
            )));
        }
        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                if a.def.overlaps(&b.def) {
                    return Err(KernelError::InvalidKernelDef(format!(
                        "{} (domain '{}') registered twice with overlapping versions {} and {}",
                        a.def.op_type, a.def.domain, a.def.versions, b.def.versions
                    )));
                }
            }
        }
        Ok(Self {
            ep_name: ep_name.to_string(),
            state,
            entries,
        })
    }

    pub fn ep_name(&self) -> &str {
        &self.ep_name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KernelCreateInfo> {
        self.entries.iter()
    }

    /// Find the single entry matching a node. An unsupported type fails here.
    pub fn lookup(&self, info: &KernelInfo) -> Result<&KernelCreateInfo, Status> {
        self.entries
            .iter()
            .find(|entry| entry.def.matches(info))
            .ok_or_else(|| {
                let types = info
                    .type_bindings()
                    .map(|(param, ty)| format!("{param}={ty}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                KernelError::NoKernel(format!(
                    "{} (domain '{}', version {}, types [{}]) in {}",
                    info.op_type(),
                    info.domain(),
                    info.since_version(),
                    types,
                    self.ep_name
                ))
                .into()
            })
    }

    /// Match a node and instantiate its kernel with this provider's state.
    pub fn create_kernel(&self, info: Arc<KernelInfo>) -> Result<KernelInstance, Status> {
        let factory = self.lookup(&info)?.factory;
        factory(info, Arc::clone(&self.state))
    }
}

impl fmt::Debug for KernelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelRegistry")
            .field("ep_name", &self.ep_name)
            .field("entries", &self.entries)
            .finish()
    }
}

/// Number of kernel definitions this plugin registers.
pub fn num_kernels() -> usize {
    KERNEL_BUILDERS.len()
}

/// Build the full kernel table for one provider instance.
///
/// The first definition that fails to build aborts construction; no partial
/// registry is returned.
pub fn create_kernel_registry(
    ep_name: &str,
    state: Arc<KernelState>,
) -> Result<KernelRegistry, Status> {
    let registry = build_registry(ep_name, state, &KERNEL_BUILDERS).map_err(|err| {
        tracing::warn!("failed to create kernel registry for '{}': {}", ep_name, err);
        Status::from(err)
    })?;
    tracing::info!(
        "registered {} kernels for {}",
        registry.len(),
        registry.ep_name()
    );
    Ok(registry)
}

fn build_registry(
    ep_name: &str,
    state: Arc<KernelState>,
    builders: &[BuildKernelCreateInfoFn],
) -> Result<KernelRegistry, KernelError> {
    let entries = builders
        .iter()
        .map(|build| build(ep_name))
        .collect::<Result<Vec<_>, _>>()?;
    KernelRegistry::from_entries(ep_name, state, entries)
}
