use smallvec::SmallVec;
use std::fmt;

use crate::ElementType;

/// Concrete tensor shape with stack-allocated storage for ≤4 dimensions.
///
/// Every dimension is a known, non-negative extent. The host describes
/// dimensions as `i64`; symbolic (negative) extents never reach a kernel and
/// are rejected by `from_host_dims`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: SmallVec<[usize; 4]>,
}

impl Shape {
    /// Create a new shape from dimensions.
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    /// Build a shape from host dimensions. Returns None if any extent is negative.
    pub fn from_host_dims(dims: &[i64]) -> Option<Self> {
        let dims = dims
            .iter()
            .map(|&d| usize::try_from(d).ok())
            .collect::<Option<SmallVec<[usize; 4]>>>()?;
        Some(Self { dims })
    }

    /// Dimensions in the host's `i64` representation, e.g. for requesting an output.
    pub fn to_host_dims(&self) -> SmallVec<[i64; 4]> {
        self.dims.iter().map(|&d| d as i64).collect()
    }

    /// Total number of elements. A scalar holds one element.
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.dims.as_slice())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims)
    }
}

/// Element type and shape of a tensor value, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorTypeAndShape {
    pub element_type: ElementType,
    pub shape: Shape,
}

impl TensorTypeAndShape {
    pub fn new(element_type: ElementType, shape: impl Into<Shape>) -> Self {
        Self {
            element_type,
            shape: shape.into(),
        }
    }

    pub fn element_count(&self) -> usize {
        self.shape.numel()
    }
}
