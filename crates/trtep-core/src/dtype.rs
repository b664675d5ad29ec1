use std::fmt;

/// Tensor element types, numbered the way the host engine numbers them.
///
/// The discriminants are part of the host contract; `as_raw` yields the
/// integer tag the host uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum ElementType {
    Undefined = 0,
    /// 32-bit IEEE 754 single-precision float
    Float = 1,
    Uint8 = 2,
    Int8 = 3,
    Uint16 = 4,
    Int16 = 5,
    Int32 = 6,
    Int64 = 7,
    /// Variable-length strings; never device resident
    String = 8,
    Bool = 9,
    /// 16-bit IEEE 754 half-precision float
    Float16 = 10,
    /// 64-bit IEEE 754 double-precision float
    Double = 11,
    Uint32 = 12,
    Uint64 = 13,
    Complex64 = 14,
    Complex128 = 15,
    /// 16-bit Brain Float
    BFloat16 = 16,
}

impl ElementType {
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Size in bytes of a single element, or None for types without a fixed width.
    ///
    /// Kernels must not use this to size copies: the byte count always comes
    /// from the host's own size query.
    pub fn element_size(&self) -> Option<usize> {
        match self {
            ElementType::Uint8 | ElementType::Int8 | ElementType::Bool => Some(1),
            ElementType::Uint16
            | ElementType::Int16
            | ElementType::Float16
            | ElementType::BFloat16 => Some(2),
            ElementType::Float | ElementType::Int32 | ElementType::Uint32 => Some(4),
            ElementType::Int64
            | ElementType::Uint64
            | ElementType::Double
            | ElementType::Complex64 => Some(8),
            ElementType::Complex128 => Some(16),
            ElementType::Undefined | ElementType::String => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Undefined => "undefined",
            ElementType::Float => "float",
            ElementType::Uint8 => "uint8",
            ElementType::Int8 => "int8",
            ElementType::Uint16 => "uint16",
            ElementType::Int16 => "int16",
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
            ElementType::String => "string",
            ElementType::Bool => "bool",
            ElementType::Float16 => "float16",
            ElementType::Double => "double",
            ElementType::Uint32 => "uint32",
            ElementType::Uint64 => "uint64",
            ElementType::Complex64 => "complex64",
            ElementType::Complex128 => "complex128",
            ElementType::BFloat16 => "bfloat16",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_tags() {
        assert_eq!(ElementType::Undefined.as_raw(), 0);
        assert_eq!(ElementType::Float.as_raw(), 1);
        assert_eq!(ElementType::Double.as_raw(), 11);
        assert_eq!(ElementType::BFloat16.as_raw(), 16);
    }

    #[test]
    fn test_element_sizes() {
        assert_eq!(ElementType::Float.element_size(), Some(4));
        assert_eq!(ElementType::Double.element_size(), Some(8));
        assert_eq!(ElementType::Float16.element_size(), Some(2));
        assert_eq!(ElementType::Bool.element_size(), Some(1));
        assert_eq!(ElementType::Complex128.element_size(), Some(16));
        assert_eq!(ElementType::String.element_size(), None);
        assert_eq!(ElementType::Undefined.element_size(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ElementType::Float), "float");
        assert_eq!(format!("{}", ElementType::BFloat16), "bfloat16");
    }
}
