//! Scalar element types.

use half::{bf16, f16};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
    I8,
    I32,
    I64,
    U8,
    U32,
    U64,
}

impl DType {
    /// Size of the largest supported scalar type, in bytes.
    ///
    /// Buffer offsets are padded to multiples of this so any element type can
    /// live at any planned offset.
    pub const MAX_ELEMENT_SIZE: usize = 8;

    pub const ALL: [DType; 10] = [
        DType::F16,
        DType::BF16,
        DType::F32,
        DType::F64,
        DType::I8,
        DType::I32,
        DType::I64,
        DType::U8,
        DType::U32,
        DType::U64,
    ];

    pub fn element_size(&self) -> usize {
        match self {
            DType::F16 => std::mem::size_of::<f16>(),
            DType::BF16 => std::mem::size_of::<bf16>(),
            DType::F32 => std::mem::size_of::<f32>(),
            DType::F64 => std::mem::size_of::<f64>(),
            DType::I8 => std::mem::size_of::<i8>(),
            DType::I32 => std::mem::size_of::<i32>(),
            DType::I64 => std::mem::size_of::<i64>(),
            DType::U8 => std::mem::size_of::<u8>(),
            DType::U32 => std::mem::size_of::<u32>(),
            DType::U64 => std::mem::size_of::<u64>(),
        }
    }
}
