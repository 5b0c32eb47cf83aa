use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuantizeError {
    #[error("color pool is empty")]
    EmptyPool,

    #[error("max_colors must be between 1 and 256, got {0}")]
    InvalidMaxColors(usize),

    #[error("stride must be at least 3 bytes, got {0}")]
    InvalidStride(usize),

    #[error("color buffer of {len} bytes is too short for {count} colors at stride {stride}")]
    BufferTooShort {
        len: usize,
        count: usize,
        stride: usize,
    },

    #[error("out of memory while growing quantizer buffers")]
    OutOfMemory,
}
