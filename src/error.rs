use thiserror::Error;

/// Reason a 16 byte block could not be decoded.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Error)]
pub enum MalformedBlock {
    /// The BC6H mode selector names one of the four reserved modes.
    #[error("reserved BC6H mode selector {selector:#07b}")]
    ReservedMode { selector: u8 },
    /// A BC7 block whose first byte is zero has no mode.
    #[error("BC7 block has no mode bit set")]
    MissingModeBit,
    /// The header layout of the mode does not leave room for its indices.
    #[error("mode {mode} declares {header_bits} header bits and {index_bits} index bits")]
    HeaderOverflow {
        mode: u8,
        header_bits: usize,
        index_bits: usize,
    },
    /// A pixel index needs more bits than the block has left.
    #[error("index of pixel {pixel} needs {required} bits but only {remaining} remain")]
    IndexOverflow {
        pixel: usize,
        required: usize,
        remaining: usize,
    },
}

/// Errors of the image level decoding helpers.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum DecodeError {
    #[error("block ({block_x}, {block_y}) is malformed: {source}")]
    Block {
        block_x: u32,
        block_y: u32,
        #[source]
        source: MalformedBlock,
    },
    #[error("the input slice has {actual} bytes, expected {expected}")]
    InputSize { expected: usize, actual: usize },
    #[error("the output slice has {actual} elements, expected {expected}")]
    OutputSize { expected: usize, actual: usize },
}
