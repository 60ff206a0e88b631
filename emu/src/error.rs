use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // Execution faults
    #[error("Invalid opcode at {0:04}")]
    InvalidOpcode(u32),

    #[error("Instruction pointer out of range: {0:04}")]
    IpOutOfRange(u32),

    #[error("Memory access out of bounds: byte address {0}")]
    OutOfBounds(u32),

    #[error("Stack overflow")]
    StackOverflow,

    #[error("Stack underflow")]
    StackUnderflow,

    #[error("Step limit of {0} instructions exceeded")]
    StepLimit(u64),

    #[error("Unknown entry point: {0}")]
    UnknownEntry(String),
}
