use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Machine(#[from] emu::Error),

    // Resources
    #[error("out of memory: global pool exhausted allocating {0} bytes")]
    OutOfMemory(u32),

    // Semantic errors
    #[error("'{0}': undeclared identifier")]
    UndeclaredIdentifier(String),

    #[error("'{0}': undeclared function")]
    UndeclaredFunction(String),

    #[error("'{0}': undeclared type")]
    UndeclaredType(String),

    #[error("'{0}': invalid field or swizzle")]
    InvalidField(String),

    #[error("expression is not subscriptable")]
    NotSubscriptable,

    #[error("expression is not an l-value")]
    NotAnLValue,

    #[error("'{0}': too many arguments to constructor")]
    TooManyArguments(String),

    #[error("'{0}': not enough arguments to constructor")]
    NotEnoughArguments(String),

    #[error("'{0}': function already has a body")]
    FunctionRedefined(String),

    #[error("'{0}': duplicate type name")]
    DuplicateType(String),

    #[error("'{0}': function declared but never defined")]
    UndefinedFunction(String),

    #[error("'{0}' outside of a loop")]
    OutsideLoop(&'static str),

    #[error("'{0}': unknown asm instruction")]
    UnknownInstruction(String),

    #[error("'{0}': invalid literal")]
    InvalidLiteral(String),

    // Assembler bugs
    #[error("internal error: {0}")]
    Internal(String),
}
