pub mod inst;
pub mod op;
pub mod stream;

pub use inst::Instruction;
pub use op::Opcode;
pub use stream::{InstructionStream, RestorePoint};
