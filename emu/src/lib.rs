pub mod error;
pub mod hooks;
pub mod image;
pub mod infolog;
pub mod interp;
pub mod model;
pub mod monitor;
pub mod noise;
pub mod sampler;

pub use error::Error;
pub use image::Image;
pub use infolog::InfoLog;
pub use interp::{Backend, Interpreter};
pub use model::{Machine, Word};
pub use monitor::Monitor;
pub use sampler::{NullSampler, Sampler};
