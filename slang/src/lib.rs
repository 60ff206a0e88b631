pub mod assemble;
pub mod ast;
pub mod atom;
pub mod builtin;
pub mod compile;
pub mod config;
pub mod doc;
pub mod error;
pub mod export;
pub mod function;
pub mod scope;
pub mod storage;
pub mod swizzle;
pub mod typeinfo;
pub mod types;

pub use compile::{CodeObject, Declaration, TranslationUnit};
pub use config::Config;
pub use doc::Document;
pub use error::Error;
pub use export::Exports;
