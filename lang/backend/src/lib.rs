//! MOON assembly generation for checked programs.

pub mod codegen;
pub mod emit;
pub mod registers;
pub mod result;
pub mod tags;

#[cfg(test)]
mod vm;

pub use codegen::generate;
pub use emit::Program;
pub use result::{BackendError, BackendResult};
