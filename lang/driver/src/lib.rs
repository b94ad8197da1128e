//! Runs the compiler pipeline for one input at a time, caching every phase.

mod artifacts;
mod cache;
mod database;
mod fs;
mod render_reports;
mod result;

pub use artifacts::*;
pub use database::*;
pub use fs::*;
pub use render_reports::*;
pub use result::*;

#[cfg(test)]
mod tests;
