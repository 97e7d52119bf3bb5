//! Configuration module for the anonymiser
//!
//! Compile-time limits live in [`constants`]; user preferences that may be
//! changed per deployment live in [`runtime`].

pub mod constants;
pub mod runtime;

pub use constants::compile_time;

