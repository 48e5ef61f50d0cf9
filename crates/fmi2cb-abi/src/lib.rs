#![feature(c_variadic)]
// All extern "C" ABI exports accept raw pointers from C callers; their
// contracts are the ones FMI 2.0.2 documents for each callback.
#![allow(clippy::missing_safety_doc)]
//! # fmi2cb-abi
//!
//! ABI-compatible extern "C" boundary for the FMI 2.0.2 callback bundle.
//!
//! This crate produces a `cdylib` (`libfmi2cb.so` / `fmi2cb.dll`) exporting the
//! default `fmi2CallbackFunctions` primitives and a factory for the bundle
//! itself. Argument extraction happens here; formatting and line layout are
//! delegated to the safe implementations in `fmi2cb-core`.
//!
//! # Architecture
//!
//! ```text
//! model -> bundle fn pointer -> ABI entry (this crate) -> core formatter -> stdout
//! ```
//!
//! Exported symbols: `logger`, `allocateMemory`, `freeMemory`, `stepFinished`,
//! `allocateFmi2CallbackFunctions`, `freeFmi2CallbackFunctions`.

#[macro_use]
mod macros;

pub mod bundle_abi;
pub mod logger_abi;
pub mod memory_abi;
pub mod step_abi;
pub mod types;

pub use bundle_abi::{CallbackBundle, allocate_fmi2_callback_functions, free_fmi2_callback_functions};
pub use logger_abi::logger;
pub use memory_abi::{allocate_memory, free_memory};
pub use step_abi::step_finished;
pub use types::{
    Fmi2CallbackAllocateMemory, Fmi2CallbackFreeMemory, Fmi2CallbackFunctions,
    Fmi2CallbackLogger, Fmi2ComponentEnvironment, Fmi2Status, Fmi2StepFinished, Fmi2String,
};
