//! # fmi2cb-core
//!
//! Safe Rust core of the FMI 2.0.2 callback bundle.
//!
//! This crate holds everything the exported callbacks need that does not touch
//! raw pointers: the `fmi2Status` label table, the printf-style format engine
//! used by the variadic logger, the console line layout, and the runtime mode
//! that decides whether the callbacks print at all. No `unsafe` code is
//! permitted at the crate level; the `fmi2cb-abi` crate owns the foreign
//! boundary and feeds already-extracted arguments in here.

#![deny(unsafe_code)]

pub mod config;
pub mod log_line;
pub mod printf;
pub mod status;

pub use config::{LogMode, log_mode, set_log_mode};
pub use log_line::{log_line, write_log_line};
pub use printf::{ArgClass, ArgSlot, FormatArg, FormatOverflow, FormatTemplate, ReadLimit};
pub use status::{Status, status_label};
