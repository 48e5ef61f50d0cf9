//! ABI layer for the FMI `stepFinished` callback.

use crate::types::{Fmi2ComponentEnvironment, Fmi2Status};

abi_fn! {
    /// FMI `stepFinished`: completion signal for asynchronous `fmi2DoStep`.
    ///
    /// The default implementation is inert; hosts that run asynchronous steps
    /// install their own function in the bundle.
    export "stepFinished"
    fn step_finished(_component_environment: Fmi2ComponentEnvironment, _status: Fmi2Status) {}
}
