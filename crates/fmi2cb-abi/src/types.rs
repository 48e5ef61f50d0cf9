//! FMI 2.0.2 platform types and the `fmi2CallbackFunctions` aggregate.
//!
//! Layout mirrors `fmi2FunctionTypes.h` exactly; hosts compiled against the
//! C header read these fields by offset.

use std::ffi::{c_char, c_int, c_void};
use std::fmt;
use std::mem::{offset_of, size_of};

/// Opaque host back-reference; passed through, never dereferenced.
pub type Fmi2ComponentEnvironment = *mut c_void;
/// NUL-terminated C string.
pub type Fmi2String = *const c_char;
/// `fmi2Status` as it crosses the ABI: a C `int`, not a closed Rust enum.
pub type Fmi2Status = c_int;

pub const FMI2_OK: Fmi2Status = 0;
pub const FMI2_WARNING: Fmi2Status = 1;
pub const FMI2_DISCARD: Fmi2Status = 2;
pub const FMI2_ERROR: Fmi2Status = 3;
pub const FMI2_FATAL: Fmi2Status = 4;
pub const FMI2_PENDING: Fmi2Status = 5;

pub type Fmi2CallbackLogger = unsafe extern "C" fn(
    component_environment: Fmi2ComponentEnvironment,
    instance_name: Fmi2String,
    status: Fmi2Status,
    category: Fmi2String,
    message: Fmi2String,
    ...
);
pub type Fmi2CallbackAllocateMemory = unsafe extern "C" fn(nobj: usize, size: usize) -> *mut c_void;
pub type Fmi2CallbackFreeMemory = unsafe extern "C" fn(obj: *mut c_void);
pub type Fmi2StepFinished =
    unsafe extern "C" fn(component_environment: Fmi2ComponentEnvironment, status: Fmi2Status);

/// `fmi2CallbackFunctions`: five pointer-sized fields, in this order.
///
/// Function slots are `Option` so a null pointer written by a foreign host is
/// a valid value (`None`) rather than undefined behaviour.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Fmi2CallbackFunctions {
    pub logger: Option<Fmi2CallbackLogger>,
    pub allocate_memory: Option<Fmi2CallbackAllocateMemory>,
    pub free_memory: Option<Fmi2CallbackFreeMemory>,
    pub step_finished: Option<Fmi2StepFinished>,
    pub component_environment: Fmi2ComponentEnvironment,
}

const PTR: usize = size_of::<usize>();
const _: () = {
    assert!(size_of::<Fmi2CallbackFunctions>() == 5 * PTR);
    assert!(offset_of!(Fmi2CallbackFunctions, logger) == 0);
    assert!(offset_of!(Fmi2CallbackFunctions, allocate_memory) == PTR);
    assert!(offset_of!(Fmi2CallbackFunctions, free_memory) == 2 * PTR);
    assert!(offset_of!(Fmi2CallbackFunctions, step_finished) == 3 * PTR);
    assert!(offset_of!(Fmi2CallbackFunctions, component_environment) == 4 * PTR);
};

impl fmt::Debug for Fmi2CallbackFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fmi2CallbackFunctions")
            .field("logger", &self.logger.map(|p| p as *const c_void))
            .field(
                "allocate_memory",
                &self.allocate_memory.map(|p| p as *const c_void),
            )
            .field("free_memory", &self.free_memory.map(|p| p as *const c_void))
            .field(
                "step_finished",
                &self.step_finished.map(|p| p as *const c_void),
            )
            .field("component_environment", &self.component_environment)
            .finish()
    }
}
