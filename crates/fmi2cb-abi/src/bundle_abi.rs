//! Factory and release for `fmi2CallbackFunctions`.
//!
//! The bundle lives on the C heap (`malloc`) so a C host may release it with
//! either `freeFmi2CallbackFunctions` or plain `free`. The bundle owns none of
//! the things it points to: the function slots are static code and the
//! component environment belongs to the host.

use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use crate::logger_abi::logger;
use crate::memory_abi::{allocate_memory, free_memory};
use crate::types::{Fmi2CallbackFunctions, Fmi2CallbackLogger};

impl Fmi2CallbackFunctions {
    /// Bundle wired to this library's logger and allocator pair, with no
    /// `stepFinished` and no component environment.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            logger: Some(logger as Fmi2CallbackLogger),
            allocate_memory: Some(allocate_memory),
            free_memory: Some(free_memory),
            step_finished: None,
            component_environment: ptr::null_mut(),
        }
    }
}

abi_fn! {
    /// Allocate a bundle populated by [`Fmi2CallbackFunctions::with_defaults`].
    ///
    /// Returns null only when the aggregate itself cannot be allocated.
    export "allocateFmi2CallbackFunctions"
    fn allocate_fmi2_callback_functions() -> *mut Fmi2CallbackFunctions {
        let cbf = libc::malloc(size_of::<Fmi2CallbackFunctions>()).cast::<Fmi2CallbackFunctions>();
        if cbf.is_null() {
            return ptr::null_mut();
        }
        cbf.write(Fmi2CallbackFunctions::with_defaults());
        cbf
    }
}

abi_fn! {
    /// Release a bundle from `allocateFmi2CallbackFunctions`. Null is a no-op.
    ///
    /// Only the aggregate is freed; the functions and the component
    /// environment it references are left alone. Double release is undefined
    /// behaviour.
    export "freeFmi2CallbackFunctions"
    fn free_fmi2_callback_functions(cbf: *mut Fmi2CallbackFunctions) {
        if !cbf.is_null() {
            libc::free(cbf.cast());
        }
    }
}

/// Owning handle to a factory-produced bundle, released on drop.
///
/// For Rust hosts that hand `as_ptr()` to a model's `fmi2Instantiate`. The
/// handle must outlive every model instance that received the pointer.
#[derive(Debug)]
pub struct CallbackBundle {
    raw: NonNull<Fmi2CallbackFunctions>,
}

impl CallbackBundle {
    /// Allocate a default bundle; `None` if the C heap is exhausted.
    #[must_use]
    pub fn new() -> Option<Self> {
        // SAFETY: the factory has no preconditions.
        let raw = unsafe { allocate_fmi2_callback_functions() };
        NonNull::new(raw).map(|raw| Self { raw })
    }

    /// Pointer suitable for passing across the FFI boundary.
    #[must_use]
    pub fn as_ptr(&self) -> *const Fmi2CallbackFunctions {
        self.raw.as_ptr()
    }

    /// Give up ownership; the caller must release with `freeFmi2CallbackFunctions`.
    #[must_use]
    pub fn into_raw(self) -> *mut Fmi2CallbackFunctions {
        let raw = self.raw.as_ptr();
        std::mem::forget(self);
        raw
    }
}

impl Deref for CallbackBundle {
    type Target = Fmi2CallbackFunctions;

    fn deref(&self) -> &Self::Target {
        // SAFETY: `raw` came from the factory, is initialised and uniquely owned.
        unsafe { self.raw.as_ref() }
    }
}

impl DerefMut for CallbackBundle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: as for `deref`; `&mut self` guarantees exclusivity.
        unsafe { self.raw.as_mut() }
    }
}

impl Drop for CallbackBundle {
    fn drop(&mut self) {
        // SAFETY: `raw` came from the factory and is released exactly once.
        unsafe { free_fmi2_callback_functions(self.raw.as_ptr()) };
    }
}
