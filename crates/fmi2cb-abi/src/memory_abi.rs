//! ABI layer for the FMI memory callbacks (`allocateMemory`, `freeMemory`).
//!
//! Both delegate to the C heap so blocks stay interchangeable with a model
//! that frees with plain `free`. With `FMI2CB_MODE=trace` each call announces
//! itself on stdout.

use std::ffi::c_void;
use std::io::Write;

use fmi2cb_core::config::log_mode;

fn trace_call(symbol: &str) {
    if log_mode().traces_memory() {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "[OK]: {symbol}()");
    }
}

abi_fn! {
    /// FMI `allocateMemory`: `calloc` semantics.
    ///
    /// Returns a zeroed block of `nobj * size` bytes, or null when the product
    /// overflows or the heap is exhausted. Zero-sized requests return null or a
    /// unique pointer; `freeMemory` accepts either.
    export "allocateMemory"
    fn allocate_memory(nobj: usize, size: usize) -> *mut c_void {
        let block = libc::calloc(nobj, size);
        trace_call("allocateMemory");
        block
    }
}

abi_fn! {
    /// FMI `freeMemory`: `free` semantics. Null is a no-op.
    ///
    /// Double free and blocks not obtained from `allocateMemory` are undefined
    /// behaviour.
    export "freeMemory"
    fn free_memory(obj: *mut c_void) {
        libc::free(obj);
        trace_call("freeMemory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_zeroed() {
        unsafe {
            let block = allocate_memory(64, 8).cast::<u8>();
            assert!(!block.is_null());
            let bytes = std::slice::from_raw_parts(block, 64 * 8);
            assert!(bytes.iter().all(|&b| b == 0));
            free_memory(block.cast());
        }
    }

    #[test]
    fn zero_sized_requests_are_releasable() {
        unsafe {
            for (nobj, size) in [(0, 8), (8, 0), (0, 0)] {
                let block = allocate_memory(nobj, size);
                free_memory(block);
            }
        }
    }

    #[test]
    fn overflowing_request_returns_null() {
        let block = unsafe { allocate_memory(usize::MAX, 2) };
        assert!(block.is_null());
    }

    #[test]
    fn free_null_is_noop() {
        unsafe { free_memory(std::ptr::null_mut()) };
    }
}
