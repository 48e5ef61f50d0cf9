//! Helper macros for ABI function generation.
//!
//! Provides the `abi_fn!` macro that generates
//! `#[unsafe(export_name = ...)] pub unsafe extern "C" fn` wrappers. FMI symbol
//! names are camelCase, so the exported name is given separately from the
//! Rust identifier.

/// Generate an exported extern "C" function.
///
/// # Usage
///
/// ```ignore
/// abi_fn! {
///     /// Doc comment for the function.
///     export "cSymbolName"
///     fn rust_name(arg1: Type1, arg2: Type2) -> ReturnType {
///         // implementation body
///     }
/// }
/// ```
///
/// The body runs inside an `unsafe` block; it is the caller's contract, as
/// documented by the FMI standard, that makes the raw pointers valid.
macro_rules! abi_fn {
    (
        $(#[$meta:meta])*
        export $symbol:literal
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) -> $ret:ty
        $body:block
    ) => {
        $(#[$meta])*
        #[allow(unused_unsafe)]
        #[unsafe(export_name = $symbol)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> $ret {
            unsafe { $body }
        }
    };

    // Variant without return type (returns ())
    (
        $(#[$meta:meta])*
        export $symbol:literal
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? )
        $body:block
    ) => {
        $(#[$meta])*
        #[allow(unused_unsafe)]
        #[unsafe(export_name = $symbol)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) {
            unsafe { $body }
        }
    };
}
