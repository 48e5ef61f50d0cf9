//! ABI layer for the variadic FMI `logger` callback.
//!
//! The format string decides how many variadic slots exist and which C type
//! each one holds. Slots are pulled off the `va_list` into owned
//! [`FormatArg`]s, then the safe engine in `fmi2cb-core` measures the message,
//! renders it into a buffer of exactly that size and lays out the console line.

use std::ffi::{CStr, c_char, c_int, c_long, c_longlong, c_uint, c_ulong, c_ulonglong, c_void};
use std::io::Write;

use fmi2cb_core::config::log_mode;
use fmi2cb_core::log_line::{NULL_COLUMN, log_line};
use fmi2cb_core::printf::{ArgClass, FormatArg, FormatTemplate, ReadLimit};

use crate::types::{Fmi2ComponentEnvironment, Fmi2Status, Fmi2String};

// `%ls` payloads are read as UTF-32 code units.
const _: () = assert!(std::mem::size_of::<libc::wchar_t>() == std::mem::size_of::<u32>());

/// Bytes of a C string without the terminator; `None` for null.
///
/// The returned slice borrows caller memory for the duration of the call.
pub(crate) unsafe fn c_str_bytes<'a>(ptr: *const c_char) -> Option<&'a [u8]> {
    if ptr.is_null() {
        None
    } else {
        // SAFETY: non-null fmi2String arguments are NUL-terminated by contract.
        Some(unsafe { CStr::from_ptr(ptr) }.to_bytes())
    }
}

/// Like [`c_str_bytes`], but reads at most `limit` bytes when one is given.
/// A `%.Ns` argument only has to be valid for `N` bytes.
pub(crate) unsafe fn c_str_bytes_bounded<'a>(
    ptr: *const c_char,
    limit: Option<usize>,
) -> Option<&'a [u8]> {
    let Some(limit) = limit else {
        return unsafe { c_str_bytes(ptr) };
    };
    if ptr.is_null() {
        return None;
    }
    // SAFETY: the caller's precision bounds the readable bytes.
    let len = unsafe { libc::strnlen(ptr, limit) };
    Some(unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len) })
}

/// Code units of a wide C string without the terminator, read up to `limit`
/// units; `None` for null.
pub(crate) unsafe fn wide_str_units<'a>(
    ptr: *const libc::wchar_t,
    limit: Option<usize>,
) -> Option<&'a [u32]> {
    if ptr.is_null() {
        return None;
    }
    let max = limit.unwrap_or(usize::MAX);
    let mut len = 0;
    // SAFETY: every unit before the terminator or the limit is readable.
    while len < max && unsafe { *ptr.add(len) } != 0 {
        len += 1;
    }
    Some(unsafe { std::slice::from_raw_parts(ptr.cast::<u32>(), len) })
}

/// Extract one [`FormatArg`] per [`ArgSlot`] from `$args`, in order.
/// Uses a macro to avoid naming the unstable va_list type directly.
///
/// [`ArgSlot`]: fmi2cb_core::printf::ArgSlot
macro_rules! collect_va_args {
    ($slots:expr, $args:expr) => {{
        let mut collected: Vec<FormatArg<'_>> = Vec::with_capacity($slots.len());
        // Last `int` read: the value of a `.*` precision.
        let mut last_int: i64 = -1;
        for slot in $slots {
            let limit = match slot.limit {
                ReadLimit::Unbounded => None,
                ReadLimit::Fixed(n) => Some(n),
                ReadLimit::PrecedingArg => usize::try_from(last_int).ok(),
            };
            let arg = match slot.class {
                ArgClass::Int => {
                    last_int = i64::from(unsafe { $args.next_arg::<c_int>() });
                    FormatArg::SignedInt(last_int)
                }
                ArgClass::UInt => {
                    FormatArg::UnsignedInt(u64::from(unsafe { $args.next_arg::<c_uint>() }))
                }
                ArgClass::Long => FormatArg::SignedInt(i64::from(unsafe { $args.next_arg::<c_long>() })),
                ArgClass::ULong => {
                    FormatArg::UnsignedInt(u64::from(unsafe { $args.next_arg::<c_ulong>() }))
                }
                ArgClass::LongLong | ArgClass::IntMax => {
                    FormatArg::SignedInt(unsafe { $args.next_arg::<c_longlong>() })
                }
                ArgClass::ULongLong | ArgClass::UIntMax => {
                    FormatArg::UnsignedInt(unsafe { $args.next_arg::<c_ulonglong>() })
                }
                ArgClass::Size => FormatArg::UnsignedInt(unsafe { $args.next_arg::<usize>() } as u64),
                ArgClass::PtrDiff => FormatArg::SignedInt(unsafe { $args.next_arg::<isize>() } as i64),
                ArgClass::Double => FormatArg::Float(unsafe { $args.next_arg::<f64>() }),
                ArgClass::CStr => FormatArg::Str(unsafe {
                    c_str_bytes_bounded($args.next_arg::<*const c_char>(), limit)
                }),
                ArgClass::WideChar => {
                    FormatArg::UnsignedInt(u64::from(unsafe { $args.next_arg::<c_uint>() }))
                }
                ArgClass::WideStr => FormatArg::WideStr(unsafe {
                    wide_str_units($args.next_arg::<*const libc::wchar_t>(), limit)
                }),
                ArgClass::Pointer => {
                    FormatArg::Pointer(unsafe { $args.next_arg::<*mut c_void>() } as usize)
                }
            };
            collected.push(arg);
        }
        collected
    }};
}

/// Format the message and lay out the full console line.
macro_rules! render_logger_line {
    ($instance_name:expr, $status:expr, $category:expr, $message:expr, $args:expr) => {{
        let format = unsafe { c_str_bytes($message) }.unwrap_or_default();
        let template = FormatTemplate::parse(format);
        let slots = template.arg_slots();
        let va_args = collect_va_args!(&slots, $args);
        let message = template.format(&va_args);
        let instance_name = unsafe { c_str_bytes($instance_name) }.unwrap_or(NULL_COLUMN);
        let category = unsafe { c_str_bytes($category) }.unwrap_or(NULL_COLUMN);
        log_line($status, category, instance_name, &message)
    }};
}

/// Write a finished line to stdout in one call; errors have nowhere to go.
fn emit_stdout(line: &[u8]) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(line);
    let _ = stdout.flush();
}

/// FMI `logger`: `[<STATUS>][<category>][<instanceName>]: <message>\n` on stdout.
///
/// `message` is a printf format string; the variadic arguments must match it.
/// Null `instanceName`, `category` or `%s` arguments print as `(null)`; a null
/// `message` prints an empty message. The component environment is ignored.
#[unsafe(export_name = "logger")]
pub unsafe extern "C" fn logger(
    _component_environment: Fmi2ComponentEnvironment,
    instance_name: Fmi2String,
    status: Fmi2Status,
    category: Fmi2String,
    message: Fmi2String,
    mut args: ...
) {
    if !log_mode().logs_enabled() {
        return;
    }
    let line = render_logger_line!(instance_name, status, category, message, args);
    emit_stdout(&line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FMI2_ERROR, FMI2_OK, FMI2_WARNING};

    /// Same pipeline as [`logger`], captured into `out` instead of stdout.
    #[allow(improper_ctypes_definitions)]
    unsafe extern "C" fn capture_logger(
        out: *mut Vec<u8>,
        instance_name: Fmi2String,
        status: Fmi2Status,
        category: Fmi2String,
        message: Fmi2String,
        mut args: ...
    ) {
        let line = render_logger_line!(instance_name, status, category, message, args);
        unsafe { (*out).extend_from_slice(&line) };
    }

    fn text(out: &[u8]) -> &str {
        std::str::from_utf8(out).unwrap()
    }

    #[test]
    fn warning_scenario() {
        let mut out = Vec::new();
        unsafe {
            capture_logger(
                &mut out,
                c"Model1".as_ptr(),
                FMI2_WARNING,
                c"Init".as_ptr(),
                c"value=%d".as_ptr(),
                42 as c_int,
            );
        }
        assert_eq!(text(&out), "[Warning][Init][Model1]: value=42\n");
    }

    #[test]
    fn out_of_range_status_is_unknown() {
        let mut out = Vec::new();
        unsafe {
            capture_logger(
                &mut out,
                c"m".as_ptr(),
                99,
                c"c".as_ptr(),
                c"plain".as_ptr(),
            );
        }
        assert_eq!(text(&out), "[Unknown][c][m]: plain\n");
    }

    #[test]
    fn mixed_argument_types() {
        let mut out = Vec::new();
        unsafe {
            capture_logger(
                &mut out,
                c"bouncingBall".as_ptr(),
                FMI2_OK,
                c"logAll".as_ptr(),
                c"%s h=%.3f n=%ld u=%u x=%#x z=%zu c=%c p=%p".as_ptr(),
                c"state".as_ptr(),
                1.25f64,
                -7 as c_long,
                4_000_000_000u32 as c_uint,
                255 as c_uint,
                12usize,
                b'Q' as c_int,
                std::ptr::null_mut::<c_void>(),
            );
        }
        assert_eq!(
            text(&out),
            "[OK][logAll][bouncingBall]: state h=1.250 n=-7 u=4000000000 x=0xff z=12 c=Q p=(nil)\n"
        );
    }

    #[test]
    fn star_width_pulls_int_slots() {
        let mut out = Vec::new();
        unsafe {
            capture_logger(
                &mut out,
                c"m".as_ptr(),
                FMI2_OK,
                c"c".as_ptr(),
                c"[%*.*f]".as_ptr(),
                8 as c_int,
                2 as c_int,
                3.14159f64,
            );
        }
        assert_eq!(text(&out), "[OK][c][m]: [    3.14]\n");
    }

    #[test]
    fn null_strings_render_placeholder() {
        let mut out = Vec::new();
        unsafe {
            capture_logger(
                &mut out,
                std::ptr::null(),
                FMI2_ERROR,
                std::ptr::null(),
                c"name=%s".as_ptr(),
                std::ptr::null::<c_char>(),
            );
        }
        assert_eq!(text(&out), "[Error][(null)][(null)]: name=(null)\n");

        let mut out = Vec::new();
        unsafe {
            capture_logger(&mut out, c"m".as_ptr(), FMI2_OK, c"c".as_ptr(), std::ptr::null());
        }
        assert_eq!(text(&out), "[OK][c][m]: \n");
    }

    #[test]
    fn ten_thousand_char_message_is_complete() {
        let payload = std::ffi::CString::new(vec![b'z'; 10_000]).unwrap();
        let mut out = Vec::new();
        unsafe {
            capture_logger(
                &mut out,
                c"m".as_ptr(),
                FMI2_OK,
                c"c".as_ptr(),
                c"<%s>".as_ptr(),
                payload.as_ptr(),
            );
        }
        let prefix = "[OK][c][m]: <";
        assert_eq!(out.len(), prefix.len() + 10_000 + 2);
        assert!(out.starts_with(prefix.as_bytes()));
        assert!(out.ends_with(b">\n"));
        assert_eq!(out.iter().filter(|&&b| b == b'\n').count(), 1);
    }

    #[test]
    fn repeated_growing_messages() {
        for len in [0usize, 1, 255, 256, 1023, 1024, 4096, 8193] {
            let payload = std::ffi::CString::new(vec![b'a'; len]).unwrap();
            let mut out = Vec::new();
            unsafe {
                capture_logger(
                    &mut out,
                    c"m".as_ptr(),
                    FMI2_OK,
                    c"c".as_ptr(),
                    c"%s".as_ptr(),
                    payload.as_ptr(),
                );
            }
            assert_eq!(out.len(), "[OK][c][m]: ".len() + len + 1, "len={len}");
        }
    }

    #[test]
    fn string_precision_bounds_the_read() {
        // No terminator anywhere in the buffer.
        let raw: [u8; 5] = *b"ABCDE";
        let mut out = Vec::new();
        unsafe {
            capture_logger(
                &mut out,
                c"m".as_ptr(),
                FMI2_OK,
                c"c".as_ptr(),
                c"[%.3s|%.*s|%.5s]".as_ptr(),
                raw.as_ptr().cast::<c_char>(),
                2 as c_int,
                raw.as_ptr().cast::<c_char>(),
                raw.as_ptr().cast::<c_char>(),
            );
        }
        assert_eq!(text(&out), "[OK][c][m]: [ABC|AB|ABCDE]\n");
    }

    #[test]
    fn grouping_flag_keeps_later_arguments_aligned() {
        let mut out = Vec::new();
        unsafe {
            capture_logger(
                &mut out,
                c"m".as_ptr(),
                FMI2_OK,
                c"c".as_ptr(),
                c"n=%'d name=%s".as_ptr(),
                1234 as c_int,
                c"pump".as_ptr(),
            );
        }
        assert_eq!(text(&out), "[OK][c][m]: n=1234 name=pump\n");
    }

    #[test]
    fn unsupported_directive_prints_rest_verbatim() {
        let mut out = Vec::new();
        unsafe {
            capture_logger(
                &mut out,
                c"m".as_ptr(),
                FMI2_OK,
                c"c".as_ptr(),
                c"a=%d %Lf %s".as_ptr(),
                5 as c_int,
            );
        }
        assert_eq!(text(&out), "[OK][c][m]: a=5 %Lf %s\n");
    }

    #[test]
    fn wide_arguments_read_as_wchar() {
        let wide: Vec<libc::wchar_t> = "gr\u{fc}n\0"
            .chars()
            .map(|c| u32::from(c) as libc::wchar_t)
            .collect();
        let mut out = Vec::new();
        unsafe {
            capture_logger(
                &mut out,
                c"m".as_ptr(),
                FMI2_OK,
                c"c".as_ptr(),
                c"%ls %lc %S %d".as_ptr(),
                wide.as_ptr(),
                0x41 as c_uint,
                std::ptr::null::<libc::wchar_t>(),
                9 as c_int,
            );
        }
        assert_eq!(text(&out), "[OK][c][m]: gr\u{fc}n A (null) 9\n");
    }

    #[test]
    fn oversized_width_logs_empty_message() {
        let mut out = Vec::new();
        unsafe {
            capture_logger(
                &mut out,
                c"m".as_ptr(),
                FMI2_OK,
                c"c".as_ptr(),
                c"%99999999999999999999d".as_ptr(),
                1 as c_int,
            );
        }
        assert_eq!(text(&out), "[OK][c][m]: \n");
    }

    #[test]
    fn bounded_reads_stop_at_terminator_or_limit() {
        assert_eq!(unsafe { c_str_bytes_bounded(c"abc".as_ptr(), Some(10)) }, Some(&b"abc"[..]));
        assert_eq!(unsafe { c_str_bytes_bounded(c"abc".as_ptr(), Some(2)) }, Some(&b"ab"[..]));
        assert_eq!(unsafe { c_str_bytes_bounded(std::ptr::null(), Some(2)) }, None);
        let units: [libc::wchar_t; 3] = [0x68, 0x69, 0];
        assert_eq!(unsafe { wide_str_units(units.as_ptr(), None) }, Some(&[0x68_u32, 0x69][..]));
        assert_eq!(unsafe { wide_str_units(units.as_ptr(), Some(1)) }, Some(&[0x68_u32][..]));
    }

    #[test]
    fn c_str_bytes_handles_null() {
        assert_eq!(unsafe { c_str_bytes(std::ptr::null()) }, None);
        assert_eq!(unsafe { c_str_bytes(c"abc".as_ptr()) }, Some(&b"abc"[..]));
    }
}
