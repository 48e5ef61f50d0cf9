//! printf formatting engine for the FMI logger.
//!
//! The logger receives a C format string plus a variadic argument list. The
//! ABI layer parses the format once ([`FormatTemplate::parse`]), asks it which
//! C type each variadic slot holds ([`FormatTemplate::arg_slots`]), pulls the
//! values off the `va_list` into [`FormatArg`]s and hands them back here for
//! rendering. Nothing in this module touches raw memory.
//!
//! Rendering goes through a [`Sink`], so the same code path serves both the
//! dry-run length measurement ([`ByteCounter`]) and the real render into a
//! `Vec<u8>`. The two can never disagree about the byte count.
//!
//! A directive this engine cannot classify ends argument consumption: it and
//! everything after it are emitted verbatim, so no later slot is read with the
//! wrong C type.
//!
//! Reference: ISO C11 7.21.6.1 (fprintf).

use std::fmt;

/// Largest field width, precision or total output a format may produce
/// (`INT_MAX`, the limit of printf's return value).
pub const MAX_OUTPUT: usize = i32::MAX as usize;

/// Fraction digits past which every `f64` expansion is exactly zero
/// (the smallest subnormal has 1074), with headroom.
const EXACT_DIGITS: usize = 1100;

// ---------------------------------------------------------------------------
// Format spec types
// ---------------------------------------------------------------------------

/// Flags parsed from a printf format directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatFlags {
    pub left_justify: bool, // '-'
    pub force_sign: bool,   // '+'
    pub space_sign: bool,   // ' '
    pub alt_form: bool,     // '#'
    pub zero_pad: bool,     // '0'
    /// `'` thousands grouping; the C locale has no separator.
    pub grouping: bool,
}

/// Width specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    None,
    Fixed(usize),
    FromArg, // '*'
}

/// Precision specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    None,
    Fixed(usize),
    FromArg, // '.*'
}

/// Length modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMod {
    None,
    Hh,   // 'hh'
    H,    // 'h'
    L,    // 'l'
    Ll,   // 'll', 'q'
    Z,    // 'z', 'Z'
    T,    // 't'
    J,    // 'j'
    BigL, // 'L'
}

/// A parsed printf format specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub flags: FormatFlags,
    pub width: Width,
    pub precision: Precision,
    pub length: LengthMod,
    pub conversion: u8,
}

/// A segment of a parsed format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSegment<'a> {
    /// Literal bytes to emit verbatim.
    Literal(&'a [u8]),
    /// A `%%` escape (emit a single '%').
    Percent,
    /// A conversion specifier requiring an argument.
    Spec(FormatSpec),
}

// ---------------------------------------------------------------------------
// Argument model
// ---------------------------------------------------------------------------

/// The C type occupying one variadic slot.
///
/// Default argument promotions apply: `char`/`short` arrive as `int`, `float`
/// arrives as `double`. The ABI layer reads each slot with the matching
/// `va_arg` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgClass {
    /// `int` (also `*` width/precision and `%c`).
    Int,
    /// `unsigned int`.
    UInt,
    /// `long`.
    Long,
    /// `unsigned long`.
    ULong,
    /// `long long`.
    LongLong,
    /// `unsigned long long`.
    ULongLong,
    /// `size_t`.
    Size,
    /// `ptrdiff_t`.
    PtrDiff,
    /// `intmax_t`.
    IntMax,
    /// `uintmax_t`.
    UIntMax,
    /// `double`.
    Double,
    /// `const char*` for `%s`; may be null.
    CStr,
    /// `wint_t` for `%lc` / `%C`.
    WideChar,
    /// `const wchar_t*` for `%ls` / `%S`; may be null.
    WideStr,
    /// Any data pointer (`%p`, `%n`).
    Pointer,
}

/// How far a string slot may be read.
///
/// A string with a precision need not be NUL-terminated; the reader must stop
/// after that many elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadLimit {
    /// Read up to the terminator.
    Unbounded,
    /// At most this many elements.
    Fixed(usize),
    /// At most the value of the preceding `int` slot (`%.*s`); a negative
    /// value means unbounded.
    PrecedingArg,
}

/// One variadic slot: its C type and, for strings, its read limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSlot {
    pub class: ArgClass,
    pub limit: ReadLimit,
}

/// A variadic argument after extraction, ready for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatArg<'a> {
    SignedInt(i64),
    UnsignedInt(u64),
    Float(f64),
    /// `%s` payload without the terminator; `None` for a null pointer.
    Str(Option<&'a [u8]>),
    /// `%ls` payload as code units without the terminator; `None` for null.
    WideStr(Option<&'a [u32]>),
    Pointer(usize),
}

impl FormatArg<'_> {
    fn as_signed(&self) -> i64 {
        match *self {
            Self::SignedInt(v) => v,
            Self::UnsignedInt(v) => v as i64,
            Self::Float(v) => v as i64,
            Self::Pointer(v) => v as i64,
            Self::Str(_) | Self::WideStr(_) => 0,
        }
    }

    fn as_unsigned(&self) -> u64 {
        match *self {
            Self::SignedInt(v) => v as u64,
            Self::UnsignedInt(v) => v,
            Self::Float(v) => v as u64,
            Self::Pointer(v) => v as u64,
            Self::Str(_) | Self::WideStr(_) => 0,
        }
    }

    fn as_float(&self) -> f64 {
        match *self {
            Self::SignedInt(v) => v as f64,
            Self::UnsignedInt(v) => v as f64,
            Self::Float(v) => v,
            Self::Pointer(v) => v as f64,
            Self::Str(_) | Self::WideStr(_) => 0.0,
        }
    }
}

/// The rendered output would exceed [`MAX_OUTPUT`] bytes, or a field width or
/// precision does. C's printf fails with `EOVERFLOW` in the same cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOverflow;

impl fmt::Display for FormatOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "formatted output exceeds {MAX_OUTPUT} bytes")
    }
}

impl std::error::Error for FormatOverflow {}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Byte destination for the renderer.
pub trait Sink {
    fn put(&mut self, bytes: &[u8]);

    fn put_repeat(&mut self, byte: u8, count: usize) {
        for _ in 0..count {
            self.put(&[byte]);
        }
    }
}

impl Sink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    fn put_repeat(&mut self, byte: u8, count: usize) {
        self.resize(self.len() + count, byte);
    }
}

/// Counts bytes without storing them: the dry-run pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCounter {
    len: usize,
}

impl ByteCounter {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Sink for ByteCounter {
    fn put(&mut self, bytes: &[u8]) {
        self.len = self.len.saturating_add(bytes.len());
    }

    fn put_repeat(&mut self, _byte: u8, count: usize) {
        self.len = self.len.saturating_add(count);
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a single format specifier starting after the '%' character.
///
/// `fmt` points to the first byte AFTER '%'. Returns `(spec, bytes_consumed)`
/// where `bytes_consumed` counts from `fmt[0]`. Returns `None` if the
/// directive is malformed or cannot be classified.
pub fn parse_format_spec(fmt: &[u8]) -> Option<(FormatSpec, usize)> {
    let mut pos = 0;
    let len = fmt.len();

    // --- flags ---
    let mut flags = FormatFlags::default();
    while pos < len {
        match fmt[pos] {
            b'-' => flags.left_justify = true,
            b'+' => flags.force_sign = true,
            b' ' => flags.space_sign = true,
            b'#' => flags.alt_form = true,
            b'0' => flags.zero_pad = true,
            b'\'' => flags.grouping = true,
            // glibc `I`: locale digits, identical in the C locale.
            b'I' => {}
            _ => break,
        }
        pos += 1;
    }
    // '+' overrides ' '; '-' overrides '0'.
    if flags.force_sign {
        flags.space_sign = false;
    }
    if flags.left_justify {
        flags.zero_pad = false;
    }

    // --- width ---
    let width = if pos < len && fmt[pos] == b'*' {
        pos += 1;
        Width::FromArg
    } else {
        let start = pos;
        while pos < len && fmt[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos > start {
            Width::Fixed(parse_decimal(&fmt[start..pos]))
        } else {
            Width::None
        }
    };

    // --- precision ---
    let precision = if pos < len && fmt[pos] == b'.' {
        pos += 1;
        if pos < len && fmt[pos] == b'*' {
            pos += 1;
            Precision::FromArg
        } else {
            let start = pos;
            while pos < len && fmt[pos].is_ascii_digit() {
                pos += 1;
            }
            Precision::Fixed(if pos > start {
                parse_decimal(&fmt[start..pos])
            } else {
                0
            })
        }
    } else {
        Precision::None
    };

    // --- length modifier ---
    let length = if pos < len {
        match fmt[pos] {
            b'h' => {
                pos += 1;
                if pos < len && fmt[pos] == b'h' {
                    pos += 1;
                    LengthMod::Hh
                } else {
                    LengthMod::H
                }
            }
            b'l' => {
                pos += 1;
                if pos < len && fmt[pos] == b'l' {
                    pos += 1;
                    LengthMod::Ll
                } else {
                    LengthMod::L
                }
            }
            b'q' => {
                pos += 1;
                LengthMod::Ll
            }
            b'z' | b'Z' => {
                pos += 1;
                LengthMod::Z
            }
            b't' => {
                pos += 1;
                LengthMod::T
            }
            b'j' => {
                pos += 1;
                LengthMod::J
            }
            b'L' => {
                pos += 1;
                LengthMod::BigL
            }
            _ => LengthMod::None,
        }
    } else {
        LengthMod::None
    };

    // --- conversion specifier ---
    if pos >= len {
        return None;
    }
    let conversion = fmt[pos];
    pos += 1;

    match conversion {
        b'd' | b'i' | b'u' | b'x' | b'X' | b'o' | b's' | b'S' | b'c' | b'C' | b'p' | b'n'
        | b'%' => {}
        // `long double` has no `va_arg` reader here; its slot size is unknown.
        b'f' | b'F' | b'e' | b'E' | b'g' | b'G' | b'a' | b'A' => {
            if length == LengthMod::BigL {
                return None;
            }
        }
        _ => return None,
    }

    Some((
        FormatSpec {
            flags,
            width,
            precision,
            length,
            conversion,
        },
        pos,
    ))
}

/// Split a printf format string into segments.
///
/// Yields `FormatSegment::Literal` for literal runs and `FormatSegment::Spec`
/// for each `%`-directive. `%%` (with or without flags) yields
/// `FormatSegment::Percent`. An unparseable directive ends the scan: it and
/// the rest of the string become one literal.
pub fn parse_format_string(fmt: &[u8]) -> Vec<FormatSegment<'_>> {
    let mut segments = Vec::new();
    let mut pos = 0;
    let len = fmt.len();

    while pos < len {
        let start = pos;
        while pos < len && fmt[pos] != b'%' {
            pos += 1;
        }
        if pos > start {
            segments.push(FormatSegment::Literal(&fmt[start..pos]));
        }
        if pos >= len {
            break;
        }
        // Skip the '%'.
        pos += 1;
        match parse_format_spec(&fmt[pos..]) {
            Some((spec, consumed)) => {
                pos += consumed;
                if spec.conversion == b'%' {
                    segments.push(FormatSegment::Percent);
                } else {
                    segments.push(FormatSegment::Spec(spec));
                }
            }
            None => {
                segments.push(FormatSegment::Literal(&fmt[pos - 1..]));
                break;
            }
        }
    }
    segments
}

impl FormatSpec {
    /// C type of the conversion's own argument; `None` for `%%`.
    #[must_use]
    pub fn arg_class(&self) -> Option<ArgClass> {
        let class = match self.conversion {
            b'%' => return None,
            b'd' | b'i' => match self.length {
                LengthMod::None | LengthMod::Hh | LengthMod::H => ArgClass::Int,
                LengthMod::L => ArgClass::Long,
                LengthMod::Ll | LengthMod::BigL => ArgClass::LongLong,
                LengthMod::Z => ArgClass::Size,
                LengthMod::T => ArgClass::PtrDiff,
                LengthMod::J => ArgClass::IntMax,
            },
            b'u' | b'o' | b'x' | b'X' => match self.length {
                LengthMod::None | LengthMod::Hh | LengthMod::H => ArgClass::UInt,
                LengthMod::L => ArgClass::ULong,
                LengthMod::Ll | LengthMod::BigL => ArgClass::ULongLong,
                LengthMod::Z => ArgClass::Size,
                LengthMod::T => ArgClass::PtrDiff,
                LengthMod::J => ArgClass::UIntMax,
            },
            b'c' if self.is_wide() => ArgClass::WideChar,
            b'C' => ArgClass::WideChar,
            b'c' => ArgClass::Int,
            b's' if self.is_wide() => ArgClass::WideStr,
            b'S' => ArgClass::WideStr,
            b's' => ArgClass::CStr,
            b'p' | b'n' => ArgClass::Pointer,
            _ => ArgClass::Double,
        };
        Some(class)
    }

    fn is_wide(&self) -> bool {
        self.length == LengthMod::L || matches!(self.conversion, b'C' | b'S')
    }

    fn exceeds_limits(&self) -> bool {
        matches!(self.width, Width::Fixed(w) if w > MAX_OUTPUT)
            || matches!(self.precision, Precision::Fixed(p) if p > MAX_OUTPUT)
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// A parsed format string, reusable for measuring and rendering.
#[derive(Debug, Clone)]
pub struct FormatTemplate<'a> {
    segments: Vec<FormatSegment<'a>>,
    /// A fixed width or precision is beyond [`MAX_OUTPUT`].
    overflow: bool,
}

impl<'a> FormatTemplate<'a> {
    #[must_use]
    pub fn parse(fmt: &'a [u8]) -> Self {
        let segments = parse_format_string(fmt);
        let overflow = segments
            .iter()
            .any(|seg| matches!(seg, FormatSegment::Spec(spec) if spec.exceeds_limits()));
        Self { segments, overflow }
    }

    #[must_use]
    pub fn segments(&self) -> &[FormatSegment<'a>] {
        &self.segments
    }

    /// The variadic slots this template consumes, in call order.
    ///
    /// A template that can only fail consumes nothing.
    #[must_use]
    pub fn arg_slots(&self) -> Vec<ArgSlot> {
        let mut slots = Vec::new();
        if self.overflow {
            return slots;
        }
        let int_slot = ArgSlot {
            class: ArgClass::Int,
            limit: ReadLimit::Unbounded,
        };
        for seg in &self.segments {
            let FormatSegment::Spec(spec) = seg else {
                continue;
            };
            if matches!(spec.width, Width::FromArg) {
                slots.push(int_slot);
            }
            let limit = match spec.precision {
                Precision::None => ReadLimit::Unbounded,
                Precision::Fixed(p) => ReadLimit::Fixed(p),
                Precision::FromArg => {
                    slots.push(int_slot);
                    ReadLimit::PrecedingArg
                }
            };
            if let Some(class) = spec.arg_class() {
                let limit = match class {
                    ArgClass::CStr | ArgClass::WideStr => limit,
                    _ => ReadLimit::Unbounded,
                };
                slots.push(ArgSlot { class, limit });
            }
        }
        slots
    }

    /// C types of [`FormatTemplate::arg_slots`].
    #[must_use]
    pub fn arg_classes(&self) -> Vec<ArgClass> {
        self.arg_slots().into_iter().map(|slot| slot.class).collect()
    }

    /// Dry-run: number of bytes [`FormatTemplate::render_into`] will produce.
    pub fn try_measure(&self, args: &[FormatArg<'_>]) -> Result<usize, FormatOverflow> {
        let mut counter = ByteCounter::default();
        self.render_into(args, &mut counter)?;
        if counter.len() > MAX_OUTPUT {
            return Err(FormatOverflow);
        }
        Ok(counter.len())
    }

    /// Like [`FormatTemplate::try_measure`]; an overflowing format measures 0.
    #[must_use]
    pub fn measure(&self, args: &[FormatArg<'_>]) -> usize {
        self.try_measure(args).unwrap_or(0)
    }

    /// Measure, then render into a buffer sized exactly for the result.
    /// An overflowing format renders as an empty message.
    #[must_use]
    pub fn format(&self, args: &[FormatArg<'_>]) -> Vec<u8> {
        let Ok(len) = self.try_measure(args) else {
            return Vec::new();
        };
        // One spare byte mirrors the C buffer's terminator slot.
        let mut buf = Vec::with_capacity(len + 1);
        if self.render_into(args, &mut buf).is_err() {
            return Vec::new();
        }
        debug_assert_eq!(buf.len(), len);
        buf
    }

    /// Render the template with `args`. Missing arguments render as nothing;
    /// surplus arguments are ignored.
    pub fn render_into<S: Sink>(
        &self,
        args: &[FormatArg<'_>],
        out: &mut S,
    ) -> Result<(), FormatOverflow> {
        if self.overflow {
            return Err(FormatOverflow);
        }
        let mut next = args.iter();

        for seg in &self.segments {
            match seg {
                FormatSegment::Literal(lit) => out.put(lit),
                FormatSegment::Percent => out.put(b"%"),
                FormatSegment::Spec(spec) => {
                    let mut resolved = spec.clone();
                    if matches!(spec.width, Width::FromArg) {
                        resolved.width = match next.next() {
                            Some(arg) => {
                                let w = arg.as_signed() as i32;
                                let abs = w.unsigned_abs() as usize;
                                if abs > MAX_OUTPUT {
                                    return Err(FormatOverflow);
                                }
                                if w < 0 {
                                    resolved.flags.left_justify = true;
                                    resolved.flags.zero_pad = false;
                                }
                                Width::Fixed(abs)
                            }
                            None => Width::None,
                        };
                    }
                    if matches!(spec.precision, Precision::FromArg) {
                        resolved.precision = match next.next() {
                            Some(arg) => {
                                let p = arg.as_signed() as i32;
                                if p < 0 {
                                    Precision::None
                                } else {
                                    Precision::Fixed(p as usize)
                                }
                            }
                            None => Precision::None,
                        };
                    }

                    let Some(arg) = next.next() else {
                        continue;
                    };
                    render_spec(&resolved, arg, out);
                }
            }
        }
        Ok(())
    }
}

fn render_spec<S: Sink>(spec: &FormatSpec, arg: &FormatArg<'_>, out: &mut S) {
    match spec.conversion {
        b'd' | b'i' => {
            let raw = arg.as_signed();
            let val = match spec.length {
                LengthMod::Hh => (raw as i8) as i64,
                LengthMod::H => (raw as i16) as i64,
                LengthMod::None => (raw as i32) as i64,
                _ => raw,
            };
            format_signed(val, spec, out);
        }
        b'u' | b'x' | b'X' | b'o' => {
            let raw = arg.as_unsigned();
            let val = match spec.length {
                LengthMod::Hh => (raw as u8) as u64,
                LengthMod::H => (raw as u16) as u64,
                LengthMod::None => (raw as u32) as u64,
                _ => raw,
            };
            format_unsigned(val, spec, out);
        }
        b'f' | b'F' | b'e' | b'E' | b'g' | b'G' | b'a' | b'A' => {
            format_float(arg.as_float(), spec, out);
        }
        b'c' | b'C' if spec.is_wide() => format_wide_char(arg.as_unsigned() as u32, spec, out),
        b'c' => format_char(arg.as_signed() as u8, spec, out),
        b's' | b'S' => match arg {
            FormatArg::Str(Some(bytes)) => format_str(bytes, spec, out),
            FormatArg::WideStr(Some(units)) => format_wide_str(units, spec, out),
            _ => format_str(b"(null)", spec, out),
        },
        b'p' => format_pointer(arg.as_unsigned() as usize, spec, out),
        // %n consumes its pointer and writes nothing back.
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

struct Field<'b> {
    sign: Option<u8>,
    prefix: &'b [u8],
    leading_zeros: usize,
    body: &'b [u8],
    trailing_zeros: usize,
    suffix: &'b [u8],
}

impl<'b> Field<'b> {
    fn new(body: &'b [u8]) -> Self {
        Self {
            sign: None,
            prefix: b"",
            leading_zeros: 0,
            body,
            trailing_zeros: 0,
            suffix: b"",
        }
    }
}

fn emit_field<S: Sink>(out: &mut S, spec: &FormatSpec, field: Field<'_>, zero_pad: bool) {
    let content = [
        usize::from(field.sign.is_some()),
        field.prefix.len(),
        field.leading_zeros,
        field.body.len(),
        field.trailing_zeros,
        field.suffix.len(),
    ]
    .into_iter()
    .fold(0_usize, usize::saturating_add);
    let pad_total = resolve_width(spec).saturating_sub(content);
    let left = spec.flags.left_justify;
    let zero_pad = zero_pad && !left;

    if !left && !zero_pad {
        out.put_repeat(b' ', pad_total);
    }
    if let Some(s) = field.sign {
        out.put(&[s]);
    }
    out.put(field.prefix);
    if zero_pad {
        out.put_repeat(b'0', pad_total);
    }
    out.put_repeat(b'0', field.leading_zeros);
    out.put(field.body);
    out.put_repeat(b'0', field.trailing_zeros);
    out.put(field.suffix);
    if left {
        out.put_repeat(b' ', pad_total);
    }
}

fn sign_char(negative: bool, spec: &FormatSpec) -> Option<u8> {
    if negative {
        Some(b'-')
    } else if spec.flags.force_sign {
        Some(b'+')
    } else if spec.flags.space_sign {
        Some(b' ')
    } else {
        None
    }
}

/// Integer zero padding is ignored once a precision is given.
fn int_zero_pad(spec: &FormatSpec) -> bool {
    spec.flags.zero_pad && matches!(spec.precision, Precision::None)
}

/// Render a signed integer according to `spec`.
pub fn format_signed<S: Sink>(value: i64, spec: &FormatSpec, out: &mut S) {
    let abs = value.unsigned_abs();
    let (base, uppercase) = int_base(spec.conversion);
    let mut digits = [0u8; 64];
    let digit_count = render_digits(abs, base, uppercase, &mut digits);

    let precision = match spec.precision {
        Precision::Fixed(p) => p,
        _ => 1,
    };
    // Explicit precision 0 with value 0: no digits emitted.
    let suppress_zero = value == 0 && matches!(spec.precision, Precision::Fixed(0));
    let body: &[u8] = if suppress_zero {
        b""
    } else {
        &digits[64 - digit_count..]
    };
    let leading_zeros = if suppress_zero {
        0
    } else {
        precision.saturating_sub(digit_count)
    };

    emit_field(
        out,
        spec,
        Field {
            sign: sign_char(value < 0, spec),
            leading_zeros,
            ..Field::new(body)
        },
        int_zero_pad(spec),
    );
}

/// Render an unsigned integer according to `spec`.
pub fn format_unsigned<S: Sink>(value: u64, spec: &FormatSpec, out: &mut S) {
    let (base, uppercase) = int_base(spec.conversion);
    let mut digits = [0u8; 64];
    let digit_count = render_digits(value, base, uppercase, &mut digits);

    let precision = match spec.precision {
        Precision::Fixed(p) => p,
        _ => 1,
    };
    let suppress_zero = value == 0 && matches!(spec.precision, Precision::Fixed(0));
    let body: &[u8] = if suppress_zero {
        b""
    } else {
        &digits[64 - digit_count..]
    };
    let mut leading_zeros = if suppress_zero {
        0
    } else {
        precision.saturating_sub(digit_count)
    };

    let mut prefix = if value != 0 { alt_prefix(spec) } else { b"" };
    // '#o' guarantees a leading zero; the precision padding may already supply it.
    if spec.conversion == b'o' && spec.flags.alt_form {
        prefix = b"";
        if leading_zeros == 0 && (value != 0 || suppress_zero) {
            leading_zeros = 1;
        }
    }

    emit_field(
        out,
        spec,
        Field {
            prefix,
            leading_zeros,
            ..Field::new(body)
        },
        int_zero_pad(spec),
    );
}

/// Render a floating-point value according to `spec`.
pub fn format_float<S: Sink>(value: f64, spec: &FormatSpec, out: &mut S) {
    let explicit_precision = match spec.precision {
        Precision::Fixed(p) => Some(p),
        _ => None,
    };
    let precision = explicit_precision.unwrap_or(6);
    let uppercase = spec.conversion.is_ascii_uppercase();
    let negative = value.is_sign_negative();

    if !value.is_finite() {
        let word: &[u8] = match (value.is_nan(), uppercase) {
            (true, false) => b"nan",
            (true, true) => b"NAN",
            (false, false) => b"inf",
            (false, true) => b"INF",
        };
        let field = Field {
            sign: sign_char(negative && !value.is_nan(), spec),
            ..Field::new(word)
        };
        return emit_field(out, spec, field, false);
    }

    let abs = value.abs();
    let alt = spec.flags.alt_form;
    let text = match spec.conversion | 0x20 {
        b'a' => format_a(abs, explicit_precision, uppercase, alt),
        b'e' => format_e(abs, precision, uppercase, alt),
        b'g' => format_g(abs, precision, uppercase, alt),
        _ => format_f(abs, precision, alt),
    };

    emit_field(
        out,
        spec,
        Field {
            sign: sign_char(negative, spec),
            prefix: text.prefix,
            leading_zeros: 0,
            body: text.body.as_bytes(),
            trailing_zeros: text.trailing_zeros,
            suffix: text.suffix.as_bytes(),
        },
        spec.flags.zero_pad,
    );
}

/// Render a string argument. Precision truncates.
pub fn format_str<S: Sink>(s: &[u8], spec: &FormatSpec, out: &mut S) {
    let max_len = match spec.precision {
        Precision::Fixed(p) => p,
        _ => s.len(),
    };
    let body = &s[..s.len().min(max_len)];
    emit_field(out, spec, Field::new(body), false);
}

/// Render a wide string as UTF-8. Precision caps the output bytes and never
/// splits a character.
pub fn format_wide_str<S: Sink>(units: &[u32], spec: &FormatSpec, out: &mut S) {
    let max_len = match spec.precision {
        Precision::Fixed(p) => p,
        _ => usize::MAX,
    };
    let mut bytes = Vec::with_capacity(units.len());
    for &unit in units {
        let mut utf8 = [0u8; 4];
        let encoded = wide_char(unit).encode_utf8(&mut utf8).as_bytes();
        if bytes.len() + encoded.len() > max_len {
            break;
        }
        bytes.extend_from_slice(encoded);
    }
    emit_field(out, spec, Field::new(&bytes), false);
}

/// Render a single character.
pub fn format_char<S: Sink>(c: u8, spec: &FormatSpec, out: &mut S) {
    emit_field(out, spec, Field::new(&[c]), false);
}

/// Render a single wide character as UTF-8.
pub fn format_wide_char<S: Sink>(unit: u32, spec: &FormatSpec, out: &mut S) {
    let mut utf8 = [0u8; 4];
    let encoded = wide_char(unit).encode_utf8(&mut utf8).as_bytes();
    emit_field(out, spec, Field::new(encoded), false);
}

/// Render a pointer as `0x...` hex, or `(nil)` for null.
pub fn format_pointer<S: Sink>(addr: usize, spec: &FormatSpec, out: &mut S) {
    let mut digits = [0u8; 64];
    let (prefix, body): (&[u8], &[u8]) = if addr == 0 {
        (b"", b"(nil)")
    } else {
        let count = render_digits(addr as u64, 16, false, &mut digits);
        (b"0x", &digits[64 - count..])
    };
    emit_field(
        out,
        spec,
        Field {
            prefix,
            ..Field::new(body)
        },
        false,
    );
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn parse_decimal(digits: &[u8]) -> usize {
    let mut result = 0_usize;
    for &d in digits {
        result = result
            .saturating_mul(10)
            .saturating_add((d - b'0') as usize);
    }
    result
}

fn resolve_width(spec: &FormatSpec) -> usize {
    match spec.width {
        Width::Fixed(w) => w,
        _ => 0,
    }
}

fn int_base(conversion: u8) -> (u64, bool) {
    match conversion {
        b'o' => (8, false),
        b'x' => (16, false),
        b'X' => (16, true),
        _ => (10, false),
    }
}

/// Render `value` in `base` right-aligned into `buf`; returns the digit count.
fn render_digits(mut value: u64, base: u64, uppercase: bool, buf: &mut [u8; 64]) -> usize {
    if value == 0 {
        buf[63] = b'0';
        return 1;
    }
    let alpha = if uppercase { b'A' } else { b'a' };
    let mut pos = 64;
    while value > 0 && pos > 0 {
        pos -= 1;
        let digit = (value % base) as u8;
        buf[pos] = if digit < 10 {
            b'0' + digit
        } else {
            alpha + (digit - 10)
        };
        value /= base;
    }
    64 - pos
}

fn alt_prefix(spec: &FormatSpec) -> &'static [u8] {
    if !spec.flags.alt_form {
        return b"";
    }
    match spec.conversion {
        b'x' => b"0x",
        b'X' => b"0X",
        _ => b"",
    }
}

/// Invalid code points render as U+FFFD.
fn wide_char(unit: u32) -> char {
    char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// A rendered float: `prefix`, `body`, `trailing_zeros` zeros, then `suffix`.
/// Zero padding from the width goes between prefix and body.
struct FloatText {
    prefix: &'static [u8],
    body: String,
    trailing_zeros: usize,
    suffix: String,
}

impl FloatText {
    fn plain(body: String, trailing_zeros: usize) -> Self {
        Self {
            prefix: b"",
            body,
            trailing_zeros,
            suffix: String::new(),
        }
    }
}

/// `%f`: fixed-point decimal. `value` is non-negative and finite.
fn format_f(value: f64, precision: usize, alt_form: bool) -> FloatText {
    let exact = precision.min(EXACT_DIGITS);
    let mut body = format!("{value:.exact$}");
    if precision == 0 && alt_form {
        body.push('.');
    }
    FloatText::plain(body, precision - exact)
}

/// Mantissa digits and decimal exponent of `value` at `precision` fraction digits.
fn sci_parts(value: f64, precision: usize) -> (String, i32) {
    let s = format!("{value:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => (mantissa.to_owned(), exp.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn exponent_suffix(exp: i32, uppercase: bool) -> String {
    let e_char = if uppercase { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{e_char}{sign}{:02}", exp.unsigned_abs())
}

/// `%e`: scientific notation with at least two exponent digits.
fn format_e(value: f64, precision: usize, uppercase: bool, alt_form: bool) -> FloatText {
    let exact = precision.min(EXACT_DIGITS);
    let (mut mantissa, exp) = sci_parts(value, exact);
    if precision == 0 && alt_form {
        mantissa.push('.');
    }
    FloatText {
        suffix: exponent_suffix(exp, uppercase),
        ..FloatText::plain(mantissa, precision - exact)
    }
}

/// `%g`: `%e` or `%f` depending on the exponent, trailing zeros removed unless '#'.
fn format_g(value: f64, precision: usize, uppercase: bool, alt_form: bool) -> FloatText {
    let p = precision.max(1);
    let sig_frac = (p - 1).min(EXACT_DIGITS);
    let (mut mantissa, exp) = sci_parts(value, sig_frac);

    if exp >= -4 && i64::from(exp) < p as i64 {
        let frac_digits = (p as i64 - 1 - i64::from(exp)).max(0) as usize;
        let exact = frac_digits.min(EXACT_DIGITS);
        let mut s = format!("{value:.exact$}");
        if !alt_form {
            strip_trailing_zeros(&mut s);
            return FloatText::plain(s, 0);
        }
        if !s.contains('.') {
            s.push('.');
        }
        FloatText::plain(s, frac_digits - exact)
    } else {
        let trailing = if alt_form {
            if !mantissa.contains('.') {
                mantissa.push('.');
            }
            (p - 1) - sig_frac
        } else {
            strip_trailing_zeros(&mut mantissa);
            0
        };
        FloatText {
            suffix: exponent_suffix(exp, uppercase),
            ..FloatText::plain(mantissa, trailing)
        }
    }
}

/// `%a`: hexadecimal floating point, `0x1.hhhp±d`.
///
/// Without a precision the fraction is the shortest exact one. With a
/// precision the 52-bit fraction is rounded to nearest, ties to even; a carry
/// out of the fraction bumps the leading digit (`0x2p+0`) rather than the
/// exponent. Subnormals print as `0x0.hhhp-1022`.
fn format_a(value: f64, precision: Option<usize>, uppercase: bool, alt_form: bool) -> FloatText {
    const FRAC_DIGITS: usize = 13;
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let mut frac = bits & ((1_u64 << 52) - 1);
    let (mut lead, exp) = match (biased, frac) {
        (0, 0) => (0_u64, 0_i32),
        (0, _) => (0, -1022),
        _ => (1, biased - 1023),
    };

    let (digits, trailing_zeros) = match precision {
        Some(p) if p < FRAC_DIGITS => {
            let shift = (FRAC_DIGITS - p) * 4;
            let rem = frac & ((1_u64 << shift) - 1);
            frac >>= shift;
            let half = 1_u64 << (shift - 1);
            let odd = if p == 0 { lead & 1 == 1 } else { frac & 1 == 1 };
            if rem > half || (rem == half && odd) {
                if p == 0 {
                    lead += 1;
                } else {
                    frac += 1;
                    if frac >> (4 * p) != 0 {
                        frac = 0;
                        lead += 1;
                    }
                }
            }
            let digits = if p == 0 {
                String::new()
            } else {
                format!("{frac:0p$x}")
            };
            (digits, 0)
        }
        Some(p) => (format!("{frac:013x}"), p - FRAC_DIGITS),
        None => {
            let mut digits = format!("{frac:013x}");
            while digits.ends_with('0') {
                digits.pop();
            }
            (digits, 0)
        }
    };

    let mut body = lead.to_string();
    if !digits.is_empty() || trailing_zeros > 0 || alt_form {
        body.push('.');
    }
    body.push_str(&digits);
    let p_char = if uppercase {
        body.make_ascii_uppercase();
        'P'
    } else {
        'p'
    };
    let sign = if exp < 0 { '-' } else { '+' };

    FloatText {
        prefix: if uppercase { b"0X" } else { b"0x" },
        body,
        trailing_zeros,
        suffix: format!("{p_char}{sign}{}", exp.unsigned_abs()),
    }
}

/// Remove trailing zeros after the decimal point.
fn strip_trailing_zeros(s: &mut String) {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
