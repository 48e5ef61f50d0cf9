//! `fmi2Status` values and their console labels.
//!
//! Status travels across the ABI as a plain C `int`, so a misbehaving model can
//! hand the logger any value at all. [`status_label`] is therefore total over
//! `i32`, not just over the six defined variants.

/// The `fmi2Status` enumeration (FMI 2.0.2, section 2.1.3).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 0,
    Warning = 1,
    Discard = 2,
    Error = 3,
    Fatal = 4,
    Pending = 5,
}

impl Status {
    /// All defined variants in ordinal order.
    pub const ALL: [Status; 6] = [
        Status::Ok,
        Status::Warning,
        Status::Discard,
        Status::Error,
        Status::Fatal,
        Status::Pending,
    ];

    /// Map a raw `fmi2Status` value to a variant, if it is one.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Ok),
            1 => Some(Self::Warning),
            2 => Some(Self::Discard),
            3 => Some(Self::Error),
            4 => Some(Self::Fatal),
            5 => Some(Self::Pending),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    /// Human-readable label used in the logger's `[<STATUS>]` column.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "Warning",
            Self::Discard => "Discard",
            Self::Error => "Error",
            Self::Fatal => "Fatal",
            Self::Pending => "Pending",
        }
    }
}

/// Label for an arbitrary raw status value; out-of-range values yield `"Unknown"`.
#[must_use]
pub const fn status_label(raw: i32) -> &'static str {
    match Status::from_raw(raw) {
        Some(status) => status.label(),
        None => "Unknown",
    }
}
