//! Console line layout of the FMI logger.
//!
//! `[<STATUS>][<category>][<instanceName>]: <message>\n`
//!
//! Hosts scrape this line, so the layout is fixed.

use crate::printf::Sink;
use crate::status::status_label;

/// Placeholder for a null `fmi2String` column.
pub const NULL_COLUMN: &[u8] = b"(null)";

/// Write one complete log line, terminator included.
pub fn write_log_line<S: Sink>(
    out: &mut S,
    status: i32,
    category: &[u8],
    instance_name: &[u8],
    message: &[u8],
) {
    out.put(b"[");
    out.put(status_label(status).as_bytes());
    out.put(b"][");
    out.put(category);
    out.put(b"][");
    out.put(instance_name);
    out.put(b"]: ");
    out.put(message);
    out.put(b"\n");
}

/// Build a log line in a buffer sized for it.
#[must_use]
pub fn log_line(status: i32, category: &[u8], instance_name: &[u8], message: &[u8]) -> Vec<u8> {
    let len = status_label(status).len() + category.len() + instance_name.len() + message.len() + 9;
    let mut buf = Vec::with_capacity(len);
    write_log_line(&mut buf, status, category, instance_name, message);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printf::{ByteCounter, FormatArg, FormatTemplate};
    use crate::status::Status;

    #[test]
    fn warning_scenario_layout() {
        let message = FormatTemplate::parse(b"value=%d").format(&[FormatArg::SignedInt(42)]);
        let line = log_line(Status::Warning.as_raw(), b"Init", b"Model1", &message);
        assert_eq!(line, b"[Warning][Init][Model1]: value=42\n");
    }

    #[test]
    fn out_of_range_status_renders_unknown() {
        let line = log_line(99, b"cat", b"inst", b"msg");
        assert_eq!(line, b"[Unknown][cat][inst]: msg\n");
    }

    #[test]
    fn exactly_one_terminator() {
        let line = log_line(0, b"", b"", b"");
        assert_eq!(line, b"[OK][][]: \n");
        assert_eq!(line.iter().filter(|&&b| b == b'\n').count(), 1);
    }

    #[test]
    fn capacity_estimate_is_exact() {
        let line = log_line(3, b"logStatusError", b"bouncingBall", b"h < 0");
        let mut counter = ByteCounter::default();
        write_log_line(&mut counter, 3, b"logStatusError", b"bouncingBall", b"h < 0");
        assert_eq!(line.len(), counter.len());
    }
}
