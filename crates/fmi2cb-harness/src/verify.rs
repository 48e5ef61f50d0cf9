//! Verification of fixture cases against the core renderer.

use serde::Serialize;

use fmi2cb_core::log_line::log_line;
use fmi2cb_core::printf::{FormatArg, FormatTemplate};

use crate::fixtures::{FixtureArg, FixtureCase, FixtureSet};

/// Outcome of one fixture case.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub case_name: String,
    pub passed: bool,
    /// Measured message length from the dry-run pass.
    pub measured_len: usize,
    pub line_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Rendered line; omitted for very long lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

/// Longest rendered line kept verbatim in a result.
const MAX_ECHO: usize = 512;

/// Render the console line the logger would emit for `case`.
#[must_use]
pub fn render_case(case: &FixtureCase) -> Vec<u8> {
    render_case_measured(case).0
}

fn render_case_measured(case: &FixtureCase) -> (Vec<u8>, usize) {
    let payloads: Vec<Option<Vec<u8>>> = case.args.iter().map(FixtureArg::payload).collect();
    let args: Vec<FormatArg<'_>> = case
        .args
        .iter()
        .zip(&payloads)
        .map(|(arg, payload)| match arg {
            FixtureArg::Int(v) => FormatArg::SignedInt(*v),
            FixtureArg::Uint(v) => FormatArg::UnsignedInt(*v),
            FixtureArg::Float(v) => FormatArg::Float(*v),
            FixtureArg::Pointer(p) => FormatArg::Pointer(*p),
            FixtureArg::Null => FormatArg::Str(None),
            FixtureArg::Str(_) | FixtureArg::Fill { .. } => FormatArg::Str(payload.as_deref()),
        })
        .collect();

    let template = FormatTemplate::parse(case.format.as_bytes());
    let measured = template.measure(&args);
    let message = template.format(&args);
    let line = log_line(
        case.status,
        case.category.as_bytes(),
        case.instance.as_bytes(),
        &message,
    );
    (line, measured)
}

/// Render `case` and check every expectation it carries.
#[must_use]
pub fn verify_case(case: &FixtureCase) -> VerificationResult {
    let (line, measured_len) = render_case_measured(case);
    let mut failures = Vec::new();

    let prefix_len = line.len().saturating_sub(measured_len + 1);
    if line.len() < measured_len + 1 || !line[..prefix_len].ends_with(b"]: ") {
        failures.push(format!(
            "message length {} disagrees with line length {}",
            measured_len,
            line.len()
        ));
    }
    if line.last() != Some(&b'\n') || line.iter().filter(|&&b| b == b'\n').count() != 1 {
        failures.push("line must end in exactly one line break".to_string());
    }
    if let Some(expected) = &case.expected {
        if expected.as_bytes() != line.as_slice() {
            failures.push("line differs from expected".to_string());
        }
    }
    if let Some(expected_len) = case.expected_len {
        if expected_len != line.len() {
            failures.push(format!(
                "expected {expected_len} bytes, rendered {}",
                line.len()
            ));
        }
    }
    if case.expected.is_none() && case.expected_len.is_none() {
        failures.push("case has no expectation".to_string());
    }

    VerificationResult {
        case_name: case.name.clone(),
        passed: failures.is_empty(),
        measured_len,
        line_len: line.len(),
        expected: case.expected.clone(),
        actual: (line.len() <= MAX_ECHO).then(|| String::from_utf8_lossy(&line).into_owned()),
        failures,
    }
}

/// Verify every case of a set, in order.
#[must_use]
pub fn verify_set(set: &FixtureSet) -> Vec<VerificationResult> {
    set.cases.iter().map(verify_case).collect()
}

/// Summary of a verification run.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    #[must_use]
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            results,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Results that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}
