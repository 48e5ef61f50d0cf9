//! Runs every shipped fixture through the verifier and checks the evidence
//! trail (JSONL log + artifact index) a verification run produces.

use std::path::Path;

use fmi2cb_harness::structured_log::{
    ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, validate_log_line,
};
use fmi2cb_harness::{FixtureError, FixtureSet, VerificationSummary, verify_set};

const FIXTURE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

#[test]
fn shipped_fixtures_all_pass() {
    let sets = FixtureSet::load_path(Path::new(FIXTURE_DIR)).expect("fixtures load");
    assert!(sets.len() >= 2);

    let results = sets.iter().flat_map(|(_, set)| verify_set(set)).collect();
    let summary = VerificationSummary::from_results(results);
    let failures: Vec<_> = summary
        .failures()
        .map(|r| (r.case_name.clone(), r.failures.clone(), r.actual.clone()))
        .collect();
    assert!(summary.all_passed(), "{failures:#?}");
    assert!(summary.total >= 20);
}

#[test]
fn status_family_covers_every_label() {
    let path = Path::new(FIXTURE_DIR).join("status_labels.json");
    let set = FixtureSet::from_file(&path).expect("status fixtures");
    assert_eq!(set.family, "status");
    for label in ["OK", "Warning", "Discard", "Error", "Fatal", "Pending", "Unknown"] {
        let prefix = format!("[{label}]");
        assert!(
            set.cases
                .iter()
                .any(|c| c.expected.as_deref().is_some_and(|e| e.starts_with(&prefix))),
            "no case for {label}"
        );
    }
}

#[test]
fn verification_run_emits_valid_jsonl() {
    let (_, set) = FixtureSet::load_path(Path::new(FIXTURE_DIR))
        .expect("fixtures load")
        .into_iter()
        .find(|(_, set)| set.family == "logger")
        .expect("logger family");

    let mut emitter = LogEmitter::to_buffer("itest");
    for result in verify_set(&set) {
        let case = set
            .cases
            .iter()
            .find(|c| c.name == result.case_name)
            .expect("case");
        emitter
            .emit_entry(
                LogEntry::new("", LogLevel::Info, "fixture_case")
                    .with_family(&set.family)
                    .with_case(&case.name, case.status)
                    .with_outcome(if result.passed {
                        Outcome::Pass
                    } else {
                        Outcome::Fail
                    }),
            )
            .expect("emit");
    }
    assert_eq!(emitter.emitted(), set.cases.len() as u64);

    let text = String::from_utf8(emitter.into_inner()).expect("utf8");
    for line in text.lines() {
        let entry = validate_log_line(line).expect("valid log line");
        assert_eq!(entry.outcome, Some(Outcome::Pass));
        assert!(entry.trace_id.starts_with("fmi2cb::itest::"));
    }
}

#[test]
fn artifact_index_hashes_fixture_files() {
    let path = Path::new(FIXTURE_DIR).join("logger_cases.json");
    let mut index = ArtifactIndex::new("itest");
    index.add_file(&path, "fixture").expect("hash fixture");

    let entry = &index.artifacts[0];
    assert_eq!(entry.kind, "fixture");
    assert_eq!(entry.sha256.len(), 64);
    assert!(entry.sha256.bytes().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(
        entry.size_bytes,
        std::fs::metadata(&path).expect("metadata").len()
    );

    let json: serde_json::Value = serde_json::from_str(&index.to_json().expect("json")).unwrap();
    assert_eq!(json["index_version"], 1);
    assert_eq!(json["artifacts"][0]["sha256"], entry.sha256.as_str());
}

#[test]
fn missing_fixture_path_is_reported() {
    let err = FixtureSet::load_path(Path::new(FIXTURE_DIR).join("no-such-dir").as_path())
        .expect_err("missing dir");
    assert!(matches!(err, FixtureError::Io { .. }));
}
