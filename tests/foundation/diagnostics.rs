//! Integration tests for recoverable diagnostics

use mapstudio_foundation::{DiagnosticKind, Diagnostics, Family};

use crate::support::init_tracing;

#[test]
fn diagnostics_accumulate_in_order() {
    init_tracing();
    let mut diagnostics = Diagnostics::new();
    diagnostics.push(
        DiagnosticKind::PlaceholderNode,
        Family::Region,
        "R_missing",
        "no region named R_missing",
    );
    diagnostics.push(
        DiagnosticKind::DuplicateName,
        Family::Part,
        "PieceA",
        "declared twice",
    );

    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics.count_of(DiagnosticKind::PlaceholderNode), 1);
    let names: Vec<_> = diagnostics.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["R_missing", "PieceA"]);
}

#[test]
fn diagnostics_serialize() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.push(
        DiagnosticKind::CycleDisagreement,
        Family::Part,
        "h0001",
        "sides disagree",
    );
    let json = serde_json::to_string(&diagnostics).unwrap();
    assert!(json.contains("CycleDisagreement"));
    let back: Diagnostics = serde_json::from_str(&json).unwrap();
    assert_eq!(back, diagnostics);
}

#[test]
fn display_names_kind_and_record() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.push(
        DiagnosticKind::MissingPayload,
        Family::Model,
        "m0001",
        "payload not found",
    );
    let line = diagnostics.iter().next().unwrap().to_string();
    assert!(line.contains("missing-payload"));
    assert!(line.contains("m0001"));
}
