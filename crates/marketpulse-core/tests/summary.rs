use marketpulse_core::{normalize_query, AnalysisResult, AnalysisSummary};

#[test]
fn no_data_summary_has_all_fields() {
    let summary = AnalysisSummary::no_data();
    assert_eq!(summary.overview, AnalysisSummary::NO_DATA_OVERVIEW);
    assert!(summary.trends.is_empty());
    assert!(summary.competitors.is_empty());
    assert!(summary.opportunities.is_empty());
}

#[test]
fn fallback_summary_has_all_fields() {
    let summary = AnalysisSummary::fallback();
    assert_eq!(summary.overview, AnalysisSummary::FALLBACK_OVERVIEW);
    assert!(summary.trends.is_empty());
    assert!(summary.competitors.is_empty());
    assert!(summary.opportunities.is_empty());
}

#[test]
fn summary_deserializes_with_missing_lists() {
    let summary: AnalysisSummary =
        serde_json::from_str(r#"{"overview": "all good"}"#).unwrap();
    assert_eq!(summary.overview, "all good");
    assert!(summary.trends.is_empty());
    assert!(summary.competitors.is_empty());
    assert!(summary.opportunities.is_empty());
}

#[test]
fn degraded_result_is_structurally_complete() {
    let result = AnalysisResult::degraded("rust crates");
    assert_eq!(result.query, "rust crates");
    assert!(result.items.is_empty());
    assert_eq!(result.summary, AnalysisSummary::fallback());
}

#[test]
fn normalize_trims_and_lowercases() {
    assert_eq!(normalize_query("  Rust Crates  "), "rust crates");
    assert_eq!(normalize_query("rust crates"), "rust crates");
    assert_eq!(normalize_query("   "), "");
}
