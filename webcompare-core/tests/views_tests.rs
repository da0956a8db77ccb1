// Tests for the result view projections and report rendering

use tempfile::TempDir;
use webcompare_core::ComparisonResult;
use webcompare_core::cache::{DATA_KEY, OWNER_KEY, ResultCache};
use webcompare_core::report::{
    EMPTY_MESSAGE, ReportFormat, render_summary, render_text_analysis, render_vision,
};
use webcompare_core::session::SessionId;
use webcompare_core::source::{FixtureSource, ViewData, compose};
use webcompare_core::storage::KeyValueStore;
use webcompare_core::text::TextBreakdown;
use webcompare_core::views::{
    ScoreBand, Section, SectionTable, average_criterion_score, display_score, format_score,
    summary, top_performer,
};
use webcompare_core::vision::{Severity, VisionBrowser};

const ASSET_BASE: &str = "http://localhost:5000";

fn sample() -> ComparisonResult {
    FixtureSource::sample().unwrap()
}

fn two_site_result() -> ComparisonResult {
    serde_json::from_value(serde_json::json!({
        "full": [
            {"name": "B", "score": 0.6, "criteria": {"Layout": 0.6, "Clarity": 0.55}},
            {"name": "A", "score": 0.9, "criteria": {"Layout": 0.9, "Clarity": 0.8, "Speed": 1.0}}
        ]
    }))
    .unwrap()
}

// ============================================================================
// Comparison Table Tests
// ============================================================================

#[test]
fn test_score_formatting() {
    assert_eq!(format_score(0.847), 85);
    assert_eq!(format_score(1.0), 100);
    assert_eq!(format_score(0.0), 0);
    assert_eq!(display_score(0.9), "90/100");
}

#[test]
fn test_top_performer_has_greatest_score() {
    let result = sample();
    for section in Section::ALL {
        let entries = section.entries(&result);
        let top = top_performer(entries).unwrap();
        let max = entries.iter().map(|e| e.score).fold(f64::MIN, f64::max);
        assert_eq!(top.score, max, "section {section}");
    }
}

#[test]
fn test_average_criterion_score() {
    let result = two_site_result();
    let a = &result.full[1];
    assert!((average_criterion_score(a) - 0.9).abs() < 1e-9);

    let mut empty = a.clone();
    empty.criteria.clear();
    assert_eq!(average_criterion_score(&empty), 0.0);
}

#[test]
fn test_table_sorts_copy_and_uses_first_row_criteria() {
    let result = two_site_result();
    let table = SectionTable::build(&result, Section::Full);

    assert_eq!(table.rows[0].name, "A");
    assert_eq!(table.rows[1].name, "B");
    // Columns come from "B", the first row as delivered
    assert_eq!(table.criteria, vec!["Clarity".to_string(), "Layout".to_string()]);
    assert_eq!(table.rows[0].criteria, vec![Some(0.8), Some(0.9)]);
    assert_eq!(table.top.as_ref().unwrap().name, "A");

    // The source order is untouched
    assert_eq!(result.full[0].name, "B");
}

#[test]
fn test_empty_section_table() {
    let result = two_site_result();
    let table = SectionTable::build(&result, Section::Footer);

    assert!(table.is_empty());
    assert!(table.top.is_none());
    assert_eq!(
        Section::Footer.empty_message(),
        "No data available for footer section"
    );
}

#[test]
fn test_summary_of_sample() {
    let overview = summary(&sample());

    assert_eq!(overview.websites, vec!["Website 1", "Website 2", "Website 3"]);
    assert_eq!(overview.top_name.as_deref(), Some("Website 2"));
    assert_eq!(overview.top_score, Some(85));
    assert_eq!(overview.sections.len(), 4);
}

#[test]
fn test_score_bands() {
    assert_eq!(ScoreBand::of(0.91), ScoreBand::Strong);
    assert_eq!(ScoreBand::of(0.55), ScoreBand::Fair);
    assert_eq!(ScoreBand::of(0.2), ScoreBand::Weak);
}

// ============================================================================
// Text Analysis Tests
// ============================================================================

#[test]
fn test_text_breakdown_uses_section_entries() {
    let breakdown = TextBreakdown::build(&sample());
    let header = breakdown.section(Section::Header).unwrap();

    assert_eq!(header.entries.len(), 3);
    assert_eq!(header.entries[0].strengths, vec!["Clear messaging", "Consistent tone"]);
    assert_eq!(header.entries[2].band, ScoreBand::Fair);
}

#[test]
fn test_text_breakdown_falls_back_to_website_sections() {
    let breakdown = TextBreakdown::build(&sample());
    let main = breakdown.section(Section::Main).unwrap();

    // Table rows carry no text; the per-website `main_content` analysis does
    assert_eq!(main.entries[2].strengths.len(), 3);
    assert_eq!(main.entries[0].recommendations, vec!["Add more specific industry terms"]);
}

#[test]
fn test_text_breakdown_skips_full_page() {
    let breakdown = TextBreakdown::build(&sample());
    assert!(breakdown.section(Section::Full).is_none());
    assert!(!breakdown.is_empty());
}

// ============================================================================
// Vision Improvement Tests
// ============================================================================

#[test]
fn test_vision_severity_and_counts() {
    let browser = VisionBrowser::build(&sample(), ASSET_BASE);
    let first = browser.find("website 1").unwrap();

    let contrast = first
        .improvements
        .iter()
        .find(|i| i.category == "Color Contrast")
        .unwrap();
    assert_eq!(contrast.severity, Severity::High);
    assert_eq!(contrast.recommendations.len(), 4);
    assert_eq!(
        contrast.description,
        "Increase contrast between text and background colors for better readability"
    );

    assert_eq!(first.counts.high, 2);
    assert_eq!(first.counts.medium, 2);
    assert_eq!(first.counts.low, 0);
    assert_eq!(first.overall_score, Some(7.2));
}

#[test]
fn test_vision_screenshot_url() {
    let browser = VisionBrowser::build(&sample(), ASSET_BASE);
    let second = browser.find("Website 2").unwrap();

    assert_eq!(
        second.screenshot_url.as_deref(),
        Some("http://localhost:5000/screenshots/website_2/website_2_full.png")
    );
}

#[test]
fn test_vision_description_fallbacks() {
    let result: ComparisonResult = serde_json::from_value(serde_json::json!({
        "websites": [{
            "name": "A",
            "vision_improvements": {
                "typography": {"current_analysis": "Serif headings", "recommendations": []},
                "white_space": {"recommendations": []}
            }
        }]
    }))
    .unwrap();

    let browser = VisionBrowser::build(&result, ASSET_BASE);
    let improvements = &browser.websites[0].improvements;

    let typography = improvements.iter().find(|i| i.category == "Typography").unwrap();
    assert_eq!(typography.description, "Serif headings");
    assert_eq!(typography.severity, Severity::Low);

    let spacing = improvements.iter().find(|i| i.category == "White Space").unwrap();
    assert_eq!(spacing.description, "No analysis available");
}

// ============================================================================
// Data Source and Report Tests
// ============================================================================

#[test]
fn test_compose_prefers_cache() {
    let temp_dir = TempDir::new().unwrap();
    let cache = ResultCache::open(&temp_dir.path().join("webcompare.db")).unwrap();
    let session = SessionId::generate();
    cache.write(&two_site_result(), &session).unwrap();

    let data = compose(&cache, session, true).load();
    assert_eq!(data, ViewData::Live(two_site_result()));
}

#[test]
fn test_compose_falls_back_to_fixture_in_diagnostics() {
    let temp_dir = TempDir::new().unwrap();
    let cache = ResultCache::open(&temp_dir.path().join("webcompare.db")).unwrap();

    let data = compose(&cache, SessionId::generate(), true).load();
    assert!(data.is_fixture());
}

#[test]
fn test_compose_without_diagnostics_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let cache = ResultCache::open(&temp_dir.path().join("webcompare.db")).unwrap();
    cache
        .database()
        .set_many(&[(DATA_KEY, "garbage"), (OWNER_KEY, "s")])
        .unwrap();

    let data = compose(&cache, SessionId::from("s"), false).load();
    assert_eq!(data, ViewData::Empty);

    let rendered = render_summary(&data, None, ReportFormat::Text).unwrap();
    assert!(rendered.starts_with(EMPTY_MESSAGE));
    assert!(rendered.contains("webcompare form submit"));
}

#[test]
fn test_summary_report_text() {
    let data = ViewData::Live(two_site_result());
    let report = render_summary(&data, Some(Section::Full), ReportFormat::Text).unwrap();

    assert!(report.contains("Top Performer: A  90/100"));
    assert!(report.contains("FULL PAGE"));
    assert!(!report.contains("HEADER"));
    assert!(!report.contains("sample data"));
}

#[test]
fn test_summary_report_marks_fixture() {
    let data = ViewData::Fixture(sample());
    let report = render_summary(&data, None, ReportFormat::Text).unwrap();
    assert!(report.contains("Showing sample data"));
}

#[test]
fn test_summary_report_empty_tab() {
    let data = ViewData::Live(two_site_result());
    let report = render_summary(&data, Some(Section::Header), ReportFormat::Text).unwrap();
    assert!(report.contains("No data available for header section"));
}

#[test]
fn test_summary_report_json() {
    let data = ViewData::Live(two_site_result());
    let report = render_summary(&data, None, ReportFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&report).unwrap();

    assert_eq!(parsed["report"]["metadata"]["source"], "cache");
    assert_eq!(parsed["report"]["summary"]["top_name"], "A");
    assert_eq!(parsed["report"]["summary"]["top_score"], 90);
}

#[test]
fn test_empty_report_json() {
    let report = render_vision(&ViewData::Empty, ASSET_BASE, None, ReportFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&report).unwrap();

    assert_eq!(parsed["report"]["empty"], true);
    assert_eq!(parsed["report"]["message"], EMPTY_MESSAGE);
}

#[test]
fn test_text_report_lists_feedback() {
    let data = ViewData::Fixture(sample());
    let report = render_text_analysis(&data, Some(Section::Header), ReportFormat::Text).unwrap();

    assert!(report.contains("Clear messaging"));
    assert!(report.contains("Strengths:"));
    assert!(!report.contains("MAIN CONTENT"));
}

#[test]
fn test_vision_report_filters_website() {
    let data = ViewData::Fixture(sample());
    let report = render_vision(&data, ASSET_BASE, Some("Website 3"), ReportFormat::Text).unwrap();

    assert!(report.contains("[HIGH] Navigation"));
    assert!(report.contains("Overall Score: 6.4/10"));
    assert!(!report.contains("Website 1"));

    let missing = render_vision(&data, ASSET_BASE, Some("Nope"), ReportFormat::Text).unwrap();
    assert!(missing.contains("No vision data for website 'Nope'"));
}
