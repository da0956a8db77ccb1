// Report rendering for the result views

use crate::source::ViewData;
use crate::text::{TEXT_SECTIONS, TextBreakdown};
use crate::views::{
    ScoreBand, Section, SectionTable, average_criterion_score, display_score, summary,
    top_performer,
};
use crate::vision::VisionBrowser;
use serde::Serialize;

pub const EMPTY_MESSAGE: &str = "No analysis data available. Please run an analysis first.";
pub const EMPTY_HINT: &str =
    "Fill in the form with `webcompare form set` and run `webcompare form submit`, or use `webcompare analyze`.";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

pub fn render_summary(
    data: &ViewData,
    section: Option<Section>,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    let Some(result) = data.result() else {
        return render_empty(format);
    };
    let sections: Vec<Section> = section
        .map(|s| vec![s])
        .unwrap_or_else(|| Section::ALL.to_vec());

    if format == ReportFormat::Json {
        let mut overview = summary(result);
        overview.sections.retain(|table| sections.contains(&table.section));
        return to_json(data, "summary", &overview);
    }

    let mut report = String::new();
    push_banner(&mut report, "WEBSITE DESIGN COMPARISON");
    push_fixture_notice(&mut report, data);

    let overview = summary(result);
    report.push_str(&format!("Websites:      {}\n", overview.websites.join(", ")));
    if let Some(top) = top_performer(&result.full) {
        report.push_str(&format!(
            "Top Performer: {}  {}  (average criterion {})\n",
            top.name,
            display_score(top.score),
            display_score(average_criterion_score(top))
        ));
    }
    report.push('\n');

    for section in sections {
        let table = SectionTable::build(result, section);
        push_heading(&mut report, &section.title().to_uppercase());
        push_table(&mut report, &table);
        report.push('\n');
    }

    Ok(report)
}

fn push_table(report: &mut String, table: &SectionTable) {
    if table.is_empty() {
        report.push_str(&format!("  {}\n", table.section.empty_message()));
        return;
    }

    let name_width = table
        .rows
        .iter()
        .map(|row| row.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Website".len());
    let widths: Vec<usize> = table
        .criteria
        .iter()
        .map(|c| c.chars().count().max(7))
        .collect();

    report.push_str(&format!("  {:<3} {:<name_width$}  {:<7}", "#", "Website", "Score"));
    for (criterion, width) in table.criteria.iter().zip(&widths) {
        report.push_str(&format!("  {:<width$}", criterion, width = *width));
    }
    report.push('\n');

    for (idx, row) in table.rows.iter().enumerate() {
        report.push_str(&format!(
            "  {:<3} {:<name_width$}  {:<7}",
            idx + 1,
            row.name,
            display_score(row.score)
        ));
        for (value, width) in row.criteria.iter().zip(&widths) {
            let cell = value.map(display_score).unwrap_or_else(|| "-".to_string());
            report.push_str(&format!("  {:<width$}", cell, width = *width));
        }
        report.push('\n');
    }

    if let Some(top) = &table.top {
        report.push_str(&format!(
            "\n  Top performer: {} ({})\n",
            top.name,
            display_score(top.score)
        ));
        for (criterion, value) in &top.criteria {
            report.push_str(&format!(
                "    {:<24} {:<8} {}\n",
                criterion,
                display_score(*value),
                ScoreBand::of(*value).as_str()
            ));
        }
    }
}

pub fn render_text_analysis(
    data: &ViewData,
    section: Option<Section>,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    let Some(result) = data.result() else {
        return render_empty(format);
    };
    let mut breakdown = TextBreakdown::build(result);
    if let Some(section) = section {
        breakdown.sections.retain(|s| s.section == section);
    }

    if format == ReportFormat::Json {
        return to_json(data, "text_analysis", &breakdown);
    }

    let mut report = String::new();
    push_banner(&mut report, "TEXT ANALYSIS");
    push_fixture_notice(&mut report, data);

    if let Some(section) = section
        && !TEXT_SECTIONS.contains(&section)
    {
        report.push_str(&format!(
            "Text analysis covers the header, main and footer sections, not {}.\n",
            section
        ));
        return Ok(report);
    }

    for text_section in &breakdown.sections {
        push_heading(&mut report, &text_section.section.title().to_uppercase());

        if text_section.entries.is_empty() {
            report.push_str(&format!("  {}\n\n", text_section.section.empty_message()));
            continue;
        }

        for (idx, entry) in text_section.entries.iter().enumerate() {
            report.push_str(&format!(
                "[{}] {}  {} ({})\n",
                idx + 1,
                entry.name,
                display_score(entry.score),
                entry.band.as_str()
            ));
            if !entry.has_text() {
                report.push_str("    No text analysis returned for this section\n\n");
                continue;
            }
            push_list(&mut report, "Strengths", '+', &entry.strengths);
            push_list(&mut report, "Weaknesses", '-', &entry.weaknesses);
            push_list(&mut report, "Recommendations", '*', &entry.recommendations);
            report.push('\n');
        }
    }

    Ok(report)
}

pub fn render_vision(
    data: &ViewData,
    asset_base: &str,
    website: Option<&str>,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    let Some(result) = data.result() else {
        return render_empty(format);
    };
    let mut browser = VisionBrowser::build(result, asset_base);
    if let Some(name) = website {
        browser.websites.retain(|w| w.name.eq_ignore_ascii_case(name));
    }

    if format == ReportFormat::Json {
        return to_json(data, "vision_improvements", &browser);
    }

    let mut report = String::new();
    push_banner(&mut report, "VISION IMPROVEMENTS");
    push_fixture_notice(&mut report, data);

    if browser.websites.is_empty() {
        match website {
            Some(name) => report.push_str(&format!("No vision data for website '{}'\n", name)),
            None => report.push_str("No vision improvements were returned for this analysis\n"),
        }
        return Ok(report);
    }

    for site in &browser.websites {
        push_heading(&mut report, &site.name);
        if let Some(url) = &site.url {
            report.push_str(&format!("URL:           {}\n", url));
        }
        if let Some(score) = site.overall_score {
            report.push_str(&format!("Overall Score: {:.1}/10\n", score));
        }
        if let Some(screenshot) = &site.screenshot_url {
            report.push_str(&format!("Screenshot:    {}\n", screenshot));
        }
        report.push_str(&format!(
            "Improvements:  {} (high {}, medium {}, low {})\n\n",
            site.counts.total(),
            site.counts.high,
            site.counts.medium,
            site.counts.low
        ));

        for improvement in &site.improvements {
            report.push_str(&format!(
                "  [{}] {}\n",
                improvement.severity.as_str().to_uppercase(),
                improvement.category
            ));
            report.push_str(&wrap_text(&improvement.description, 80, "      "));
            if improvement.recommendations.len() > 1 {
                for recommendation in &improvement.recommendations {
                    report.push_str(&wrap_text(&format!("- {}", recommendation), 80, "        "));
                }
            }
            report.push('\n');
        }
    }

    Ok(report)
}

pub fn render_empty(format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "report": {
                "metadata": metadata("none"),
                "empty": true,
                "message": EMPTY_MESSAGE,
                "hint": EMPTY_HINT
            }
        })),
        ReportFormat::Text => Ok(format!("{}\n{}\n", EMPTY_MESSAGE, EMPTY_HINT)),
    }
}

fn to_json<T: Serialize>(
    data: &ViewData,
    kind: &str,
    body: &T,
) -> Result<String, serde_json::Error> {
    let source = if data.is_fixture() { "fixture" } else { "cache" };
    serde_json::to_string_pretty(&serde_json::json!({
        "report": {
            "metadata": metadata(source),
            kind: body
        }
    }))
}

fn metadata(source: &str) -> serde_json::Value {
    serde_json::json!({
        "generator": "webcompare",
        "version": env!("CARGO_PKG_VERSION"),
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "source": source
    })
}

fn push_banner(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push_str(&format!("{:^78}\n", title));
    report.push_str(RULE);
    report.push('\n');
}

fn push_heading(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push_str(title);
    report.push('\n');
    report.push_str(RULE);
    report.push('\n');
}

fn push_fixture_notice(report: &mut String, data: &ViewData) {
    if data.is_fixture() {
        report.push_str("Showing sample data: no analysis has been cached for this session.\n\n");
    }
}

fn push_list(report: &mut String, label: &str, marker: char, items: &[String]) {
    if items.is_empty() {
        return;
    }
    report.push_str(&format!("    {}:\n", label));
    for item in items {
        report.push_str(&wrap_text(&format!("{} {}", marker, item), 80, "      "));
    }
}

fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut result = String::new();
    let mut current_line = String::new();
    let available = width.saturating_sub(indent.len()).max(1);

    for word in text.split_whitespace() {
        if !current_line.is_empty() && current_line.len() + word.len() + 1 > available {
            result.push_str(indent);
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        result.push_str(indent);
        result.push_str(&current_line);
        result.push('\n');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_respects_width() {
        let wrapped = wrap_text("one two three four five six", 14, "  ");
        for line in wrapped.lines() {
            assert!(line.len() <= 14, "line too long: {line:?}");
            assert!(line.starts_with("  "));
        }
        assert_eq!(wrapped.split_whitespace().count(), 6);
    }

    #[test]
    fn test_report_format_from_str() {
        assert_eq!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
        assert_eq!(ReportFormat::from_str("html"), None);
    }
}
