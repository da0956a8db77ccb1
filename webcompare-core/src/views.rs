//! Read-only projections over a cached comparison result.
//!
//! Nothing here mutates the result it is given; tables are built from copies.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use webcompare_client::{ComparisonResult, SectionScore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Full,
    Header,
    Main,
    Footer,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::Full, Section::Header, Section::Main, Section::Footer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Full => "full",
            Section::Header => "header",
            Section::Main => "main",
            Section::Footer => "footer",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Full => "Full Page",
            Section::Header => "Header",
            Section::Main => "Main Content",
            Section::Footer => "Footer",
        }
    }

    pub fn entries<'r>(&self, result: &'r ComparisonResult) -> &'r [SectionScore] {
        match self {
            Section::Full => &result.full,
            Section::Header => &result.header,
            Section::Main => &result.main,
            Section::Footer => &result.footer,
        }
    }

    /// Message shown for a section with no rows
    pub fn empty_message(&self) -> String {
        format!("No data available for {} section", self.as_str())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" | "full_page" | "full-page" => Ok(Section::Full),
            "header" => Ok(Section::Header),
            "main" | "main_content" | "main-content" => Ok(Section::Main),
            "footer" => Ok(Section::Footer),
            other => Err(format!(
                "Unknown section '{}' (expected full, header, main or footer)",
                other
            )),
        }
    }
}

/// Entry with the highest score. Ties keep the earliest entry.
pub fn top_performer(entries: &[SectionScore]) -> Option<&SectionScore> {
    entries.iter().fold(None, |best: Option<&SectionScore>, entry| match best {
        Some(current) if current.score >= entry.score => Some(current),
        _ => Some(entry),
    })
}

/// Mean of the criterion values, 0 when there are none
pub fn average_criterion_score(entry: &SectionScore) -> f64 {
    if entry.criteria.is_empty() {
        return 0.0;
    }
    entry.criteria.values().sum::<f64>() / entry.criteria.len() as f64
}

/// 0.0-1.0 score as a whole number out of 100
pub fn format_score(score: f64) -> u32 {
    (score * 100.0).round().max(0.0) as u32
}

pub fn display_score(score: f64) -> String {
    format!("{}/100", format_score(score))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 0.7 {
            ScoreBand::Strong
        } else if score >= 0.5 {
            ScoreBand::Fair
        } else {
            ScoreBand::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Strong => "strong",
            ScoreBand::Fair => "fair",
            ScoreBand::Weak => "weak",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub name: String,
    pub score: f64,
    /// One value per column of the table; `None` where the row lacks it
    pub criteria: Vec<Option<f64>>,
}

/// One section of the comparison table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionTable {
    pub section: Section,
    pub criteria: Vec<String>,
    pub rows: Vec<TableRow>,
    pub top: Option<SectionScore>,
}

impl SectionTable {
    pub fn build(result: &ComparisonResult, section: Section) -> Self {
        let entries = section.entries(result);

        // Column set comes from the first entry as delivered
        let criteria: Vec<String> = entries
            .first()
            .map(|first| first.criteria.keys().cloned().collect())
            .unwrap_or_default();

        let mut sorted: Vec<&SectionScore> = entries.iter().collect();
        sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

        let rows = sorted
            .into_iter()
            .map(|entry| TableRow {
                name: entry.name.clone(),
                score: entry.score,
                criteria: criteria
                    .iter()
                    .map(|c| entry.criteria.get(c).copied())
                    .collect(),
            })
            .collect();

        Self {
            section,
            criteria,
            rows,
            top: top_performer(entries).cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Headline numbers for the whole result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub websites: Vec<String>,
    pub top_name: Option<String>,
    pub top_score: Option<u32>,
    pub top_average_criterion: Option<u32>,
    pub sections: Vec<SectionTable>,
}

pub fn summary(result: &ComparisonResult) -> Summary {
    let top = top_performer(&result.full);

    let mut websites: Vec<String> = result.websites.iter().map(|w| w.name.clone()).collect();
    if websites.is_empty() {
        websites = result.full.iter().map(|e| e.name.clone()).collect();
    }

    Summary {
        websites,
        top_name: top.map(|t| t.name.clone()),
        top_score: top.map(|t| format_score(t.score)),
        top_average_criterion: top.map(|t| format_score(average_criterion_score(t))),
        sections: Section::ALL
            .iter()
            .map(|section| SectionTable::build(result, *section))
            .collect(),
    }
}
