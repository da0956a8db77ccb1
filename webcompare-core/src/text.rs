use crate::views::{ScoreBand, Section};
use serde::Serialize;
use webcompare_client::{ComparisonResult, SectionAnalysis};

/// Text analysis of one website within one section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextEntry {
    pub name: String,
    pub score: f64,
    pub band: ScoreBand,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

impl TextEntry {
    pub fn has_text(&self) -> bool {
        !(self.strengths.is_empty() && self.weaknesses.is_empty() && self.recommendations.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSection {
    pub section: Section,
    pub entries: Vec<TextEntry>,
}

/// Strengths, weaknesses and recommendations per section and website
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBreakdown {
    pub sections: Vec<TextSection>,
}

pub const TEXT_SECTIONS: [Section; 3] = [Section::Header, Section::Main, Section::Footer];

impl TextBreakdown {
    pub fn build(result: &ComparisonResult) -> Self {
        let sections = TEXT_SECTIONS
            .iter()
            .map(|section| TextSection {
                section: *section,
                entries: section
                    .entries(result)
                    .iter()
                    .map(|entry| {
                        let mut text = TextEntry {
                            name: entry.name.clone(),
                            score: entry.score,
                            band: ScoreBand::of(entry.score),
                            strengths: entry.strengths.clone(),
                            weaknesses: entry.weaknesses.clone(),
                            recommendations: entry.recommendations.clone(),
                        };
                        if !text.has_text()
                            && let Some(analysis) = website_section(result, &entry.name, *section)
                        {
                            text.strengths = analysis.strengths.clone();
                            text.weaknesses = analysis.weaknesses.clone();
                            text.recommendations = analysis.recommendations.clone();
                        }
                        text
                    })
                    .collect(),
            })
            .collect();

        Self { sections }
    }

    pub fn section(&self, section: Section) -> Option<&TextSection> {
        self.sections.iter().find(|s| s.section == section)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.entries.is_empty())
    }
}

/// The per-website analyses key the main section as `main_content`
fn website_section<'r>(
    result: &'r ComparisonResult,
    name: &str,
    section: Section,
) -> Option<&'r SectionAnalysis> {
    let key = match section {
        Section::Main => "main_content",
        other => other.as_str(),
    };
    result
        .websites
        .iter()
        .find(|w| w.name == name)
        .and_then(|w| w.sections.get(key))
}
