use serde::Serialize;
use url::Url;
use webcompare_client::{AnalyzedWebsite, ComparisonResult};

const NO_ANALYSIS: &str = "No analysis available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// More than three recommendations is high, one or none is low
    pub fn from_recommendation_count(count: usize) -> Self {
        if count > 3 {
            Severity::High
        } else if count <= 1 {
            Severity::Low
        } else {
            Severity::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Improvement {
    pub category: String,
    pub description: String,
    pub severity: Severity,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    fn tally(improvements: &[Improvement]) -> Self {
        let mut counts = SeverityCounts::default();
        for improvement in improvements {
            match improvement.severity {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisionWebsite {
    pub name: String,
    pub url: Option<String>,
    /// 1-10 scale, as reported
    pub overall_score: Option<f64>,
    pub screenshot_url: Option<String>,
    pub improvements: Vec<Improvement>,
    pub counts: SeverityCounts,
}

/// Vision improvement items for every analysed website
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisionBrowser {
    pub websites: Vec<VisionWebsite>,
}

impl VisionBrowser {
    pub fn build(result: &ComparisonResult, asset_base: &str) -> Self {
        Self {
            websites: result
                .websites
                .iter()
                .map(|website| vision_website(website, asset_base))
                .collect(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&VisionWebsite> {
        self.websites
            .iter()
            .find(|w| w.name.eq_ignore_ascii_case(name))
    }
}

fn vision_website(website: &AnalyzedWebsite, asset_base: &str) -> VisionWebsite {
    let improvements: Vec<Improvement> = website
        .vision_improvements
        .iter()
        .map(|(category, details)| Improvement {
            category: title_case_category(category),
            description: details
                .recommendations
                .first()
                .cloned()
                .or_else(|| details.current_analysis.clone())
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| NO_ANALYSIS.to_string()),
            severity: Severity::from_recommendation_count(details.recommendations.len()),
            recommendations: details.recommendations.clone(),
        })
        .collect();

    VisionWebsite {
        name: website.name.clone(),
        url: website.url.clone(),
        overall_score: website.overall_score,
        screenshot_url: screenshot_url(asset_base, &website.name).map(String::from),
        counts: SeverityCounts::tally(&improvements),
        improvements,
    }
}

/// `color_scheme` -> `Color Scheme`
pub fn title_case_category(category: &str) -> String {
    category
        .replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-cased name with every whitespace run replaced by `_`
pub fn screenshot_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('_');
            }
            in_whitespace = true;
        } else {
            slug.push(c);
            in_whitespace = false;
        }
    }
    slug
}

pub fn screenshot_url(asset_base: &str, name: &str) -> Option<Url> {
    let slug = screenshot_slug(name);
    let mut url = Url::parse(asset_base).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(["screenshots", slug.as_str(), format!("{slug}_full.png").as_str()]);
    Some(url)
}
