pub mod client;
pub mod error;
pub mod result;

pub use client::{AnalysisClient, DEFAULT_ENDPOINT};
pub use error::ClientError;
pub use result::{
    AnalyzedWebsite, ComparisonRequest, ComparisonResult, SectionAnalysis, SectionScore,
    VisionCategory, WebsiteInput,
};
