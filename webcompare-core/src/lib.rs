pub mod analyze;
pub mod cache;
pub mod config;
pub mod data;
pub mod draft;
pub mod error;
pub mod report;
pub mod session;
pub mod source;
pub mod storage;
pub mod text;
pub mod views;
pub mod vision;
pub mod watch;

pub use webcompare_client::{ComparisonResult, SectionScore, WebsiteInput};
