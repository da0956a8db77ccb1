use crate::cache::ResultCache;
use crate::error::StorageResult;
use crate::session::SessionId;
use tracing::{debug, warn};
use webcompare_client::ComparisonResult;

const SAMPLE_COMPARISON: &str = include_str!("../fixtures/sample_comparison.json");

/// Where a view gets its comparison result from
pub trait ResultSource {
    fn name(&self) -> &'static str;

    fn load(&self) -> StorageResult<Option<ComparisonResult>>;
}

/// The session's cache entry
pub struct CacheSource<'a> {
    cache: &'a ResultCache,
    session: SessionId,
}

impl<'a> CacheSource<'a> {
    pub fn new(cache: &'a ResultCache, session: SessionId) -> Self {
        Self { cache, session }
    }
}

impl ResultSource for CacheSource<'_> {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn load(&self) -> StorageResult<Option<ComparisonResult>> {
        Ok(self.cache.read(&self.session)?.into_result())
    }
}

/// Built-in sample data shown when diagnostics are enabled
pub struct FixtureSource;

impl FixtureSource {
    pub fn sample() -> StorageResult<ComparisonResult> {
        Ok(serde_json::from_str(SAMPLE_COMPARISON)?)
    }
}

impl ResultSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn load(&self) -> StorageResult<Option<ComparisonResult>> {
        Self::sample().map(Some)
    }
}

/// What a view ended up with
#[derive(Debug, Clone, PartialEq)]
pub enum ViewData {
    Live(ComparisonResult),
    Fixture(ComparisonResult),
    Empty,
}

impl ViewData {
    pub fn result(&self) -> Option<&ComparisonResult> {
        match self {
            ViewData::Live(result) | ViewData::Fixture(result) => Some(result),
            ViewData::Empty => None,
        }
    }

    pub fn is_fixture(&self) -> bool {
        matches!(self, ViewData::Fixture(_))
    }
}

/// A primary source with an optional fallback for when it has nothing
pub struct ViewSources<'a> {
    primary: Box<dyn ResultSource + 'a>,
    fallback: Option<Box<dyn ResultSource + 'a>>,
}

impl<'a> ViewSources<'a> {
    pub fn new(
        primary: Box<dyn ResultSource + 'a>,
        fallback: Option<Box<dyn ResultSource + 'a>>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Never fails: source errors are logged and treated as absent
    pub fn load(&self) -> ViewData {
        match self.primary.load() {
            Ok(Some(result)) => return ViewData::Live(result),
            Ok(None) => debug!("No data from {} source", self.primary.name()),
            Err(e) => warn!("Failed to load from {} source: {}", self.primary.name(), e),
        }
        self.fallback_data()
    }

    /// Applies a pushed update, falling back the same way `load` does
    pub fn resolve(&self, fresh: Option<ComparisonResult>) -> ViewData {
        match fresh {
            Some(result) => ViewData::Live(result),
            None => self.fallback_data(),
        }
    }

    fn fallback_data(&self) -> ViewData {
        let Some(fallback) = &self.fallback else {
            return ViewData::Empty;
        };
        match fallback.load() {
            Ok(Some(result)) => ViewData::Fixture(result),
            Ok(None) => ViewData::Empty,
            Err(e) => {
                warn!("Failed to load from {} source: {}", fallback.name(), e);
                ViewData::Empty
            }
        }
    }
}

/// Cache first, then the sample data when `diagnostics` is set
pub fn compose(cache: &ResultCache, session: SessionId, diagnostics: bool) -> ViewSources<'_> {
    let fallback: Option<Box<dyn ResultSource + '_>> = if diagnostics {
        Some(Box::new(FixtureSource))
    } else {
        None
    };
    ViewSources::new(Box::new(CacheSource::new(cache, session)), fallback)
}
