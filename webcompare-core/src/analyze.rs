use crate::cache::ResultCache;
use crate::draft::{Category, DraftSubmission, FormError, SubmissionForm};
use crate::error::StorageError;
use crate::session::SessionId;
use thiserror::Error;
use tracing::info;
use webcompare_client::{
    AnalysisClient, ClientError, ComparisonRequest, ComparisonResult, WebsiteInput,
};

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error("Analysis failed: {0}")]
    Client(#[from] ClientError),

    #[error("Analysis succeeded but the result could not be cached: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;

/// Runs one analysis and records its result for the session.
pub struct Analyzer<'a> {
    client: &'a AnalysisClient,
    cache: &'a ResultCache,
    session: &'a SessionId,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        client: &'a AnalysisClient,
        cache: &'a ResultCache,
        session: &'a SessionId,
    ) -> Self {
        Self {
            client,
            cache,
            session,
        }
    }

    /// Requests a comparison of the complete entries in `websites`.
    ///
    /// The result is in the cache before this returns. On any failure the
    /// cache is left untouched.
    pub async fn submit(
        &self,
        websites: &[WebsiteInput],
        category: Category,
    ) -> Result<ComparisonResult> {
        let request = DraftSubmission {
            websites: websites.to_vec(),
            category,
        }
        .to_request()?;
        self.run(&request).await
    }

    /// Submits the form's draft. A second call while one is running is rejected.
    pub async fn submit_form(&self, form: &SubmissionForm<'_>) -> Result<ComparisonResult> {
        let pending = form.begin_submit()?;
        self.run(&pending.request).await
    }

    async fn run(&self, request: &ComparisonRequest) -> Result<ComparisonResult> {
        let result = self.client.compare(request).await?;
        self.cache.write(&result, self.session)?;
        info!(
            "Analysis of {} websites stored for session {}",
            request.websites.len(),
            self.session
        );
        Ok(result)
    }
}
