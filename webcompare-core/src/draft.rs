use crate::error::StorageError;
use crate::session::SessionId;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, warn};
use webcompare_client::{ComparisonRequest, WebsiteInput};

pub const FORM_DATA_KEY: &str = "websiteFormData";
pub const FORM_CATEGORY_KEY: &str = "websiteFormCategory";

pub const MIN_WEBSITES: usize = 2;
pub const DEFAULT_SLOTS: usize = 3;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Please provide at least 2 websites to compare")]
    TooFewWebsites,

    #[error("An analysis is already running for this form")]
    SubmissionInFlight,

    #[error(
        "Unknown category '{0}' (expected one of: ecommerce, blog, portfolio, corporate, saas)"
    )]
    UnknownCategory(String),

    #[error("No website slot {index}; the form has {len} slots")]
    NoSuchSlot { index: usize, len: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Ecommerce,
    Blog,
    Portfolio,
    Corporate,
    Saas,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Ecommerce,
        Category::Blog,
        Category::Portfolio,
        Category::Corporate,
        Category::Saas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Ecommerce => "ecommerce",
            Category::Blog => "blog",
            Category::Portfolio => "portfolio",
            Category::Corporate => "corporate",
            Category::Saas => "saas",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Ecommerce => "E-commerce",
            Category::Blog => "Blog",
            Category::Portfolio => "Portfolio",
            Category::Corporate => "Corporate",
            Category::Saas => "SaaS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ecommerce" | "e-commerce" => Ok(Category::Ecommerce),
            "blog" => Ok(Category::Blog),
            "portfolio" => Ok(Category::Portfolio),
            "corporate" => Ok(Category::Corporate),
            "saas" => Ok(Category::Saas),
            _ => Err(FormError::UnknownCategory(s.to_string())),
        }
    }
}

/// Checks the at-least-two complete entries rule
pub fn validate_websites(websites: &[WebsiteInput]) -> Result<(), FormError> {
    let complete = websites.iter().filter(|w| w.is_complete()).count();
    if complete < MIN_WEBSITES {
        return Err(FormError::TooFewWebsites);
    }
    Ok(())
}

/// The in-progress form contents
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSubmission {
    pub websites: Vec<WebsiteInput>,
    pub category: Category,
}

impl Default for DraftSubmission {
    fn default() -> Self {
        Self {
            websites: vec![WebsiteInput::default(); DEFAULT_SLOTS],
            category: Category::default(),
        }
    }
}

impl DraftSubmission {
    pub fn set_website(
        &mut self,
        index: usize,
        name: Option<&str>,
        url: Option<&str>,
    ) -> Result<(), FormError> {
        let len = self.websites.len();
        let slot = self
            .websites
            .get_mut(index)
            .ok_or(FormError::NoSuchSlot { index, len })?;
        if let Some(name) = name {
            slot.name = name.to_string();
        }
        if let Some(url) = url {
            slot.url = url.to_string();
        }
        Ok(())
    }

    pub fn add_website(&mut self) -> usize {
        self.websites.push(WebsiteInput::default());
        self.websites.len() - 1
    }

    /// Removes a slot. The form never shrinks below two slots.
    pub fn remove_website(&mut self, index: usize) -> Result<WebsiteInput, FormError> {
        let len = self.websites.len();
        if index >= len {
            return Err(FormError::NoSuchSlot { index, len });
        }
        if len <= MIN_WEBSITES {
            return Err(FormError::TooFewWebsites);
        }
        Ok(self.websites.remove(index))
    }

    /// Entries with both fields filled, in form order
    pub fn filled_websites(&self) -> Vec<WebsiteInput> {
        self.websites
            .iter()
            .filter(|w| w.is_complete())
            .map(|w| WebsiteInput::new(w.name.trim(), w.url.trim()))
            .collect()
    }

    pub fn validate(&self) -> Result<(), FormError> {
        validate_websites(&self.websites)
    }

    pub fn to_request(&self) -> Result<ComparisonRequest, FormError> {
        self.validate()?;
        Ok(ComparisonRequest {
            websites: self.filled_websites(),
            category: self.category.as_str().to_string(),
        })
    }
}

pub fn is_draft_key(key: &str) -> bool {
    [FORM_DATA_KEY, FORM_CATEGORY_KEY].iter().any(|prefix| {
        key == *prefix
            || key
                .strip_prefix(*prefix)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// Reads and writes the draft of one session
pub struct DraftStore<'a> {
    store: &'a dyn KeyValueStore,
    data_key: String,
    category_key: String,
}

impl<'a> DraftStore<'a> {
    pub fn new(store: &'a dyn KeyValueStore, session: &SessionId) -> Self {
        Self {
            store,
            data_key: format!("{}.{}", FORM_DATA_KEY, session),
            category_key: format!("{}.{}", FORM_CATEGORY_KEY, session),
        }
    }

    /// Loads the saved draft. Unreadable parts fall back to their defaults.
    pub fn load(&self) -> Result<DraftSubmission, FormError> {
        let values = self
            .store
            .get_many(&[self.data_key.as_str(), self.category_key.as_str()])?;
        let mut values = values.into_iter();
        let data = values.next().flatten();
        let category = values.next().flatten();

        let mut draft = DraftSubmission::default();

        if let Some(data) = data {
            match serde_json::from_str::<Vec<WebsiteInput>>(&data) {
                Ok(websites) if !websites.is_empty() => draft.websites = websites,
                Ok(_) => {}
                Err(e) => warn!("Ignoring unreadable saved form data: {}", e),
            }
        }

        if let Some(category) = category {
            match category.parse() {
                Ok(category) => draft.category = category,
                Err(e) => warn!("Ignoring saved form category: {}", e),
            }
        }

        Ok(draft)
    }

    pub fn save(&self, draft: &DraftSubmission) -> Result<(), FormError> {
        let data = serde_json::to_string(&draft.websites).map_err(StorageError::from)?;
        self.store.set_many(&[
            (self.data_key.as_str(), data.as_str()),
            (self.category_key.as_str(), draft.category.as_str()),
        ])?;
        debug!("Saved form draft ({} slots)", draft.websites.len());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), FormError> {
        self.store
            .remove_many(&[self.data_key.as_str(), self.category_key.as_str()])?;
        Ok(())
    }
}

/// The submission form: a draft that is saved after every edit, plus a
/// guard against overlapping submissions.
pub struct SubmissionForm<'a> {
    drafts: DraftStore<'a>,
    draft: DraftSubmission,
    in_flight: AtomicBool,
}

impl<'a> SubmissionForm<'a> {
    pub fn load(store: &'a dyn KeyValueStore, session: &SessionId) -> Result<Self, FormError> {
        let drafts = DraftStore::new(store, session);
        let draft = drafts.load()?;
        Ok(Self {
            drafts,
            draft,
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn draft(&self) -> &DraftSubmission {
        &self.draft
    }

    pub fn set_website(
        &mut self,
        index: usize,
        name: Option<&str>,
        url: Option<&str>,
    ) -> Result<(), FormError> {
        self.draft.set_website(index, name, url)?;
        self.drafts.save(&self.draft)
    }

    pub fn add_website(&mut self) -> Result<usize, FormError> {
        let index = self.draft.add_website();
        self.drafts.save(&self.draft)?;
        Ok(index)
    }

    pub fn remove_website(&mut self, index: usize) -> Result<WebsiteInput, FormError> {
        let removed = self.draft.remove_website(index)?;
        self.drafts.save(&self.draft)?;
        Ok(removed)
    }

    pub fn set_category(&mut self, category: Category) -> Result<(), FormError> {
        self.draft.category = category;
        self.drafts.save(&self.draft)
    }

    /// Back to three empty slots and the default category
    pub fn reset(&mut self) -> Result<(), FormError> {
        self.draft = DraftSubmission::default();
        self.drafts.clear()
    }

    /// Validates the draft and marks a submission as running. The returned
    /// guard releases the form when dropped.
    pub fn begin_submit(&self) -> Result<PendingSubmission<'_>, FormError> {
        let request = self.draft.to_request()?;
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FormError::SubmissionInFlight);
        }
        Ok(PendingSubmission {
            request,
            flag: &self.in_flight,
        })
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

pub struct PendingSubmission<'f> {
    pub request: ComparisonRequest,
    flag: &'f AtomicBool,
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_draft() {
        let draft = DraftSubmission::default();
        assert_eq!(draft.websites.len(), 3);
        assert_eq!(draft.category, Category::Ecommerce);
        assert!(draft.websites.iter().all(|w| !w.is_complete()));
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("SaaS".parse::<Category>().unwrap(), Category::Saas);
        assert_eq!("e-commerce".parse::<Category>().unwrap(), Category::Ecommerce);
        assert!(matches!(
            "news".parse::<Category>(),
            Err(FormError::UnknownCategory(_))
        ));
        assert_eq!(Category::Saas.label(), "SaaS");
    }

    #[test]
    fn test_only_filled_entries_are_submitted() {
        let mut draft = DraftSubmission::default();
        draft.set_website(0, Some("A"), Some("http://a.test")).unwrap();
        draft.set_website(1, Some("B"), None).unwrap();
        draft.set_website(2, Some(" C "), Some(" http://c.test ")).unwrap();

        let request = draft.to_request().unwrap();
        assert_eq!(
            request.websites,
            vec![
                WebsiteInput::new("A", "http://a.test"),
                WebsiteInput::new("C", "http://c.test"),
            ]
        );
        assert_eq!(request.category, "ecommerce");
    }

    #[test]
    fn test_validation_message() {
        let mut draft = DraftSubmission::default();
        draft.set_website(0, Some("A"), Some("http://a.test")).unwrap();

        let err = draft.validate().unwrap_err();
        assert_eq!(err.to_string(), "Please provide at least 2 websites to compare");
    }

    #[test]
    fn test_remove_keeps_two_slots() {
        let mut draft = DraftSubmission::default();
        draft.remove_website(2).unwrap();

        assert!(matches!(draft.remove_website(0), Err(FormError::TooFewWebsites)));
        assert!(matches!(
            draft.remove_website(5),
            Err(FormError::NoSuchSlot { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_is_draft_key() {
        assert!(is_draft_key("websiteFormData.abc"));
        assert!(is_draft_key("websiteFormCategory"));
        assert!(!is_draft_key("websiteFormDataX"));
        assert!(!is_draft_key("websiteComparisonData"));
    }
}
