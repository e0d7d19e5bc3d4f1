/// Step definitions for wizard flows
///
/// A step carries display text, an optional validator (synchronous or
/// deferred) and an optional skip predicate. Content is an opaque payload
/// the navigation logic never inspects.
use std::fmt;

use crate::error::AppResult;
use crate::form::Snapshot;

use super::flow::Responder;

/// Result a step validator produces for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Valid,
    Invalid(String),
}

impl StepOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, StepOutcome::Valid)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            StepOutcome::Valid => None,
            StepOutcome::Invalid(message) => Some(message),
        }
    }
}

pub(crate) type SyncValidate = Box<dyn Fn(&Snapshot) -> AppResult<StepOutcome> + Send + Sync>;
pub(crate) type DeferredValidate = Box<dyn Fn(Snapshot, Responder) + Send + Sync>;
pub(crate) type SkipPredicate = Box<dyn Fn(&Snapshot) -> bool + Send + Sync>;

pub(crate) enum StepValidator {
    /// Resolves inline against the snapshot.
    Sync(SyncValidate),
    /// Starts work and resolves later through the responder, possibly
    /// from another thread.
    Deferred(DeferredValidate),
}

/// One step of a wizard flow.
pub struct StepDefinition {
    id: String,
    title: String,
    description: Option<String>,
    content: Option<String>,
    validator: Option<StepValidator>,
    skip_if: Option<SkipPredicate>,
}

impl StepDefinition {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            content: None,
            validator: None,
            skip_if: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an opaque display payload. Navigation never looks at it.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Attach a synchronous validator. An `Err` is treated as a fault,
    /// not a failure: it is logged and converted to a generic message.
    pub fn validate(
        mut self,
        check: impl Fn(&Snapshot) -> AppResult<StepOutcome> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(StepValidator::Sync(Box::new(check)));
        self
    }

    /// Attach a deferred validator: `start` receives the snapshot and a
    /// responder, and resolves whenever its work finishes.
    pub fn validate_deferred(
        mut self,
        start: impl Fn(Snapshot, Responder) + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(StepValidator::Deferred(Box::new(start)));
        self
    }

    /// Exclude this step from the navigable sequence whenever the
    /// predicate holds against the live snapshot.
    pub fn skip_if(mut self, predicate: impl Fn(&Snapshot) -> bool + Send + Sync + 'static) -> Self {
        self.skip_if = Some(Box::new(predicate));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    pub(crate) fn validator(&self) -> Option<&StepValidator> {
        self.validator.as_ref()
    }

    pub(crate) fn should_skip(&self, snapshot: &Snapshot) -> bool {
        match &self.skip_if {
            Some(predicate) => predicate(snapshot),
            None => false,
        }
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("has_validator", &self.validator.is_some())
            .field("has_skip_if", &self.skip_if.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let step = StepDefinition::new("contact", "Contact Details")
            .with_description("Company address and contacts")
            .with_content("Fill in where we can reach you.");

        assert_eq!(step.id(), "contact");
        assert_eq!(step.title(), "Contact Details");
        assert_eq!(step.description(), Some("Company address and contacts"));
        assert!(step.content().is_some());
        assert!(!step.has_validator());
    }

    #[test]
    fn test_step_without_predicate_is_never_skipped() {
        let step = StepDefinition::new("basic", "Basics");
        assert!(!step.should_skip(&Snapshot::default()));
    }

    #[test]
    fn test_skip_predicate_sees_live_values() {
        let step = StepDefinition::new("business", "Business Details")
            .skip_if(|snapshot| snapshot.str_at("customer_type") != Some("business"));

        let individual = Snapshot::new(json!({ "customer_type": "individual" }));
        let business = Snapshot::new(json!({ "customer_type": "business" }));

        assert!(step.should_skip(&individual));
        assert!(!step.should_skip(&business));
    }

    #[test]
    fn test_outcome_accessors() {
        assert!(StepOutcome::Valid.is_valid());
        assert_eq!(StepOutcome::Valid.message(), None);

        let invalid = StepOutcome::Invalid("Value is required".to_string());
        assert!(!invalid.is_valid());
        assert_eq!(invalid.message(), Some("Value is required"));
    }
}
