/// Declarative validation rules
///
/// A schema is a pure description of validation rules over dot-paths,
/// consumed by the wizard (or any other observer) against snapshots. It
/// never touches form values and holds no state of its own.
use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AppResult, SchemaError};
use crate::form::Snapshot;
use crate::wizard::StepOutcome;

/// Built-in validation rules for one field path.
///
/// Apart from `Required`, `MinItems` and `MaxItems`, rules are skipped
/// for blank values so optional fields stay optional.
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
    Pattern { regex: Regex, message: String },
    Min(f64),
    Max(f64),
    OneOf(Vec<String>),
    MinItems(usize),
    MaxItems(usize),
}

impl Rule {
    /// Compile a custom pattern rule. Bad patterns fail here, at schema
    /// build time, never during validation.
    pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Self, SchemaError> {
        let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Rule::Pattern {
            regex,
            message: message.into(),
        })
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
    })
}

type RefineCheck = Arc<dyn Fn(&Snapshot) -> bool + Send + Sync>;

#[derive(Clone)]
struct Refinement {
    path: String,
    message: String,
    check: RefineCheck,
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

/// Everything that failed for one validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    issues: Vec<FieldIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn first_message(&self) -> Option<&str> {
        self.issues.first().map(|issue| issue.message.as_str())
    }

    /// Issues whose path falls under any of the given prefixes.
    fn retain_under(mut self, prefixes: &[&str]) -> Self {
        self.issues.retain(|issue| {
            prefixes.iter().any(|prefix| {
                issue.path == *prefix
                    || issue
                        .path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('.'))
            })
        });
        self
    }
}

/// Declarative rule set over dot-paths, with cross-field refinements.
#[derive(Clone, Default)]
pub struct Schema {
    fields: Vec<(String, Vec<Rule>)>,
    refinements: Vec<Refinement>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(
        mut self,
        path: impl Into<String>,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Self {
        self.fields.push((path.into(), rules.into_iter().collect()));
        self
    }

    /// Cross-field check: when `check` returns false, an issue with
    /// `message` is reported at `path`.
    pub fn refine(
        mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        check: impl Fn(&Snapshot) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.refinements.push(Refinement {
            path: path.into(),
            message: message.into(),
            check: Arc::new(check),
        });
        self
    }

    /// Run every rule and refinement against the snapshot.
    pub fn validate(&self, snapshot: &Snapshot) -> ValidationReport {
        let mut issues = Vec::new();
        for (path, rules) in &self.fields {
            for rule in rules {
                if let Some(message) = check_rule(rule, snapshot, path) {
                    issues.push(FieldIssue {
                        path: path.clone(),
                        message,
                    });
                }
            }
        }
        for refinement in &self.refinements {
            if !(refinement.check)(snapshot) {
                issues.push(FieldIssue {
                    path: refinement.path.clone(),
                    message: refinement.message.clone(),
                });
            }
        }
        ValidationReport { issues }
    }

    /// Validate only the fields (and refinements) under the given path
    /// prefixes — the per-step slice of a larger form schema.
    pub fn validate_paths(&self, snapshot: &Snapshot, prefixes: &[&str]) -> ValidationReport {
        self.validate(snapshot).retain_under(prefixes)
    }

    /// Adapt a slice of this schema into a wizard step validator that
    /// reports the first failure message.
    pub fn step_validator(
        &self,
        prefixes: &[&str],
    ) -> impl Fn(&Snapshot) -> AppResult<StepOutcome> + Send + Sync + 'static {
        let schema = self.clone();
        let prefixes: Vec<String> = prefixes.iter().map(|prefix| prefix.to_string()).collect();
        move |snapshot| {
            let borrowed: Vec<&str> = prefixes.iter().map(String::as_str).collect();
            let report = schema.validate_paths(snapshot, &borrowed);
            Ok(match report.first_message() {
                None => StepOutcome::Valid,
                Some(message) => StepOutcome::Invalid(message.to_string()),
            })
        }
    }
}

fn check_rule(rule: &Rule, snapshot: &Snapshot, path: &str) -> Option<String> {
    let blank = snapshot.is_blank(path);
    match rule {
        Rule::Required => blank.then(|| "Value is required".to_string()),
        Rule::MinItems(min) => {
            let len = snapshot.array_len(path).unwrap_or(0);
            (len < *min).then(|| format!("Add at least {} item(s)", min))
        }
        Rule::MaxItems(max) => {
            let len = snapshot.array_len(path).unwrap_or(0);
            (len > *max).then(|| format!("No more than {} items allowed", max))
        }
        // Remaining rules only constrain present values.
        _ if blank => None,
        Rule::MinLength(min) => {
            let len = snapshot.str_at(path).map(|text| text.chars().count())?;
            (len < *min).then(|| format!("Must be at least {} characters", min))
        }
        Rule::MaxLength(max) => {
            let len = snapshot.str_at(path).map(|text| text.chars().count())?;
            (len > *max).then(|| format!("Must be at most {} characters", max))
        }
        Rule::Email => match snapshot.str_at(path) {
            Some(text) if email_regex().is_match(text) => None,
            _ => Some("Enter a valid email address".to_string()),
        },
        Rule::Pattern { regex, message } => match snapshot.str_at(path) {
            Some(text) if regex.is_match(text) => None,
            _ => Some(message.clone()),
        },
        Rule::Min(min) => match snapshot.f64_at(path) {
            Some(value) if value >= *min => None,
            Some(_) => Some(format!("Must be at least {}", min)),
            None => Some("Must be a number".to_string()),
        },
        Rule::Max(max) => match snapshot.f64_at(path) {
            Some(value) if value <= *max => None,
            Some(_) => Some(format!("Must be at most {}", max)),
            None => Some("Must be a number".to_string()),
        },
        Rule::OneOf(choices) => match snapshot.str_at(path) {
            Some(text) if choices.iter().any(|choice| choice == text) => None,
            _ => Some(format!("Must be one of: {}", choices.join(", "))),
        },
    }
}
