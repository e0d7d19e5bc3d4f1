/// Simulated remote validators
///
/// Fixed-latency stubs standing in for server-side checks (username
/// availability, account lookups). Each check runs on its own worker
/// thread, sleeps for a configured latency plus a little jitter, and
/// resolves through the wizard's responder with a canned result.
use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::form::Snapshot;
use crate::wizard::{Responder, StepOutcome};

/// Canned directory of taken identifiers, with simulated latency.
#[derive(Debug, Clone)]
pub struct StubDirectory {
    taken_usernames: Vec<String>,
    registered_emails: Vec<String>,
    base_latency: Duration,
    jitter: Duration,
}

impl StubDirectory {
    pub fn new(base_latency: Duration, jitter: Duration) -> Self {
        Self {
            taken_usernames: vec![
                "admin".to_string(),
                "root".to_string(),
                "test".to_string(),
                "demo".to_string(),
            ],
            registered_emails: vec![
                "taken@example.com".to_string(),
                "admin@example.com".to_string(),
            ],
            base_latency,
            jitter,
        }
    }

    pub fn with_taken_usernames(mut self, usernames: impl IntoIterator<Item = String>) -> Self {
        self.taken_usernames = usernames.into_iter().collect();
        self
    }

    pub fn with_registered_emails(mut self, emails: impl IntoIterator<Item = String>) -> Self {
        self.registered_emails = emails.into_iter().collect();
        self
    }

    /// Deferred validator checking that the username at `path` is free.
    pub fn username_available(
        &self,
        path: impl Into<String>,
    ) -> impl Fn(Snapshot, Responder) + Send + Sync + 'static {
        let path = path.into();
        let taken = self.taken_usernames.clone();
        let delay = self.base_latency;
        let jitter = self.jitter;
        move |snapshot: Snapshot, responder: Responder| {
            let path = path.clone();
            let taken = taken.clone();
            thread::spawn(move || {
                thread::sleep(simulated_delay(delay, jitter));
                let outcome = match snapshot.str_at(&path) {
                    None | Some("") => StepOutcome::Invalid("Username is required".to_string()),
                    Some(username) => {
                        tracing::debug!("[stub-directory] checked username '{}'", username);
                        if taken.iter().any(|entry| entry.eq_ignore_ascii_case(username)) {
                            StepOutcome::Invalid(format!("'{}' is already taken", username))
                        } else {
                            StepOutcome::Valid
                        }
                    }
                };
                responder.resolve(outcome);
            });
        }
    }

    /// Deferred validator checking that the email at `path` is not
    /// already registered.
    pub fn email_unregistered(
        &self,
        path: impl Into<String>,
    ) -> impl Fn(Snapshot, Responder) + Send + Sync + 'static {
        let path = path.into();
        let registered = self.registered_emails.clone();
        let delay = self.base_latency;
        let jitter = self.jitter;
        move |snapshot: Snapshot, responder: Responder| {
            let path = path.clone();
            let registered = registered.clone();
            thread::spawn(move || {
                thread::sleep(simulated_delay(delay, jitter));
                let outcome = match snapshot.str_at(&path) {
                    None | Some("") => StepOutcome::Invalid("Email is required".to_string()),
                    Some(email) => {
                        tracing::debug!("[stub-directory] checked email '{}'", email);
                        if registered.iter().any(|entry| entry.eq_ignore_ascii_case(email)) {
                            StepOutcome::Invalid(format!("'{}' is already registered", email))
                        } else {
                            StepOutcome::Valid
                        }
                    }
                };
                responder.resolve(outcome);
            });
        }
    }
}

impl Default for StubDirectory {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_millis(200))
    }
}

/// Lift a synchronous check into a deferred validator that resolves
/// after a fixed delay, simulating a round trip.
pub fn fixed_latency(
    delay: Duration,
    check: impl Fn(&Snapshot) -> StepOutcome + Send + Sync + Clone + 'static,
) -> impl Fn(Snapshot, Responder) + Send + Sync + 'static {
    move |snapshot: Snapshot, responder: Responder| {
        let check = check.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            responder.resolve(check(&snapshot));
        });
    }
}

fn simulated_delay(base: Duration, jitter: Duration) -> Duration {
    let jitter_ms = jitter.as_millis() as u64;
    if jitter_ms == 0 {
        return base;
    }
    base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
}
