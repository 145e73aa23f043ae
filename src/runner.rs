//! Sequential execution of suites against one client and one session
//!
//! Login happens lazily, at most once, when the first step that needs a
//! bearer token comes up. Step failures never escape: they become
//! records, and steps that cannot run become skips.

use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::auth;
use crate::client::ApiClient;
use crate::config::Settings;
use crate::error::ProbeError;
use crate::report::{Reporter, TestRecord};
use crate::step::{Step, request_and_assert};
use crate::suite::Suite;
use crate::vars::Vars;

const AUTH_RECORD: &str = "authentication";
const LOGIN_FAILED: &str = "login failed";
const NO_CREDENTIALS: &str = "no credentials configured";
const HALTED: &str = "halted after failure";

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub stop_on_failure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Pending,
    Active,
    Failed,
    NoCredentials,
}

pub struct Runner<'a> {
    client: ApiClient,
    settings: &'a Settings,
    reporter: &'a mut Reporter,
    vars: Vars,
    session: SessionState,
    stop_on_failure: bool,
    halted: bool,
}

impl<'a> Runner<'a> {
    pub fn new(settings: &'a Settings, reporter: &'a mut Reporter, options: RunOptions) -> Self {
        let mut vars = Vars::new();
        vars.insert("base_url", settings.base_url.as_str());
        vars.insert("login_path", settings.login_path.as_str());
        vars.insert("run_id", run_id());

        let session = match &settings.credentials {
            Some(credentials) => {
                vars.insert("email", credentials.email.as_str());
                vars.insert("password", credentials.password.as_str());
                SessionState::Pending
            }
            None => SessionState::NoCredentials,
        };

        Self {
            client: ApiClient::new(&settings.base_url, settings.timeout),
            settings,
            reporter,
            vars,
            session,
            stop_on_failure: options.stop_on_failure,
            halted: false,
        }
    }

    #[cfg(test)]
    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub fn run_suite(&mut self, suite: &Suite) {
        info!(suite = %suite.name, steps = suite.steps.len(), "running suite");
        self.reporter.section(&suite.name, &suite.description);
        for step in &suite.steps {
            self.run_step(&suite.name, step);
        }
    }

    pub fn run_step(&mut self, suite: &str, step: &Step) {
        let label = format!("{}: {}", suite, step.name);

        if self.halted {
            self.skip(&label, HALTED);
            return;
        }

        if step.auth {
            if let Err(reason) = self.authenticate() {
                self.skip(&label, reason);
                return;
            }
        }

        let started = Instant::now();
        match request_and_assert(&self.client, step, &self.vars) {
            Ok(assertion) => {
                for (name, value) in assertion.captured {
                    debug!(variable = %name, "captured value");
                    self.vars.insert(&name, value);
                }
                self.reporter.log_result(TestRecord::passed(
                    &label,
                    assertion.status,
                    assertion.elapsed,
                ));
            }
            Err(ProbeError::Unresolved { name }) => {
                self.skip(&label, &format!("no value for ${{{}}}", name));
            }
            Err(err) => {
                debug!(step = %label, error = %err, "step failed");
                self.reporter
                    .log_result(TestRecord::failed(&label, &err, started.elapsed()));
                self.note_failure();
            }
        }
    }

    /// Log in now, unless that already happened (or cannot happen).
    ///
    /// Records an `authentication` result on the first attempt.
    pub fn authenticate(&mut self) -> Result<(), &'static str> {
        match self.session {
            SessionState::Active => return Ok(()),
            SessionState::Failed => return Err(LOGIN_FAILED),
            SessionState::NoCredentials => return Err(NO_CREDENTIALS),
            SessionState::Pending => {}
        }

        let settings = self.settings;
        let Some(credentials) = &settings.credentials else {
            self.session = SessionState::NoCredentials;
            return Err(NO_CREDENTIALS);
        };

        let started = Instant::now();
        match auth::login(&self.client, &settings.login_path, credentials) {
            Ok(session) => {
                info!(
                    user_id = session.user_id.as_deref().unwrap_or("unknown"),
                    "authenticated"
                );
                let mut record = TestRecord::passed(AUTH_RECORD, 200, started.elapsed());
                if let Some(user_id) = &session.user_id {
                    self.vars.insert("user_id", user_id.as_str());
                    record = record.with_details(&format!("logged in as user {}", user_id));
                }
                self.client.set_token(session.token);
                self.reporter.log_result(record);
                self.session = SessionState::Active;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                self.reporter
                    .log_result(TestRecord::failed(AUTH_RECORD, &err, started.elapsed()));
                self.session = SessionState::Failed;
                self.note_failure();
                Err(LOGIN_FAILED)
            }
        }
    }

    fn skip(&mut self, label: &str, reason: &str) {
        info!(step = %label, reason, "step skipped");
        self.reporter.log_skip(label, reason);
    }

    fn note_failure(&mut self) {
        if self.stop_on_failure {
            self.halted = true;
        }
    }
}

/// Short identifier used to tag resources created during this run
fn run_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{:x}", millis)
}
