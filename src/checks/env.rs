//! Environment variable check.

use super::CheckMeta;
use crate::checkup::{Check, CheckContext, CheckDependency, Diagnosis, Platform};
use crate::config::EnvConfig;
use crate::error::Result;

/// Warns when a variable is unset. A set value is copied into the run's
/// environment so later commands see it.
#[derive(Debug, Clone)]
pub struct EnvVarCheck {
    meta: CheckMeta,
    name: String,
}

impl EnvVarCheck {
    pub fn from_config(config: &EnvConfig) -> Self {
        Self {
            meta: CheckMeta::new(
                &config.id,
                config.title.as_deref(),
                &config.platforms,
                &config.depends_on,
            ),
            name: config.name.clone(),
        }
    }
}

impl Check for EnvVarCheck {
    fn id(&self) -> &str {
        &self.meta.id
    }

    fn title(&self) -> &str {
        &self.meta.title
    }

    fn type_name(&self) -> &'static str {
        "EnvVarCheck"
    }

    fn dependencies(&self, _all_ids: &[String]) -> Vec<CheckDependency> {
        self.meta.dependencies()
    }

    fn is_platform_supported(&self, platform: Platform) -> bool {
        self.meta.supports(platform)
    }

    fn examine(&self, ctx: &mut CheckContext<'_>) -> Result<Diagnosis> {
        // Values set earlier in the run win over the process environment.
        let value = ctx
            .state
            .env(&self.name)
            .map(String::from)
            .or_else(|| std::env::var(&self.name).ok())
            .filter(|v| !v.is_empty());

        match value {
            Some(value) => {
                ctx.state.set_env(self.name.as_str(), value.as_str());
                Ok(Diagnosis::ok(self.id()).with_message(format!("{}={}", self.name, value)))
            }
            None => Ok(Diagnosis::warning(
                self.id(),
                format!("{} is not set", self.name),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::checkup::{NullProgress, Status};
    use crate::state::SharedState;

    fn check(name: &str) -> EnvVarCheck {
        EnvVarCheck::from_config(&EnvConfig {
            id: "env".to_string(),
            name: name.to_string(),
            ..Default::default()
        })
    }

    fn examine(check: &EnvVarCheck, state: &mut SharedState) -> Diagnosis {
        let mut progress = NullProgress;
        let cancel = CancelToken::new();
        let mut ctx = CheckContext::new(state, &mut progress, &cancel, Platform::current());
        check.examine(&mut ctx).unwrap()
    }

    #[test]
    fn unset_variable_warns() {
        let diagnosis = examine(
            &check("CHECKUP_SURELY_UNSET_VARIABLE"),
            &mut SharedState::new(),
        );
        assert_eq!(diagnosis.status(), Status::Warning);
        assert!(!diagnosis.has_remediation());
    }

    #[test]
    fn value_from_state_counts() {
        let mut state = SharedState::new();
        state.set_env("CHECKUP_FROM_STATE", "/opt/jdk");
        let diagnosis = examine(&check("CHECKUP_FROM_STATE"), &mut state);
        assert_eq!(diagnosis.status(), Status::Ok);
        assert_eq!(diagnosis.message(), Some("CHECKUP_FROM_STATE=/opt/jdk"));
    }

    #[test]
    fn process_value_is_copied_into_state() {
        let mut state = SharedState::new();
        let diagnosis = examine(&check("PATH"), &mut state);
        assert_eq!(diagnosis.status(), Status::Ok);
        assert!(state.env("PATH").is_some());
    }
}
