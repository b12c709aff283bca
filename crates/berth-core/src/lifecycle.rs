use crate::CoreError;
use berth_schema::Environment;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an environment's containers and sync session are considered running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvState {
    Inactive,
    Active,
}

impl EnvState {
    pub fn of(environment: &Environment) -> Self {
        if environment.is_active() {
            EnvState::Active
        } else {
            EnvState::Inactive
        }
    }
}

impl fmt::Display for EnvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvState::Inactive => f.write_str("inactive"),
            EnvState::Active => f.write_str("active"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Install,
    Start,
    Stop,
    Restart,
    Uninstall,
    Update,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Transition::Install => "install",
            Transition::Start => "start",
            Transition::Stop => "stop",
            Transition::Restart => "restart",
            Transition::Uninstall => "uninstall",
            Transition::Update => "update",
        };
        f.write_str(s)
    }
}

/// Check `transition` against the current state; `None` means the environment
/// is not registered.
pub fn validate_transition(
    name: &str,
    current: Option<EnvState>,
    transition: Transition,
) -> Result<(), CoreError> {
    let valid = matches!(
        (current, transition),
        (None, Transition::Install)
            | (Some(_), Transition::Start)
            | (
                Some(EnvState::Active),
                Transition::Stop | Transition::Restart
            )
            | (
                Some(EnvState::Inactive),
                Transition::Uninstall | Transition::Update
            )
    );

    if valid {
        return Ok(());
    }

    let reason = match current {
        None => format!("environment '{name}' is not installed"),
        Some(_) if transition == Transition::Install => {
            format!("environment '{name}' is already installed")
        }
        Some(EnvState::Active) => {
            format!("cannot {transition} '{name}' while it is running; stop it first")
        }
        Some(EnvState::Inactive) => format!("cannot {transition} '{name}': it is not running"),
    };
    Err(CoreError::InvalidEnvironment(reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVE: Option<EnvState> = Some(EnvState::Active);
    const INACTIVE: Option<EnvState> = Some(EnvState::Inactive);

    #[test]
    fn valid_transitions() {
        assert!(validate_transition("shop", None, Transition::Install).is_ok());
        assert!(validate_transition("shop", INACTIVE, Transition::Start).is_ok());
        assert!(validate_transition("shop", ACTIVE, Transition::Start).is_ok()); // idempotent start
        assert!(validate_transition("shop", ACTIVE, Transition::Stop).is_ok());
        assert!(validate_transition("shop", ACTIVE, Transition::Restart).is_ok());
        assert!(validate_transition("shop", INACTIVE, Transition::Uninstall).is_ok());
        assert!(validate_transition("shop", INACTIVE, Transition::Update).is_ok());
    }

    #[test]
    fn invalid_transitions() {
        assert!(validate_transition("shop", INACTIVE, Transition::Install).is_err());
        assert!(validate_transition("shop", ACTIVE, Transition::Install).is_err());
        assert!(validate_transition("shop", INACTIVE, Transition::Stop).is_err());
        assert!(validate_transition("shop", INACTIVE, Transition::Restart).is_err());
        assert!(validate_transition("shop", ACTIVE, Transition::Uninstall).is_err());
        assert!(validate_transition("shop", ACTIVE, Transition::Update).is_err());
        assert!(validate_transition("shop", None, Transition::Start).is_err());
        assert!(validate_transition("shop", None, Transition::Uninstall).is_err());
    }

    #[test]
    fn violations_are_invalid_environment() {
        let err = validate_transition("shop", ACTIVE, Transition::Uninstall).unwrap_err();
        assert!(matches!(&err, CoreError::InvalidEnvironment(msg) if msg.contains("stop it first")));

        let err = validate_transition("blog", None, Transition::Stop).unwrap_err();
        assert!(err.to_string().contains("not installed"));
    }

    #[test]
    fn state_follows_active_flag() {
        let mut env = Environment::new(
            "shop",
            "/srv/shop",
            berth_schema::EnvironmentType::Magento2,
            None,
        );
        assert_eq!(EnvState::of(&env), EnvState::Inactive);
        env.activate();
        assert_eq!(EnvState::of(&env), EnvState::Active);
        assert_eq!(EnvState::of(&env).to_string(), "active");
    }
}
