use crate::accounts::{
    BaseAccountView,
    UserAccountView,
};
use std::fmt;

/// Which panel the front-end should show.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ReadinessState {
    #[default]
    Disconnected,
    NeedsBaseInit,
    NeedsUserInit,
    Ready,
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadinessState::Disconnected => "Disconnected",
            ReadinessState::NeedsBaseInit => "Needs program account",
            ReadinessState::NeedsUserInit => "Needs user account",
            ReadinessState::Ready => "Ready",
        };
        write!(f, "{name}")
    }
}

/// How a fetched base account is judged "initialized".
///
/// `NonZeroCount` treats a zero enemy counter as "never created", so an
/// account that really exists with no enemies stays in `NeedsBaseInit`.
/// `RecordExists` trusts the existence flag returned by the fetch instead.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PresencePolicy {
    #[default]
    NonZeroCount,
    RecordExists,
}

impl PresencePolicy {
    pub fn base_initialized(self, base: &BaseAccountView) -> bool {
        match self {
            PresencePolicy::NonZeroCount => base.exists && base.enemy_count != 0,
            PresencePolicy::RecordExists => base.exists,
        }
    }
}

impl std::str::FromStr for PresencePolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "nonzero" => Ok(PresencePolicy::NonZeroCount),
            "exists" => Ok(PresencePolicy::RecordExists),
            other => Err(format!(
                "unknown presence policy '{other}' (expected 'nonzero' or 'exists')"
            )),
        }
    }
}

pub fn evaluate(
    connected: bool,
    base_initialized: bool,
    user_exists: bool,
) -> ReadinessState {
    if !connected {
        ReadinessState::Disconnected
    } else if !base_initialized {
        ReadinessState::NeedsBaseInit
    } else if !user_exists {
        ReadinessState::NeedsUserInit
    } else {
        ReadinessState::Ready
    }
}

/// Evaluates from the last-known views. Missing views count as "not there".
pub fn evaluate_views(
    connected: bool,
    policy: PresencePolicy,
    base: Option<&BaseAccountView>,
    user: Option<&UserAccountView>,
) -> ReadinessState {
    let base_initialized = base.is_some_and(|view| policy.base_initialized(view));
    let user_exists = user.is_some_and(|view| view.exists);
    evaluate(connected, base_initialized, user_exists)
}
