//! Operation table and endpoint resolution.
//!
//! Every gateway operation is described by one [`OperationSpec`]: the core
//! service path template, whether a session is required, and the reaction
//! applied once the core response has been normalized.

use std::fmt;
use std::str::FromStr;

use super::error::DomainError;

/// Public operations exposed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Register,
    Login,
    Logout,
    /// `email-verification/verify`
    EmailVerify,
    /// `users/email-verification/verify`
    UserEmailVerify,
    EmailVerifyCheck,
    EmailVerifyResend,
    Dialogues,
    Messages,
    Bots,
}

/// What the gateway does with a normalized core response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Return the normalized response unchanged.
    PassThrough,
    /// Persist the registered principal locally.
    Register,
    /// Cache the issued token and establish a session.
    Login,
    /// Clear the cached token and end the session.
    Logout,
    /// Derive display fields for every bot descriptor.
    EnrichBots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathTemplate {
    Fixed(&'static str),
    /// `dialogues` or `dialogues/{id}`, followed by `suffix`.
    Dialogue { suffix: &'static str },
}

/// Static description of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    pub operation: Operation,
    pub requires_auth: bool,
    pub reaction: Reaction,
    template: PathTemplate,
}

/// Parameters extracted from the inbound path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathParams {
    pub dialogue_id: Option<u64>,
}

impl PathParams {
    #[must_use]
    pub fn dialogue(id: u64) -> Self {
        Self {
            dialogue_id: Some(id),
        }
    }
}

impl Operation {
    pub const ALL: [Self; 10] = [
        Self::Register,
        Self::Login,
        Self::Logout,
        Self::EmailVerify,
        Self::UserEmailVerify,
        Self::EmailVerifyCheck,
        Self::EmailVerifyResend,
        Self::Dialogues,
        Self::Messages,
        Self::Bots,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::EmailVerify => "email_verify",
            Self::UserEmailVerify => "user_email_verify",
            Self::EmailVerifyCheck => "email_verify_check",
            Self::EmailVerifyResend => "email_verify_resend",
            Self::Dialogues => "dialogues",
            Self::Messages => "messages",
            Self::Bots => "bots",
        }
    }

    #[must_use]
    pub fn spec(self) -> OperationSpec {
        let (requires_auth, reaction, template) = match self {
            Self::Register => (false, Reaction::Register, PathTemplate::Fixed("users")),
            Self::Login => (false, Reaction::Login, PathTemplate::Fixed("users/login")),
            Self::Logout => (true, Reaction::Logout, PathTemplate::Fixed("users/logout")),
            Self::EmailVerify => (
                false,
                Reaction::PassThrough,
                PathTemplate::Fixed("email-verification/verify"),
            ),
            Self::UserEmailVerify => (
                false,
                Reaction::PassThrough,
                PathTemplate::Fixed("users/email-verification/verify"),
            ),
            Self::EmailVerifyCheck => (
                false,
                Reaction::PassThrough,
                PathTemplate::Fixed("users/email-verification/check"),
            ),
            Self::EmailVerifyResend => (
                false,
                Reaction::PassThrough,
                PathTemplate::Fixed("users/email-verification/resend"),
            ),
            Self::Dialogues => (
                true,
                Reaction::PassThrough,
                PathTemplate::Dialogue { suffix: "" },
            ),
            Self::Messages => (
                true,
                Reaction::PassThrough,
                PathTemplate::Dialogue {
                    suffix: "/messages",
                },
            ),
            Self::Bots => (false, Reaction::EnrichBots, PathTemplate::Fixed("bots")),
        };
        OperationSpec {
            operation: self,
            requires_auth,
            reaction,
            template,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| DomainError::configuration(format!("unknown operation '{s}'")))
    }
}

/// Resolve the core service path for `operation`.
///
/// A zero or absent dialogue id selects the collection path.
#[must_use]
pub fn resolve(operation: Operation, params: PathParams) -> String {
    match operation.spec().template {
        PathTemplate::Fixed(path) => path.to_owned(),
        PathTemplate::Dialogue { suffix } => match params.dialogue_id {
            Some(id) if id != 0 => format!("dialogues/{id}{suffix}"),
            _ => format!("dialogues{suffix}"),
        },
    }
}

/// Resolve by operation name, as used by configuration-driven callers.
///
/// # Errors
/// Returns `DomainError::Configuration` for an unknown operation name.
pub fn resolve_named(name: &str, params: PathParams) -> Result<String, DomainError> {
    let operation: Operation = name.parse()?;
    Ok(resolve(operation, params))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn fixed_operations_ignore_params() {
        assert_eq!(resolve(Operation::Register, PathParams::default()), "users");
        assert_eq!(resolve(Operation::Login, PathParams::dialogue(7)), "users/login");
        assert_eq!(
            resolve(Operation::EmailVerifyCheck, PathParams::default()),
            "users/email-verification/check"
        );
        assert_eq!(resolve(Operation::Bots, PathParams::default()), "bots");
    }

    #[test]
    fn dialogue_collection_and_item_paths() {
        assert_eq!(resolve(Operation::Dialogues, PathParams::default()), "dialogues");
        assert_eq!(resolve(Operation::Dialogues, PathParams::dialogue(0)), "dialogues");
        assert_eq!(
            resolve(Operation::Dialogues, PathParams::dialogue(42)),
            "dialogues/42"
        );
    }

    #[test]
    fn messages_are_suffixed() {
        assert_eq!(
            resolve(Operation::Messages, PathParams::dialogue(3)),
            "dialogues/3/messages"
        );
        assert_eq!(
            resolve(Operation::Messages, PathParams::default()),
            "dialogues/messages"
        );
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn unknown_operation_is_a_configuration_error() {
        let err = resolve_named("delete_everything", PathParams::default()).unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[test]
    fn auth_requirements_follow_operation_table() {
        let protected: Vec<_> = Operation::ALL
            .into_iter()
            .filter(|op| op.spec().requires_auth)
            .collect();
        assert_eq!(
            protected,
            vec![Operation::Logout, Operation::Dialogues, Operation::Messages]
        );
        assert_eq!(Operation::Bots.spec().reaction, Reaction::EnrichBots);
    }
}
