use std::fmt;

/// Failures reported by the wallet and contract collaborators.
///
/// None of these cross the controller boundary: connect failures become a
/// user-visible notice, fetch failures fold into "not initialized", and
/// mutation failures are logged and left for the next refresh to settle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AccountError {
    ProviderUnavailable(String),
    ConnectionRejected(String),
    FetchNotFound,
    FetchTransient(String),
    MutationRejected(String),
}

impl fmt::Display for AccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountError::ProviderUnavailable(detail) => {
                write!(f, "wallet provider unavailable: {detail}")
            }
            AccountError::ConnectionRejected(detail) => {
                write!(f, "wallet connection rejected: {detail}")
            }
            AccountError::FetchNotFound => write!(f, "account not found"),
            AccountError::FetchTransient(detail) => {
                write!(f, "account fetch failed: {detail}")
            }
            AccountError::MutationRejected(detail) => {
                write!(f, "transaction rejected: {detail}")
            }
        }
    }
}

impl std::error::Error for AccountError {}
