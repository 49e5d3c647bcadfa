use thiserror::Error;

/// Failure reported by the chat platform when performing an action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Platform error: {0}")]
    Other(String),
}

impl ActionError {
    pub fn is_permission(&self) -> bool {
        matches!(self, ActionError::PermissionDenied(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ActionError::NotFound(_))
    }
}

pub type ActionResult<T> = Result<T, ActionError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Sheet gateway error: {message}")]
    Gateway { message: String, transient: bool },

    #[error("Action failed: {0}")]
    Action(#[from] ActionError),

    #[error("Storage error: {0}")]
    Storage(#[from] eyre::Report),
}

impl CoreError {
    pub fn gateway(message: impl Into<String>, transient: bool) -> Self {
        CoreError::Gateway {
            message: message.into(),
            transient,
        }
    }

    /// Whether retrying on the next scheduled pass may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CoreError::Gateway { transient, .. } => *transient,
            CoreError::Action(ActionError::RateLimited(_)) => true,
            _ => false,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
