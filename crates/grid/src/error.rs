use stayline_core::error::CoreError;
use stayline_core::notice::GENERIC_SAVE_ERROR;

/// Failure reported by a [`CalendarBackend`](crate::CalendarBackend).
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The service refused the change; the message is meant for the user.
    #[error("{0}")]
    Rejected(String),

    /// The service could not be reached or answered garbage.
    #[error("Calendar service unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Text to show the user: the service's own message when it gave one,
    /// otherwise a generic fallback.
    pub fn user_message(&self) -> &str {
        match self {
            BackendError::Rejected(msg) if !msg.trim().is_empty() => msg,
            _ => GENERIC_SAVE_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_is_shown_verbatim() {
        let err = BackendError::Rejected("Total cannot be below sold rooms".into());
        assert_eq!(err.user_message(), "Total cannot be below sold rooms");
    }

    #[test]
    fn blank_or_transport_errors_fall_back_to_generic() {
        assert_eq!(BackendError::Rejected("  ".into()).user_message(), GENERIC_SAVE_ERROR);
        assert_eq!(
            BackendError::Unavailable("connection reset".into()).user_message(),
            GENERIC_SAVE_ERROR
        );
    }
}
