//! Shared error reporting helpers
//!
//! Errors across the crate distinguish between problems the user can fix
//! (a malformed target URL, a bad config file) and system problems (a
//! poisoned lock, an unwritable output directory). The binary uses that
//! distinction to decide what to print at error level.

/// Errors that know whether they are actionable by the user
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// True when the message can be shown to the user verbatim
    fn is_user_actionable(&self) -> bool;

    /// The message to show when the error is user actionable
    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error with the right level of detail.
///
/// User-actionable errors print their own message; system errors print the
/// operation context and keep the detail at debug level.
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => {
            log::error!("FATAL: {}", user_msg);
        }
        _ => {
            log::error!("FATAL: {}", operation_context);
        }
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// Render the line the binary prints to stderr for a fatal error
pub fn describe_for_user<E: ContextualError>(error: &E, operation_context: &str) -> String {
    match error.user_message() {
        Some(msg) if error.is_user_actionable() => msg.to_string(),
        _ => format!("{}: {}", operation_context, error),
    }
}
