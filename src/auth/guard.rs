use super::AuthUser;
use crate::actions::ActionError;

/// Resolve the acting user or fail closed.
///
/// The identity layer may or may not have attached a user to the request;
/// every action starts here and nothing runs without one.
pub fn require_user(user: Option<&AuthUser>) -> Result<&AuthUser, ActionError> {
    user.ok_or(ActionError::Unauthorized)
}
