//! Port for looking up staff and checking their credentials.

use async_trait::async_trait;

use crate::domain::{LoginCredentials, StaffId, StaffMember};

use super::define_port_error;

define_port_error! {
    /// Errors raised by staff directory adapters.
    pub enum StaffDirectoryError {
        /// The directory could not be reached.
        Unavailable { message: String } => "staff directory unavailable: {message}",
    }
}

/// Read access to the staff directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    /// Resolve credentials to a staff member. `None` means the email is
    /// unknown or the password does not match; adapters must not say which.
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<StaffMember>, StaffDirectoryError>;

    /// Fetch a staff member by identifier.
    async fn find(&self, id: &StaffId) -> Result<Option<StaffMember>, StaffDirectoryError>;

    /// Every staff member, ordered by email.
    async fn list(&self) -> Result<Vec<StaffMember>, StaffDirectoryError>;
}
