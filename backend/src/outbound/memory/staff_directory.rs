//! Staff directory sharing one demo password.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::ports::{StaffDirectory, StaffDirectoryError};
use crate::domain::{LoginCredentials, StaffId, StaffMember};

/// Directory of generated staff. Every member signs in with the same
/// password.
pub struct MemoryStaffDirectory {
    members: Vec<StaffMember>,
    password: Zeroizing<String>,
}

impl MemoryStaffDirectory {
    pub fn new(members: Vec<StaffMember>, password: &str) -> Self {
        Self {
            members,
            password: Zeroizing::new(password.to_owned()),
        }
    }
}

#[async_trait]
impl StaffDirectory for MemoryStaffDirectory {
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<StaffMember>, StaffDirectoryError> {
        if credentials.password() != self.password.as_str() {
            return Ok(None);
        }
        Ok(self
            .members
            .iter()
            .find(|member| member.email == credentials.email())
            .cloned())
    }

    async fn find(&self, id: &StaffId) -> Result<Option<StaffMember>, StaffDirectoryError> {
        Ok(self.members.iter().find(|member| member.id == *id).cloned())
    }

    async fn list(&self) -> Result<Vec<StaffMember>, StaffDirectoryError> {
        Ok(self.members.clone())
    }
}
