//! Sign-in and the caller's own profile.
//!
//! Sessions store only the [`StaffId`]; every request resolves it back
//! through the directory so role or scope changes apply immediately.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::catalogue::Store;
use super::ports::{StaffDirectory, StaffDirectoryError, StoreCatalogue, StoreCatalogueError};
use super::staff::{LoginCredentials, Permissions, Role, StaffId, StaffMember, StoreId, StoreScope};
use super::Error;

/// Public view of a staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StaffProfile {
    pub id: StaffId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub role: Role,
    pub job_title: String,
    pub permissions: Permissions,
    /// `true` when the member may see every store.
    pub all_stores: bool,
    /// Explicit store list; empty when `all_stores` is set.
    pub store_ids: Vec<StoreId>,
}

impl From<&StaffMember> for StaffProfile {
    fn from(member: &StaffMember) -> Self {
        let (all_stores, store_ids) = match &member.scope {
            StoreScope::All => (true, Vec::new()),
            StoreScope::Stores(ids) => (false, ids.iter().copied().collect()),
        };
        Self {
            id: member.id,
            email: member.email.clone(),
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
            display_name: member.display_name(),
            role: member.role,
            job_title: member.job_title.clone(),
            permissions: member.permissions(),
            all_stores,
            store_ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccessibleStores {
    pub stores: Vec<Store>,
    pub total: usize,
}

pub(crate) fn map_directory_error(err: StaffDirectoryError) -> Error {
    match err {
        StaffDirectoryError::Unavailable { message } => {
            Error::service_unavailable(format!("staff directory unavailable: {message}"))
        }
    }
}

fn map_catalogue_error(err: StoreCatalogueError) -> Error {
    match err {
        StoreCatalogueError::Unavailable { message } => {
            Error::service_unavailable(format!("catalogue unavailable: {message}"))
        }
    }
}

/// Authentication use cases.
#[derive(Clone)]
pub struct AuthService {
    directory: Arc<dyn StaffDirectory>,
    catalogue: Arc<dyn StoreCatalogue>,
}

impl AuthService {
    pub fn new(directory: Arc<dyn StaffDirectory>, catalogue: Arc<dyn StoreCatalogue>) -> Self {
        Self {
            directory,
            catalogue,
        }
    }

    /// Check credentials. Unknown emails and wrong passwords look the same.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<StaffMember, Error> {
        let member = self
            .directory
            .authenticate(credentials)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| Error::unauthorized("invalid email or password"))?;
        info!(staff_id = %member.id, role = member.role.as_str(), "staff signed in");
        Ok(member)
    }

    /// Resolve a session's staff id. A member removed since sign-in is
    /// treated as signed out.
    pub async fn member(&self, id: &StaffId) -> Result<StaffMember, Error> {
        self.directory
            .find(id)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    pub async fn accessible_stores(&self, actor: &StaffMember) -> Result<AccessibleStores, Error> {
        let stores = self.catalogue.stores().await.map_err(map_catalogue_error)?;
        let stores = actor.scope.filter(stores, |store| store.id);
        Ok(AccessibleStores {
            total: stores.len(),
            stores,
        })
    }
}
