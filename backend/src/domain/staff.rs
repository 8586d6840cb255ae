//! Staff identities, roles and the stores each member may see.
//!
//! Roles map to a fixed permission set. Store scope is either the whole chain
//! or an explicit list of store identifiers; every store-scoped operation
//! checks it through [`StoreScope::contains`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Numeric store identifier.
pub type StoreId = u32;

/// Numeric catalogue item identifier.
pub type ItemId = u32;

/// Stable staff identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, format = "uuid")]
pub struct StaffId(Uuid);

impl StaffId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Borrow the UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for StaffId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Staff role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    RegionalManager,
    StoreManager,
    InventoryManager,
    LogisticsHead,
    Analyst,
}

/// Raised when a role name is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Every role in seniority order.
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::RegionalManager,
        Role::StoreManager,
        Role::InventoryManager,
        Role::LogisticsHead,
        Role::Analyst,
    ];

    /// Wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::RegionalManager => "regional_manager",
            Role::StoreManager => "store_manager",
            Role::InventoryManager => "inventory_manager",
            Role::LogisticsHead => "logistics_head",
            Role::Analyst => "analyst",
        }
    }

    /// Permission set granted to this role.
    pub fn permissions(self) -> Permissions {
        let all = Permissions {
            can_manage_inventory: true,
            can_manage_promotions: true,
            can_approve_transfers: true,
            can_manage_users: true,
            can_view_financials: true,
            can_manage_alert_rules: true,
        };
        let none = Permissions::default();
        match self {
            Role::SuperAdmin => all,
            Role::RegionalManager => Permissions {
                can_manage_users: false,
                ..all
            },
            Role::StoreManager => Permissions {
                can_manage_inventory: true,
                can_manage_promotions: true,
                can_view_financials: true,
                ..none
            },
            Role::InventoryManager => Permissions {
                can_manage_inventory: true,
                can_approve_transfers: true,
                ..none
            },
            Role::LogisticsHead => Permissions {
                can_manage_inventory: true,
                can_approve_transfers: true,
                can_view_financials: true,
                ..none
            },
            Role::Analyst => Permissions {
                can_view_financials: true,
                ..none
            },
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_owned()))
    }
}

/// Capabilities derived from a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Permissions {
    pub can_manage_inventory: bool,
    pub can_manage_promotions: bool,
    pub can_approve_transfers: bool,
    pub can_manage_users: bool,
    pub can_view_financials: bool,
    pub can_manage_alert_rules: bool,
}

/// Stores a staff member may see and act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "store_ids", rename_all = "snake_case")]
pub enum StoreScope {
    /// The whole chain.
    All,
    /// An explicit set of stores.
    Stores(BTreeSet<StoreId>),
}

impl StoreScope {
    /// Build a scope from seed data.
    pub fn from_parts(all_stores: bool, store_ids: impl IntoIterator<Item = StoreId>) -> Self {
        if all_stores {
            Self::All
        } else {
            Self::Stores(store_ids.into_iter().collect())
        }
    }

    /// Whether `store` is visible.
    pub fn contains(&self, store: StoreId) -> bool {
        match self {
            Self::All => true,
            Self::Stores(ids) => ids.contains(&store),
        }
    }

    /// Keep the entries of `items` whose store is visible.
    pub fn filter<T, F>(&self, items: impl IntoIterator<Item = T>, store_of: F) -> Vec<T>
    where
        F: Fn(&T) -> StoreId,
    {
        items
            .into_iter()
            .filter(|item| self.contains(store_of(item)))
            .collect()
    }
}

/// A member of staff able to sign in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub job_title: String,
    pub scope: StoreScope,
}

impl StaffMember {
    /// "First Last", as shown in history entries.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Permission set of the member's role.
    pub fn permissions(&self) -> Permissions {
        self.role.permissions()
    }

    /// Whether the member holds one of `roles`.
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

/// Validation errors for [`LoginCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated sign-in request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Trim and validate raw form values. The email is lower-cased.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if password.trim().is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email: email.to_lowercase(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
