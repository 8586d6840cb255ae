//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests or
//! with the `test-support` feature.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::{CatalogueItem, Role, StaffId, StaffMember, Store, StoreId, StoreScope};

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureClock(pub DateTime<Utc>);

impl FixtureClock {
    /// 2026-03-02 10:30 UTC, the anchor of the generated demo dataset.
    pub fn default_instant() -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2026, 3, 2, 10, 30, 0).single() {
            Some(instant) => instant,
            None => panic!("fixture timestamp must be valid"),
        }
    }
}

impl Default for FixtureClock {
    fn default() -> Self {
        Self(Self::default_instant())
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Clock a test can move forward.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// A staff member holding `role`.
///
/// Store managers are scoped to store 1; every other role sees the whole
/// chain. The email is `<role>@retail.test` and the name is the role's words,
/// so "Logistics Head" for `logistics_head`.
pub fn staff_with_role(role: Role) -> StaffMember {
    let scope = match role {
        Role::StoreManager => StoreScope::Stores([1].into()),
        _ => StoreScope::All,
    };
    member(role, scope)
}

/// A staff member holding `role`, scoped to `stores`.
pub fn staff_in_stores(role: Role, stores: &[StoreId]) -> StaffMember {
    member(role, StoreScope::Stores(stores.iter().copied().collect()))
}

fn member(role: Role, scope: StoreScope) -> StaffMember {
    let index = Role::ALL
        .iter()
        .position(|candidate| *candidate == role)
        .unwrap_or_default();
    let mut words = role.as_str().split('_');
    let first_name = words.next().map(title_case).unwrap_or_default();
    let last_name = words.map(title_case).collect::<Vec<_>>().join(" ");
    StaffMember {
        id: StaffId::from_uuid(Uuid::from_u128(index as u128 + 1)),
        email: format!("{}@retail.test", role.as_str()),
        first_name,
        last_name,
        role,
        job_title: title_case(&role.as_str().replace('_', " ")),
        scope,
    }
}

/// A store named after its id, in region 1.
pub fn store(id: StoreId) -> Store {
    Store {
        id,
        name: format!("Store {id}"),
        city: "Dubai".to_owned(),
        region_id: 1,
    }
}

/// A catalogue item costing 10 AED and selling for 13.50 AED.
pub fn item(id: u32, category: &str) -> CatalogueItem {
    CatalogueItem {
        id,
        name: format!("Item {id}"),
        category: category.to_owned(),
        unit_cost: 10.0,
        unit_price: 13.5,
    }
}

pub mod openapi {
    //! OpenAPI schema traversal helpers.

    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::{Object, Schema};

    /// Extract an `Object` schema, panicking with a diagnostic if not an Object.
    pub fn unwrap_object_schema<'a>(schema: &'a RefOr<Schema>, name: &str) -> &'a Object {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj,
            RefOr::Ref(reference) => {
                panic!(
                    "schema '{name}' is a $ref to '{}'; resolve the reference first",
                    reference.ref_location
                );
            }
            RefOr::T(Schema::AllOf(_)) => {
                panic!("schema '{name}' is an AllOf combinator; inspect composed schemas");
            }
            _ => panic!("schema '{name}' is not an Object"),
        }
    }

    /// Get a property from an Object schema by name.
    pub fn get_property<'a>(obj: &'a Object, field: &str) -> &'a RefOr<Schema> {
        match obj.properties.get(field) {
            Some(property) => property,
            None => panic!("property '{field}' not found"),
        }
    }
}
