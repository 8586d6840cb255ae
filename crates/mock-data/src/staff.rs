//! Staff directory generation.
//!
//! Names are drawn from the `fake` crate so every run with the same seed
//! produces the same people. Login handles are derived from the role and
//! assignment so demo accounts stay predictable regardless of the seed.

use fake::Fake;
use fake::faker::name::raw::{FirstName, LastName};
use fake::locales::EN;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::error::GenerationError;
use crate::stores::STORES;

/// Password shared by every generated demo account.
pub const DEMO_PASSWORD: &str = "retail-demo";

const EMAIL_DOMAIN: &str = "retail.example";
const MAX_NAME_ATTEMPTS: usize = 100;
const NAME_MAX_LEN: usize = 32;

/// A generated staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSeed {
    /// Deterministic identifier.
    pub id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login handle.
    pub email: String,
    /// Role slug, for example `store_manager`.
    pub role: &'static str,
    /// Human-readable job title.
    pub job_title: &'static str,
    /// Stores this person may act on. Empty when `all_stores` is set.
    pub store_ids: Vec<u32>,
    /// Whether the person is scoped to every store.
    pub all_stores: bool,
}

struct Assignment {
    handle: String,
    role: &'static str,
    job_title: &'static str,
    store_ids: Vec<u32>,
    all_stores: bool,
}

impl Assignment {
    fn chain_wide(handle: &str, role: &'static str, job_title: &'static str) -> Self {
        Self {
            handle: handle.to_owned(),
            role,
            job_title,
            store_ids: Vec::new(),
            all_stores: true,
        }
    }

    fn scoped(
        handle: String,
        role: &'static str,
        job_title: &'static str,
        store_ids: Vec<u32>,
    ) -> Self {
        Self {
            handle,
            role,
            job_title,
            store_ids,
            all_stores: false,
        }
    }
}

fn assignments() -> Vec<Assignment> {
    let mut out = vec![Assignment::chain_wide(
        "superadmin",
        "super_admin",
        "Senior Vice President",
    )];
    for region in 1..=3_u32 {
        out.push(Assignment::scoped(
            format!("regional{region}"),
            "regional_manager",
            "Regional Manager",
            region_stores(region),
        ));
    }
    for seed in &STORES {
        out.push(Assignment::scoped(
            format!("store{}", seed.id),
            "store_manager",
            "Store Manager",
            vec![seed.id],
        ));
    }
    for region in 1..=2_u32 {
        out.push(Assignment::scoped(
            format!("inventory{region}"),
            "inventory_manager",
            "Inventory Manager",
            region_stores(region),
        ));
    }
    out.push(Assignment::chain_wide(
        "logistics",
        "logistics_head",
        "Head of Logistics",
    ));
    out.push(Assignment::chain_wide("analyst1", "analyst", "Business Analyst"));
    out.push(Assignment::chain_wide("analyst2", "analyst", "Business Analyst"));
    out
}

fn region_stores(region: u32) -> Vec<u32> {
    STORES
        .iter()
        .filter(|seed| seed.region_id == region)
        .map(|seed| seed.id)
        .collect()
}

pub(crate) fn generate_staff(rng: &mut ChaCha8Rng) -> Result<Vec<StaffSeed>, GenerationError> {
    assignments()
        .into_iter()
        .map(|assignment| {
            let id = Uuid::from_u128(rng.random());
            let (first_name, last_name) = generate_name(rng)?;
            Ok(StaffSeed {
                id,
                first_name,
                last_name,
                email: format!("{}@{EMAIL_DOMAIN}", assignment.handle),
                role: assignment.role,
                job_title: assignment.job_title,
                store_ids: assignment.store_ids,
                all_stores: assignment.all_stores,
            })
        })
        .collect()
}

fn generate_name(rng: &mut ChaCha8Rng) -> Result<(String, String), GenerationError> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let first: String = FirstName(EN).fake_with_rng(rng);
        let last: String = LastName(EN).fake_with_rng(rng);
        if is_valid_name(&first) && is_valid_name(&last) {
            return Ok((first, last));
        }
    }
    Err(GenerationError::StaffNameGenerationFailed {
        max_attempts: MAX_NAME_ATTEMPTS,
    })
}

fn is_valid_name(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= NAME_MAX_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '\'')
}
