//! Resource-keyed list responses.
//!
//! The dashboard reads each list under its resource name (`orders`,
//! `alerts`, ...) next to the paging fields, so [`Page`] is reshaped here
//! rather than serialised as-is.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Alert, Page, ProcurementOrder, Promotion, StaffProfile, Transfer};

macro_rules! keyed_page {
    ($(#[$meta:meta])* $name:ident { $field:ident: $item:ty }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
        pub struct $name {
            pub $field: Vec<$item>,
            pub total: usize,
            pub page: u32,
            pub limit: u32,
            /// Always at least 1, even for empty results.
            pub pages: usize,
        }

        impl From<Page<$item>> for $name {
            fn from(page: Page<$item>) -> Self {
                Self {
                    $field: page.items,
                    total: page.total,
                    page: page.page,
                    limit: page.limit,
                    pages: page.pages,
                }
            }
        }
    };
}

keyed_page! {
    /// A page of procurement orders.
    OrderPage { orders: ProcurementOrder }
}

keyed_page! {
    /// A page of alerts, newest first.
    AlertPage { alerts: Alert }
}

keyed_page! {
    PromotionPage { promotions: Promotion }
}

keyed_page! {
    TransferPage { transfers: Transfer }
}

keyed_page! {
    /// A page of the staff directory.
    UserPage { users: StaffProfile }
}
