use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Durable identifier issued by the identity service.
    UserId
);
id_type!(
    /// Identifier for a health plan record.
    PlanId
);
id_type!(
    /// Identifier for a dependent covered by a plan.
    DependentId
);
id_type!(
    /// Identifier for a reimbursement request.
    RequestId
);
id_type!(
    /// Identifier for an uploaded document.
    DocumentId
);

/// Authenticated principal resolved from a bearer credential.
///
/// The core never inspects credential contents; the identity service is
/// authoritative for both the user id and the admin flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Caller {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }
}
