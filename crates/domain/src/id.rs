//! Identifiers. Each record kind gets its own UUID newtype so a rule id can
//! never be passed where a tenant id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident, $what:literal) => {
        #[doc = concat!("Identifier of ", $what, ".")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// A fresh random (v4) id.
            #[must_use]
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub fn from_uuid(raw: Uuid) -> Self {
                Self(raw)
            }

            #[must_use]
            pub fn as_uuid(self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Uuid::try_parse(raw).map(Self)
            }
        }
    };
}

uuid_id!(TenantId, "a tenant, the isolation boundary of every record");
uuid_id!(RuleId, "an [`AutomationRule`](crate::automation::AutomationRule)");
uuid_id!(TaskId, "a [`Task`](crate::task::Task)");
uuid_id!(
    LogEntryId,
    "an [`ExecutionLogEntry`](crate::execution_log::ExecutionLogEntry)"
);
