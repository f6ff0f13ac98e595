//! Shared application state for axum handlers.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use minicrm_app::rule_store::RuleStore;
use minicrm_domain::error::{MiniCrmError, NotFoundError, ValidationError};
use minicrm_domain::id::TenantId;

/// Application state shared across all axum handlers.
///
/// Generic over the rule repository and the change publisher to avoid
/// dynamic dispatch. `Clone` is implemented manually so the underlying
/// types themselves do not need to be `Clone` — only the `Arc` wrappers are
/// cloned.
pub struct AppState<R, P> {
    /// Live rule stores of the served tenants, keyed by tenant.
    stores: Arc<HashMap<TenantId, Arc<RuleStore<R>>>>,
    /// Where ingested row changes are published.
    publisher: Arc<P>,
}

impl<R, P> Clone for AppState<R, P> {
    fn clone(&self) -> Self {
        Self {
            stores: Arc::clone(&self.stores),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

impl<R, P> AppState<R, P> {
    /// Create a state serving exactly the tenants of `stores`.
    pub fn new(stores: impl IntoIterator<Item = Arc<RuleStore<R>>>, publisher: Arc<P>) -> Self {
        let stores = stores
            .into_iter()
            .map(|store| (store.tenant_id(), store))
            .collect();
        Self {
            stores: Arc::new(stores),
            publisher,
        }
    }

    /// Resolve a raw tenant path segment to a tenant served by this process.
    ///
    /// # Errors
    ///
    /// [`ValidationError::InvalidValue`] when `raw` is not a UUID,
    /// [`NotFoundError`] when the tenant is not served here.
    pub fn tenant(&self, raw: &str) -> Result<&Arc<RuleStore<R>>, MiniCrmError> {
        let tenant_id = TenantId::from_str(raw).map_err(|err| ValidationError::InvalidValue {
            field: "tenant_id",
            reason: err.to_string(),
        })?;
        self.stores.get(&tenant_id).ok_or_else(|| {
            NotFoundError {
                entity: "Tenant",
                id: tenant_id.to_string(),
            }
            .into()
        })
    }

    #[must_use]
    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}
