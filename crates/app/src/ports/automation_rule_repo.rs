//! Automation rule repository port — persistence for rules.

use std::future::Future;
use std::sync::Arc;

use minicrm_domain::automation::AutomationRule;
use minicrm_domain::error::MiniCrmError;
use minicrm_domain::id::{RuleId, TenantId};

/// Repository for persisting and querying [`AutomationRule`]s.
///
/// Every call is scoped to one tenant. Writes are expected to surface as
/// `automation_rules` change events on the change feed once committed.
pub trait AutomationRuleRepository {
    /// Persist a new rule.
    fn insert(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, MiniCrmError>> + Send;

    /// All rules of a tenant, newest first.
    fn list(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, MiniCrmError>> + Send;

    /// Set `is_active` on one rule.
    ///
    /// Fails with [`MiniCrmError::NotFound`] when no rule with `id` exists in
    /// `tenant_id`.
    fn set_active(
        &self,
        tenant_id: TenantId,
        id: RuleId,
        is_active: bool,
    ) -> impl Future<Output = Result<(), MiniCrmError>> + Send;
}

impl<T: AutomationRuleRepository + Send + Sync> AutomationRuleRepository for Arc<T> {
    fn insert(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, MiniCrmError>> + Send {
        (**self).insert(rule)
    }

    fn list(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, MiniCrmError>> + Send {
        (**self).list(tenant_id)
    }

    fn set_active(
        &self,
        tenant_id: TenantId,
        id: RuleId,
        is_active: bool,
    ) -> impl Future<Output = Result<(), MiniCrmError>> + Send {
        (**self).set_active(tenant_id, id, is_active)
    }
}
