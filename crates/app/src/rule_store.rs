//! Rule store — the live, per-tenant mirror of automation rules.
//!
//! Mutations (`add`, `toggle`) go to the repository only. The local mirror
//! changes when the matching `automation_rules` change event comes back
//! through [`RuleStore::apply`], so it never holds a state the source of
//! truth has not committed.

use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use minicrm_domain::automation::{AutomationRule, RuleDraft};
use minicrm_domain::change::{ChangeEvent, Table};
use minicrm_domain::error::{MiniCrmError, ValidationError};
use minicrm_domain::id::{RuleId, TenantId};

use crate::ports::AutomationRuleRepository;
use crate::ports::change_feed::{ChangeHandler, route};

/// Rule set of one tenant for the lifetime of a session.
pub struct RuleStore<R> {
    tenant_id: TenantId,
    repo: R,
    rules: RwLock<Vec<AutomationRule>>,
}

impl<R> RuleStore<R> {
    /// Create an empty store; call [`load`](Self::load) to fill it.
    pub fn new(tenant_id: TenantId, repo: R) -> Self {
        Self {
            tenant_id,
            repo,
            rules: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// All rules, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<AutomationRule> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Active rules, in list order.
    #[must_use]
    pub fn active_rules(&self) -> Vec<AutomationRule> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|rule| rule.is_active)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn get(&self, id: RuleId) -> Option<AutomationRule> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|rule| rule.id == id)
            .cloned()
    }

    /// Mirror an `automation_rules` change event.
    ///
    /// Events of another tenant or table are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MiniCrmError::Validation`] when the row image cannot be
    /// decoded into a rule.
    pub fn apply(&self, event: &ChangeEvent) -> Result<(), MiniCrmError> {
        if event.table != Table::AutomationRules {
            tracing::debug!(table = %event.table, "ignoring non-rule change in rule store");
            return Ok(());
        }
        if event.tenant_id != self.tenant_id {
            tracing::warn!(
                expected = %self.tenant_id,
                received = %event.tenant_id,
                "ignoring rule change of another tenant"
            );
            return Ok(());
        }
        route(event, self)
    }

    fn decode(&self, record: &serde_json::Value) -> Result<Option<AutomationRule>, MiniCrmError> {
        let rule = AutomationRule::from_record_json(record.clone())?;
        if rule.tenant_id == self.tenant_id {
            Ok(Some(rule))
        } else {
            tracing::warn!(rule_id = %rule.id, "ignoring rule row of another tenant");
            Ok(None)
        }
    }

    fn upsert(&self, rule: AutomationRule) {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        match rules.iter_mut().find(|existing| existing.id == rule.id) {
            Some(existing) => *existing = rule,
            None => rules.insert(0, rule),
        }
    }
}

impl<R: AutomationRuleRepository> RuleStore<R> {
    /// Replace the mirror with the repository's current rule set.
    ///
    /// # Errors
    ///
    /// Returns the repository error when listing fails.
    #[tracing::instrument(skip(self), fields(tenant_id = %self.tenant_id))]
    pub async fn load(&self) -> Result<usize, MiniCrmError> {
        let mut fetched = self.repo.list(self.tenant_id).await?;
        fetched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let count = fetched.len();
        *self.rules.write().unwrap_or_else(PoisonError::into_inner) = fetched;
        tracing::info!(count, "rule store loaded");
        Ok(count)
    }

    /// Validate and persist a new rule.
    ///
    /// The returned rule shows up in [`list`](Self::list) once its insert
    /// event has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`MiniCrmError::Validation`] when a config does not match its
    /// declared type, or the repository error when the insert fails.
    #[tracing::instrument(
        skip(self, draft),
        fields(tenant_id = %self.tenant_id, rule_name = %draft.name)
    )]
    pub async fn add(&self, draft: RuleDraft) -> Result<AutomationRule, MiniCrmError> {
        let definition = draft.validate()?;
        let rule = AutomationRule::from_definition(
            self.tenant_id,
            definition,
            minicrm_domain::time::now(),
        );
        let rule = self.repo.insert(rule).await?;
        tracing::info!(rule_id = %rule.id, "automation rule added");
        Ok(rule)
    }

    /// Persist a new `is_active` value for a rule.
    ///
    /// # Errors
    ///
    /// Returns [`MiniCrmError::NotFound`] when the rule does not exist in
    /// this tenant, or the repository error when the update fails.
    #[tracing::instrument(skip(self), fields(tenant_id = %self.tenant_id))]
    pub async fn toggle(&self, id: RuleId, is_active: bool) -> Result<(), MiniCrmError> {
        self.repo.set_active(self.tenant_id, id, is_active).await?;
        tracing::info!(rule_id = %id, is_active, "automation rule toggled");
        Ok(())
    }
}

impl<R> ChangeHandler for RuleStore<R> {
    fn on_insert(&self, record: &serde_json::Value) -> Result<(), MiniCrmError> {
        if let Some(rule) = self.decode(record)? {
            tracing::debug!(rule_id = %rule.id, "rule inserted");
            self.upsert(rule);
        }
        Ok(())
    }

    fn on_update(&self, record: &serde_json::Value) -> Result<(), MiniCrmError> {
        if let Some(rule) = self.decode(record)? {
            tracing::debug!(rule_id = %rule.id, is_active = rule.is_active, "rule updated");
            self.upsert(rule);
        }
        Ok(())
    }

    fn on_delete(&self, old_record: &serde_json::Value) -> Result<(), MiniCrmError> {
        // delete images may only carry the primary key
        let id = old_record
            .get("id")
            .and_then(serde_json::Value::as_str)
            .and_then(|raw| RuleId::from_str(raw).ok())
            .ok_or_else(|| ValidationError::MalformedRecord {
                entity: "automation_rule",
                reason: "delete image without a valid id".to_string(),
            })?;
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        rules.retain(|rule| rule.id != id);
        tracing::debug!(rule_id = %id, "rule removed");
        Ok(())
    }
}
