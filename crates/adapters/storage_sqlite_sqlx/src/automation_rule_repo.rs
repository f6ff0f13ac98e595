//! `SQLite` implementation of [`AutomationRuleRepository`].
//!
//! `SQLite` has no change-notification mechanism of its own, so each
//! committed write is announced through a [`ChangePublisher`] with the
//! post-write row image.

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use minicrm_app::ports::{AutomationRuleRepository, ChangePublisher};
use minicrm_domain::automation::{ActionType, AutomationRule, RuleRecord, TriggerType};
use minicrm_domain::change::{ChangeEvent, Table};
use minicrm_domain::error::{MiniCrmError, NotFoundError};
use minicrm_domain::id::{RuleId, TenantId};

use crate::error::StorageError;

struct Wrapper(AutomationRule);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let tenant_id: uuid::Uuid = row.try_get("tenant_id")?;
        let name: String = row.try_get("name")?;
        let trigger_type: String = row.try_get("trigger_type")?;
        let trigger_config: String = row.try_get("trigger_config")?;
        let action_type: String = row.try_get("action_type")?;
        let action_config: String = row.try_get("action_config")?;
        let is_active: bool = row.try_get("is_active")?;
        let created_at: String = row.try_get("created_at")?;

        let record = RuleRecord {
            id: RuleId::from_uuid(id),
            tenant_id: TenantId::from_uuid(tenant_id),
            name,
            trigger_type: TriggerType::from_str(&trigger_type)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            trigger_config: serde_json::from_str(&trigger_config)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            action_type: ActionType::from_str(&action_type)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            action_config: serde_json::from_str(&action_config)
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            is_active,
            created_at: crate::parse_timestamp(&created_at)?,
        };
        AutomationRule::try_from(record)
            .map(Self)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))
    }
}

const INSERT: &str = r"
    INSERT INTO automation_rules
        (id, tenant_id, name, trigger_type, trigger_config,
         action_type, action_config, is_active, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_TENANT: &str =
    "SELECT * FROM automation_rules WHERE tenant_id = ? ORDER BY created_at DESC";
const SELECT_BY_ID: &str = "SELECT * FROM automation_rules WHERE tenant_id = ? AND id = ?";
const UPDATE_ACTIVE: &str =
    "UPDATE automation_rules SET is_active = ? WHERE tenant_id = ? AND id = ?";

/// `SQLite`-backed automation rule repository.
pub struct SqliteAutomationRuleRepository<P> {
    pool: SqlitePool,
    publisher: P,
}

impl<P> SqliteAutomationRuleRepository<P> {
    /// Create a repository that announces its writes through `publisher`.
    #[must_use]
    pub fn new(pool: SqlitePool, publisher: P) -> Self {
        Self { pool, publisher }
    }
}

impl<P: ChangePublisher> SqliteAutomationRuleRepository<P> {
    async fn announce(&self, event: ChangeEvent) {
        let tenant_id = event.tenant_id;
        // the row is committed; a lost announcement only delays the mirror
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(%tenant_id, error = %err, "failed to publish automation rule change");
        }
    }
}

impl<P> AutomationRuleRepository for SqliteAutomationRuleRepository<P>
where
    P: ChangePublisher + Send + Sync,
{
    async fn insert(&self, rule: AutomationRule) -> Result<AutomationRule, MiniCrmError> {
        let trigger_config =
            serde_json::to_string(&rule.trigger.to_untagged()).map_err(StorageError::from)?;
        let action_config =
            serde_json::to_string(&rule.action.to_untagged()).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(rule.id.as_uuid())
            .bind(rule.tenant_id.as_uuid())
            .bind(&rule.name)
            .bind(rule.trigger_type().as_str())
            .bind(&trigger_config)
            .bind(rule.action_type().as_str())
            .bind(&action_config)
            .bind(rule.is_active)
            .bind(crate::format_timestamp(rule.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        self.announce(ChangeEvent::insert(
            rule.tenant_id,
            Table::AutomationRules,
            rule.to_record_json(),
        ))
        .await;
        Ok(rule)
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<AutomationRule>, MiniCrmError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_TENANT)
            .bind(tenant_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn set_active(
        &self,
        tenant_id: TenantId,
        id: RuleId,
        is_active: bool,
    ) -> Result<(), MiniCrmError> {
        let result = sqlx::query(UPDATE_ACTIVE)
            .bind(is_active)
            .bind(tenant_id.as_uuid())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        if result.rows_affected() == 0 {
            return Err(NotFoundError {
                entity: "AutomationRule",
                id: id.to_string(),
            }
            .into());
        }

        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(tenant_id.as_uuid())
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        if let Some(Wrapper(rule)) = row {
            self.announce(ChangeEvent::update(
                tenant_id,
                Table::AutomationRules,
                rule.to_record_json(),
            ))
            .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use minicrm_app::change_feed::InProcessChangeFeed;
    use minicrm_app::ports::ChangeFeed;
    use minicrm_domain::automation::{ActionConfig, TriggerConfig};
    use minicrm_domain::change::ChangeOperation;
    use std::sync::Arc;

    async fn setup() -> (
        SqliteAutomationRuleRepository<Arc<InProcessChangeFeed>>,
        Arc<InProcessChangeFeed>,
    ) {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        let feed = Arc::new(InProcessChangeFeed::new());
        (
            SqliteAutomationRuleRepository::new(db.pool().clone(), Arc::clone(&feed)),
            feed,
        )
    }

    fn rule_at(tenant_id: TenantId, name: &str, created_at: &str) -> AutomationRule {
        AutomationRule {
            id: RuleId::new(),
            tenant_id,
            name: name.to_string(),
            trigger: TriggerConfig::HighValueOrder { threshold: 1000.0 },
            action: ActionConfig::CreateTask {
                title: "Call the buyer".to_string(),
                assignee: Some("sales@example.com".to_string()),
            },
            is_active: true,
            created_at: minicrm_domain::time::parse_rfc3339(created_at).unwrap(),
        }
    }

    #[tokio::test]
    async fn should_insert_and_list_rule_with_typed_configs() {
        let (repo, _feed) = setup().await;
        let tenant = TenantId::new();
        let rule = rule_at(tenant, "Big orders", "2024-05-01T10:00:00Z");

        repo.insert(rule.clone()).await.unwrap();
        let listed = repo.list(tenant).await.unwrap();

        assert_eq!(listed, vec![rule]);
    }

    #[tokio::test]
    async fn should_list_newest_first() {
        let (repo, _feed) = setup().await;
        let tenant = TenantId::new();
        let older = rule_at(tenant, "Older", "2024-05-01T09:00:00Z");
        let newer = rule_at(tenant, "Newer", "2024-05-01T10:00:00Z");

        repo.insert(older.clone()).await.unwrap();
        repo.insert(newer.clone()).await.unwrap();

        let names: Vec<_> = repo
            .list(tenant)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn should_only_list_rules_of_requested_tenant() {
        let (repo, _feed) = setup().await;
        let tenant = TenantId::new();
        repo.insert(rule_at(tenant, "Mine", "2024-05-01T10:00:00Z"))
            .await
            .unwrap();
        repo.insert(rule_at(TenantId::new(), "Theirs", "2024-05-01T10:00:00Z"))
            .await
            .unwrap();

        let listed = repo.list(tenant).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Mine");
    }

    #[tokio::test]
    async fn should_publish_insert_event_after_commit() {
        let (repo, feed) = setup().await;
        let tenant = TenantId::new();
        let mut sub = feed.subscribe(tenant, Table::AutomationRules);
        let rule = rule_at(tenant, "Big orders", "2024-05-01T10:00:00Z");

        repo.insert(rule.clone()).await.unwrap();

        let event = sub.receiver.recv().await.unwrap();
        assert_eq!(event.operation, ChangeOperation::Insert);
        assert_eq!(AutomationRule::from_record_json(event.record).unwrap(), rule);
    }

    #[tokio::test]
    async fn should_toggle_and_publish_update_event() {
        let (repo, feed) = setup().await;
        let tenant = TenantId::new();
        let rule = rule_at(tenant, "Big orders", "2024-05-01T10:00:00Z");
        repo.insert(rule.clone()).await.unwrap();
        let mut sub = feed.subscribe(tenant, Table::AutomationRules);

        repo.set_active(tenant, rule.id, false).await.unwrap();

        let event = sub.receiver.recv().await.unwrap();
        assert_eq!(event.operation, ChangeOperation::Update);
        assert_eq!(event.record["is_active"], false);
        assert!(!repo.list(tenant).await.unwrap()[0].is_active);
    }

    #[tokio::test]
    async fn should_keep_inactive_when_deactivated_twice() {
        let (repo, _feed) = setup().await;
        let tenant = TenantId::new();
        let rule = rule_at(tenant, "Big orders", "2024-05-01T10:00:00Z");
        repo.insert(rule.clone()).await.unwrap();

        repo.set_active(tenant, rule.id, false).await.unwrap();
        repo.set_active(tenant, rule.id, false).await.unwrap();

        assert!(!repo.list(tenant).await.unwrap()[0].is_active);
    }

    #[tokio::test]
    async fn should_return_not_found_when_toggling_rule_of_another_tenant() {
        let (repo, _feed) = setup().await;
        let rule = rule_at(TenantId::new(), "Big orders", "2024-05-01T10:00:00Z");
        repo.insert(rule.clone()).await.unwrap();

        let err = repo
            .set_active(TenantId::new(), rule.id, false)
            .await
            .unwrap_err();

        assert!(matches!(err, MiniCrmError::NotFound(_)));
    }

    #[tokio::test]
    async fn should_fail_with_persistence_error_when_inserting_duplicate_id() {
        let (repo, _feed) = setup().await;
        let rule = rule_at(TenantId::new(), "Big orders", "2024-05-01T10:00:00Z");
        repo.insert(rule.clone()).await.unwrap();

        let err = repo.insert(rule).await.unwrap_err();

        assert!(matches!(err, MiniCrmError::Persistence(_)));
    }
}
