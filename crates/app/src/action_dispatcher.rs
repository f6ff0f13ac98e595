//! Action dispatcher — executes one rule's action and audits the outcome.

use minicrm_domain::automation::{ActionConfig, AutomationRule};
use minicrm_domain::error::MiniCrmError;
use minicrm_domain::execution_log::Outcome;
use minicrm_domain::task::Task;

use crate::execution_logger::ExecutionLogger;
use crate::ports::{ExecutionLogStore, TaskRepository, WebhookClient, WebhookRequest};

/// An email composed by a `send_email` action.
///
/// Delivery is not wired to any provider yet: composing always succeeds
/// and the message is only emitted on the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub template: String,
    pub context: serde_json::Value,
}

/// Runs actions against the task store and webhook client, recording every
/// attempt through an [`ExecutionLogger`].
pub struct ActionDispatcher<T, W, L> {
    tasks: T,
    webhooks: W,
    logger: ExecutionLogger<L>,
}

impl<T, W, L> ActionDispatcher<T, W, L>
where
    T: TaskRepository,
    W: WebhookClient,
    L: ExecutionLogStore,
{
    pub fn new(tasks: T, webhooks: W, log_store: L) -> Self {
        Self {
            tasks,
            webhooks,
            logger: ExecutionLogger::new(log_store),
        }
    }

    /// Execute `rule`'s action with `context` as the triggering data.
    ///
    /// Exactly one execution log entry is written whatever the result.
    ///
    /// # Errors
    ///
    /// Returns the action's failure after it has been logged:
    /// [`MiniCrmError::Persistence`] when a task insert fails,
    /// [`MiniCrmError::Http`] when a webhook fails.
    #[tracing::instrument(
        skip_all,
        fields(tenant_id = %rule.tenant_id, rule_id = %rule.id, action_type = %rule.action_type())
    )]
    pub async fn dispatch(
        &self,
        rule: &AutomationRule,
        context: &serde_json::Value,
    ) -> Result<Outcome, MiniCrmError> {
        let result = self.execute(rule, context).await;
        let outcome = Outcome::from_result(&result);
        self.logger
            .record(
                rule.tenant_id,
                rule.id,
                rule.action_type(),
                context.clone(),
                outcome.clone(),
            )
            .await;
        result.map(|()| outcome)
    }

    async fn execute(
        &self,
        rule: &AutomationRule,
        context: &serde_json::Value,
    ) -> Result<(), MiniCrmError> {
        match &rule.action {
            ActionConfig::SendEmail { template, subject } => {
                let message = EmailMessage {
                    subject: subject.clone(),
                    template: template.clone(),
                    context: context.clone(),
                };
                tracing::info!(
                    subject = %message.subject,
                    template = %message.template,
                    "email composed (delivery not configured)"
                );
                Ok(())
            }
            ActionConfig::CreateTask { title, assignee } => {
                let task = Task::pending(
                    rule.tenant_id,
                    title.clone(),
                    assignee.clone(),
                    minicrm_domain::time::now(),
                );
                let task = self.tasks.insert(task).await?;
                tracing::debug!(task_id = %task.id, "task created");
                Ok(())
            }
            ActionConfig::Webhook {
                url,
                method,
                headers,
            } => {
                let request = WebhookRequest::json(*method, url.clone(), headers, context.clone());
                self.webhooks.send(&request).await
            }
        }
    }
}
