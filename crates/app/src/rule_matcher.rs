//! Rule matcher — selects the rules a change event activates.
//!
//! Matching is coarse-grained: a rule matches when it is active, belongs to
//! the event's tenant, and its trigger type is the event's trigger category.
//! Trigger configs (tags, status transitions, thresholds) are not evaluated.

use minicrm_domain::automation::{AutomationRule, TriggerType};
use minicrm_domain::change::ChangeEvent;

/// Rules from `rules` that `event` activates, in their original order.
///
/// Every match is independent; there is no priority between them.
#[must_use]
pub fn match_rules<'a>(
    event: &ChangeEvent,
    rules: &'a [AutomationRule],
) -> Vec<&'a AutomationRule> {
    let Some(trigger_type) = TriggerType::for_change(event) else {
        return Vec::new();
    };
    rules
        .iter()
        .filter(|rule| {
            rule.is_active
                && rule.tenant_id == event.tenant_id
                && rule.trigger_type() == trigger_type
        })
        .collect()
}
