use serde::Serialize;

use super::plan::Plan;

/// What a plan request does to a customer's subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTransition {
    /// No active subscription yet.
    Create,
    /// Requested plan is the one already active. Nothing is written.
    Reuse,
    /// Immediate switch to a plan of equal or higher yearly amount.
    Upgrade,
    /// Switch to a cheaper plan, queued until the next billing boundary.
    Downgrade,
}

impl SubscriptionTransition {
    /// Decides the transition for `target` given the plan of the active subscription.
    ///
    /// A different plan with the same yearly amount counts as an upgrade.
    pub fn classify(current_plan: Option<&Plan>, target: &Plan) -> Self {
        let Some(current) = current_plan else {
            return SubscriptionTransition::Create;
        };

        if current.id == target.id {
            return SubscriptionTransition::Reuse;
        }

        if target.yearly_amount_cents() >= current.yearly_amount_cents() {
            SubscriptionTransition::Upgrade
        } else {
            SubscriptionTransition::Downgrade
        }
    }

    /// Value of the `subscription_type` tracking property.
    pub fn tracking_type(&self) -> &'static str {
        match self {
            SubscriptionTransition::Create | SubscriptionTransition::Reuse => "create",
            SubscriptionTransition::Upgrade => "upgrade",
            SubscriptionTransition::Downgrade => "downgrade",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTransition::Create => "create",
            SubscriptionTransition::Reuse => "reuse",
            SubscriptionTransition::Upgrade => "upgrade",
            SubscriptionTransition::Downgrade => "downgrade",
        }
    }
}

impl std::fmt::Display for SubscriptionTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
