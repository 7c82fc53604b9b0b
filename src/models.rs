use crate::dom::NodeId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ADD_GOAL_PATH: &str = "/users/savings/goal/add/";
pub const UPDATE_GOAL_TEMPLATE: &str = "/users/savings/goal/{id}/update/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    MarkBillPaid,
    AddBill,
    AddSavingsGoal,
    ContributeSavings,
    EditSavingsGoal,
    UpdateSavingsGoal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn is_mutating(self) -> bool {
        matches!(self, HttpMethod::Post)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    FormFields,
    SingleAmountField,
    None,
}

/// Where the entity identifier substituted into the endpoint comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitySource {
    /// `data-*` attribute on the trigger element.
    TriggerData(&'static str),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPolicy {
    /// Fade out the closest ancestor with this class, then detach it.
    RemoveElement { item_class: &'static str },
    ReloadPage,
    PopulateAndShowModal,
    CloseModalAndReload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    pub endpoint_template: &'static str,
    pub method: HttpMethod,
    pub payload_source: PayloadSource,
    pub entity_source: EntitySource,
    pub on_success: SuccessPolicy,
    /// Goal lookups answer with a JSON body; everything else is ignored.
    pub expects_json: bool,
    pub success_message: &'static str,
    pub failure_message: &'static str,
}

static MARK_BILL_PAID: ActionDescriptor = ActionDescriptor {
    kind: ActionKind::MarkBillPaid,
    endpoint_template: "/users/bill/{id}/mark-paid/",
    method: HttpMethod::Post,
    payload_source: PayloadSource::None,
    entity_source: EntitySource::TriggerData("bill-id"),
    on_success: SuccessPolicy::RemoveElement { item_class: "bill-item" },
    expects_json: false,
    success_message: "Bill marked as paid successfully!",
    failure_message: "Failed to mark bill as paid. Please try again.",
};

static ADD_BILL: ActionDescriptor = ActionDescriptor {
    kind: ActionKind::AddBill,
    endpoint_template: "/users/bill/add/",
    method: HttpMethod::Post,
    payload_source: PayloadSource::FormFields,
    entity_source: EntitySource::None,
    on_success: SuccessPolicy::CloseModalAndReload,
    expects_json: false,
    success_message: "New bill added successfully!",
    failure_message: "Failed to add bill. Please try again.",
};

static ADD_SAVINGS_GOAL: ActionDescriptor = ActionDescriptor {
    kind: ActionKind::AddSavingsGoal,
    endpoint_template: ADD_GOAL_PATH,
    method: HttpMethod::Post,
    payload_source: PayloadSource::FormFields,
    entity_source: EntitySource::None,
    on_success: SuccessPolicy::CloseModalAndReload,
    expects_json: false,
    success_message: "New savings goal created successfully!",
    failure_message: "Failed to create savings goal. Please try again.",
};

// The success text carries the amount, see `controller::success_text`.
static CONTRIBUTE_SAVINGS: ActionDescriptor = ActionDescriptor {
    kind: ActionKind::ContributeSavings,
    endpoint_template: UPDATE_GOAL_TEMPLATE,
    method: HttpMethod::Post,
    payload_source: PayloadSource::SingleAmountField,
    entity_source: EntitySource::TriggerData("goal-id"),
    on_success: SuccessPolicy::ReloadPage,
    expects_json: false,
    success_message: "Added UGX {amount} to your savings!",
    failure_message: "Failed to update savings. Please try again.",
};

static EDIT_SAVINGS_GOAL: ActionDescriptor = ActionDescriptor {
    kind: ActionKind::EditSavingsGoal,
    endpoint_template: "/users/savings/goal/{id}/",
    method: HttpMethod::Get,
    payload_source: PayloadSource::None,
    entity_source: EntitySource::TriggerData("goal-id"),
    on_success: SuccessPolicy::PopulateAndShowModal,
    expects_json: true,
    success_message: "Savings goal loaded for editing.",
    failure_message: "Failed to load goal details. Please try again.",
};

static UPDATE_SAVINGS_GOAL: ActionDescriptor = ActionDescriptor {
    kind: ActionKind::UpdateSavingsGoal,
    endpoint_template: UPDATE_GOAL_TEMPLATE,
    method: HttpMethod::Post,
    payload_source: PayloadSource::FormFields,
    entity_source: EntitySource::TriggerData("goal-id"),
    on_success: SuccessPolicy::CloseModalAndReload,
    expects_json: false,
    success_message: "Savings goal updated successfully!",
    failure_message: "Failed to update savings goal. Please try again.",
};

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::MarkBillPaid,
        ActionKind::AddBill,
        ActionKind::AddSavingsGoal,
        ActionKind::ContributeSavings,
        ActionKind::EditSavingsGoal,
        ActionKind::UpdateSavingsGoal,
    ];

    pub fn descriptor(self) -> &'static ActionDescriptor {
        match self {
            ActionKind::MarkBillPaid => &MARK_BILL_PAID,
            ActionKind::AddBill => &ADD_BILL,
            ActionKind::AddSavingsGoal => &ADD_SAVINGS_GOAL,
            ActionKind::ContributeSavings => &CONTRIBUTE_SAVINGS,
            ActionKind::EditSavingsGoal => &EDIT_SAVINGS_GOAL,
            ActionKind::UpdateSavingsGoal => &UPDATE_SAVINGS_GOAL,
        }
    }
}

impl ActionDescriptor {
    /// Substitutes the entity identifier into the endpoint template. The id
    /// must stay a single path segment; anything else yields `None`.
    pub fn path_for(&self, entity_id: Option<&str>) -> Option<String> {
        if !self.endpoint_template.contains("{id}") {
            return Some(self.endpoint_template.to_string());
        }
        let id = entity_id.map(str::trim).filter(|id| is_plain_segment(id))?;
        Some(self.endpoint_template.replace("{id}", id))
    }
}

fn is_plain_segment(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionStatus {
    Pending,
    Succeeded,
    Failed,
}

/// One in-flight user action. Created `Pending`, settles exactly once.
#[derive(Debug)]
pub struct PendingAction {
    pub descriptor: &'static ActionDescriptor,
    pub trigger: NodeId,
    pub entity_id: Option<String>,
    status: ActionStatus,
}

impl PendingAction {
    pub fn new(descriptor: &'static ActionDescriptor, trigger: NodeId, entity_id: Option<String>) -> Self {
        Self {
            descriptor,
            trigger,
            entity_id,
            status: ActionStatus::Pending,
        }
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    /// Moves to a terminal state. Returns `false` if already settled.
    pub fn settle(&mut self, succeeded: bool) -> bool {
        if self.status != ActionStatus::Pending {
            return false;
        }
        self.status = if succeeded {
            ActionStatus::Succeeded
        } else {
            ActionStatus::Failed
        };
        true
    }
}

/// Request body for a remote action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    #[default]
    Empty,
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

/// Amounts arrive either as JSON numbers or as decimal strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountValue {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for AmountValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountValue::Number(number) => write!(f, "{number}"),
            AmountValue::Text(text) => f.write_str(text),
        }
    }
}

/// Body of `GET /users/savings/goal/{id}/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoalDetails {
    pub name: String,
    pub target_amount: AmountValue,
    pub current_savings: AmountValue,
    pub target_date: NaiveDate,
}

impl GoalDetails {
    /// Form field values in the order the edit form declares them.
    pub fn form_values(&self) -> [(&'static str, String); 4] {
        [
            ("name", self.name.clone()),
            ("target_amount", self.target_amount.to_string()),
            ("current_savings", self.current_savings.to_string()),
            ("target_date", self.target_date.format("%Y-%m-%d").to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_substitutes_entity_id() {
        let descriptor = ActionKind::MarkBillPaid.descriptor();
        assert_eq!(descriptor.path_for(Some("42")).as_deref(), Some("/users/bill/42/mark-paid/"));
        assert_eq!(descriptor.path_for(None), None);
        assert_eq!(descriptor.path_for(Some("  ")), None);
        assert_eq!(
            ActionKind::AddBill.descriptor().path_for(None).as_deref(),
            Some("/users/bill/add/")
        );
    }

    #[test]
    fn entity_id_cannot_escape_its_segment() {
        let descriptor = ActionKind::MarkBillPaid.descriptor();
        for id in ["../../../admin/delete?x=", "..", ".", "42/7", "42#x", "4 2", "%2e%2e"] {
            assert_eq!(descriptor.path_for(Some(id)), None, "{id}");
        }
        assert_eq!(
            descriptor.path_for(Some(" 42 ")).as_deref(),
            Some("/users/bill/42/mark-paid/")
        );
    }

    #[test]
    fn pending_action_settles_once() {
        let mut action = PendingAction::new(ActionKind::AddBill.descriptor(), 3, None);
        assert_eq!(action.status(), ActionStatus::Pending);
        assert!(action.settle(false));
        assert!(!action.settle(true));
        assert_eq!(action.status(), ActionStatus::Failed);
    }

    #[test]
    fn goal_details_accept_numbers_and_strings() {
        let goal: GoalDetails = serde_json::from_str(
            r#"{"name":"Car","target_amount":"5000000.00","current_savings":1200,"target_date":"2027-03-01"}"#,
        )
        .unwrap();
        let values = goal.form_values();
        assert_eq!(values[1].1, "5000000.00");
        assert_eq!(values[2].1, "1200");
        assert_eq!(values[3].1, "2027-03-01");
    }

    #[test]
    fn every_kind_has_its_own_descriptor() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.descriptor().kind, kind);
        }
    }
}
