use crate::dom::{Document, NodeId};
use crate::models::ActionKind;
use std::collections::HashMap;

pub const DARK_MODE_TOGGLE_ID: &str = "darkModeToggle";
pub const ADD_BILL_FORM_ID: &str = "addBillForm";
pub const GOAL_FORM_ID: &str = "savingsGoalForm";
pub const GOAL_MODAL_ID: &str = "addSavingsGoalModal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    Click,
    Submit,
}

/// What a bound element does when its event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Action(ActionKind),
    /// Shared goal form: create or update depending on how it was opened.
    GoalForm,
    ToggleTheme,
    OpenGoalCreate,
}

enum Locator {
    Class(&'static str),
    Id(&'static str),
}

const TRIGGERS: [(Locator, TriggerEvent, Binding); 7] = [
    (Locator::Class("mark-paid-btn"), TriggerEvent::Click, Binding::Action(ActionKind::MarkBillPaid)),
    (Locator::Id(ADD_BILL_FORM_ID), TriggerEvent::Submit, Binding::Action(ActionKind::AddBill)),
    (Locator::Id(GOAL_FORM_ID), TriggerEvent::Submit, Binding::GoalForm),
    (Locator::Class("add-savings-btn"), TriggerEvent::Click, Binding::Action(ActionKind::ContributeSavings)),
    (Locator::Class("adjust-goal-btn"), TriggerEvent::Click, Binding::Action(ActionKind::EditSavingsGoal)),
    (Locator::Id(DARK_MODE_TOGGLE_ID), TriggerEvent::Click, Binding::ToggleTheme),
    (Locator::Class("new-goal-btn"), TriggerEvent::Click, Binding::OpenGoalCreate),
];

/// Trigger bindings for one page load; at most one per element and event.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    bindings: HashMap<(NodeId, TriggerEvent), Binding>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans the document for known triggers. Elements that already have a
    /// binding for the event are skipped; returns how many were added.
    pub fn bind_document(&mut self, doc: &Document) -> usize {
        let mut added = 0;
        for (locator, event, binding) in &TRIGGERS {
            let nodes = match locator {
                Locator::Class(class) => doc.by_class(class),
                Locator::Id(id) => doc.by_id(id).into_iter().collect(),
            };
            for node in nodes {
                if self.bind(node, *event, *binding) {
                    added += 1;
                }
            }
        }
        added
    }

    pub fn bind(&mut self, node: NodeId, event: TriggerEvent, binding: Binding) -> bool {
        if self.bindings.contains_key(&(node, event)) {
            return false;
        }
        self.bindings.insert((node, event), binding);
        true
    }

    pub fn binding(&self, node: NodeId, event: TriggerEvent) -> Option<Binding> {
        self.bindings.get(&(node, event)).copied()
    }

    /// Finds the handler for an event fired at `target`, bubbling up through
    /// ancestors. Returns the bound element together with its binding.
    pub fn resolve(&self, doc: &Document, target: NodeId, event: TriggerEvent) -> Option<(NodeId, Binding)> {
        if !doc.is_attached(target) {
            return None;
        }
        let mut current = Some(target);
        while let Some(node) = current {
            if let Some(binding) = self.binding(node, event) {
                return Some((node, binding));
            }
            current = doc.node(node).and_then(|n| n.parent());
        }
        None
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
