use crate::dom::{Document, ElementSpec, NodeId};
use crate::models::Severity;
use crate::scheduler::{Scheduler, TimerTask, ToastId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub const TOAST_CONTAINER_ID: &str = "toastContainer";
/// Gap between insertion and the `show` class, so the CSS transition engages.
pub const SHOW_DELAY: Duration = Duration::from_millis(10);
pub const DISPLAY_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToastPhase {
    Inserted,
    Visible,
    Removed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToastMessage {
    pub id: ToastId,
    pub severity: Severity,
    pub text: String,
    pub phase: ToastPhase,
    #[serde(skip)]
    pub node: NodeId,
}

/// Transient notifications, each timed independently.
#[derive(Debug, Default)]
pub struct Notifier {
    container: Option<NodeId>,
    next_id: u64,
    toasts: BTreeMap<ToastId, ToastMessage>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(
        &mut self,
        doc: &mut Document,
        scheduler: &mut Scheduler,
        severity: Severity,
        text: &str,
    ) -> ToastId {
        let container = self.ensure_container(doc);
        self.next_id += 1;
        let id = ToastId(self.next_id);

        let spec = ElementSpec::new("div")
            .with_class("toast-notification")
            .with_class(format!("toast-{}", severity.as_str()))
            .with_attr("role", "alert")
            .with_text(text);
        let node = doc.append(container, &spec);

        self.toasts.insert(
            id,
            ToastMessage {
                id,
                severity,
                text: text.to_string(),
                phase: ToastPhase::Inserted,
                node,
            },
        );
        scheduler.schedule(SHOW_DELAY, TimerTask::ShowToast(id));
        scheduler.schedule(DISPLAY_DURATION, TimerTask::DismissToast(id));
        debug!(toast = id.0, severity = severity.as_str(), "toast inserted");
        id
    }

    pub fn show(&mut self, doc: &mut Document, id: ToastId) -> bool {
        let Some(toast) = self.toasts.get_mut(&id) else {
            return false;
        };
        if toast.phase != ToastPhase::Inserted {
            return false;
        }
        toast.phase = ToastPhase::Visible;
        doc.add_class(toast.node, "show");
        true
    }

    /// Removes a toast. Dismissing twice, or dismissing an unknown id, is a
    /// no-op that returns `false`.
    pub fn dismiss(&mut self, doc: &mut Document, id: ToastId) -> bool {
        let Some(toast) = self.toasts.get_mut(&id) else {
            return false;
        };
        if toast.phase == ToastPhase::Removed {
            return false;
        }
        toast.phase = ToastPhase::Removed;
        doc.remove_class(toast.node, "show");
        doc.detach(toast.node);
        debug!(toast = id.0, "toast removed");
        true
    }

    pub fn get(&self, id: ToastId) -> Option<&ToastMessage> {
        self.toasts.get(&id)
    }

    /// Every toast shown during this page lifetime, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ToastMessage> {
        self.toasts.values()
    }

    pub fn active(&self) -> impl Iterator<Item = &ToastMessage> {
        self.toasts
            .values()
            .filter(|toast| toast.phase != ToastPhase::Removed)
    }

    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    fn ensure_container(&mut self, doc: &mut Document) -> NodeId {
        if let Some(id) = self.container.filter(|id| doc.is_attached(*id)) {
            return id;
        }
        let id = match doc.by_id(TOAST_CONTAINER_ID) {
            Some(existing) => existing,
            None => {
                let spec = ElementSpec::new("div")
                    .with_id(TOAST_CONTAINER_ID)
                    .with_attr("style", "position: fixed; top: 20px; right: 20px; z-index: 1050;");
                let body = doc.body();
                doc.append(body, &spec)
            }
        };
        self.container = Some(id);
        id
    }
}
