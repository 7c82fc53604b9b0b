use crate::charts::Chart;
use crate::client::{RemoteActionClient, ResponseBody};
use crate::dom::{Document, ElementSpec, NodeId};
use crate::errors::ActionError;
use crate::models::{
    ADD_GOAL_PATH, ActionDescriptor, ActionKind, EntitySource, GoalDetails, Payload, PayloadSource,
    PendingAction, Severity, SuccessPolicy,
};
use crate::notifier::ToastMessage;
use crate::prompt::Prompt;
use crate::registry::{Binding, GOAL_FORM_ID, GOAL_MODAL_ID, TriggerEvent};
use crate::state::{PageSnapshot, SharedUi, UiState};
use crate::storage::{Preferences, persist_preferences};
use crate::theme::{DARK_MODE_CLASS, toggle_dark_mode};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Window between the fade-out class and detaching a removed list item.
pub const REMOVE_ANIMATION: Duration = Duration::from_millis(300);
pub const AMOUNT_PROMPT: &str = "Enter amount to add to savings:";
pub const EDIT_GOAL_TITLE: &str = "Edit Savings Goal";
pub const ADD_GOAL_TITLE: &str = "Add Savings Goal";

const GOAL_FIELDS: [&str; 4] = ["name", "target_amount", "current_savings", "target_date"];

#[derive(Debug)]
pub enum ActionOutcome {
    Completed,
    Failed(ActionError),
    /// Prompt dismissed or answered with something that is not a number.
    Cancelled,
    /// Trigger already has a request in flight, or is gone.
    Skipped,
    /// The page was reloaded while the request was out.
    Discarded,
}

impl ActionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed)
    }
}

/// Page-facing handle. Cheap to clone; every clone drives the same page.
#[derive(Clone)]
pub struct Dashboard {
    ui: SharedUi,
    client: RemoteActionClient,
    /// Blocking prompt; only ever asked off the async workers, with the page
    /// unlocked.
    prompt: Arc<Mutex<Box<dyn Prompt>>>,
}

struct Prepared {
    pending: PendingAction,
    payload: Payload,
    csrf_token: Option<String>,
    amount: Option<f64>,
    generation: u64,
}

impl Dashboard {
    pub fn new(
        client: RemoteActionClient,
        prompt: Box<dyn Prompt>,
        prefs: Preferences,
        prefs_path: Option<PathBuf>,
    ) -> Self {
        Self {
            ui: Arc::new(Mutex::new(UiState::new(prefs, prefs_path))),
            client,
            prompt: Arc::new(Mutex::new(prompt)),
        }
    }

    pub fn shared(&self) -> SharedUi {
        Arc::clone(&self.ui)
    }

    pub async fn load_page(&self, snapshot: &PageSnapshot) {
        let mut ui = self.ui.lock().await;
        ui.load(snapshot);
        info!(bindings = ui.registry.len(), charts = ui.charts.len(), "page loaded");
    }

    /// Delivers a user event to whatever is bound at or above `target`.
    /// Returns `None` when nothing handles it.
    pub async fn dispatch(&self, target: NodeId, event: TriggerEvent) -> Option<ActionOutcome> {
        let (node, binding) = {
            let ui = self.ui.lock().await;
            let (node, binding) = ui.registry.resolve(&ui.document, target, event)?;
            let binding = match binding {
                Binding::GoalForm if ui.document.data(node, "goal-id").is_some() => {
                    Binding::Action(ActionKind::UpdateSavingsGoal)
                }
                Binding::GoalForm => Binding::Action(ActionKind::AddSavingsGoal),
                other => other,
            };
            (node, binding)
        };

        let outcome = match binding {
            Binding::Action(kind) => self.perform(kind.descriptor(), node).await,
            Binding::ToggleTheme => {
                self.toggle_theme().await;
                ActionOutcome::Completed
            }
            Binding::OpenGoalCreate => {
                if self.open_goal_create().await {
                    ActionOutcome::Completed
                } else {
                    ActionOutcome::Skipped
                }
            }
            Binding::GoalForm => ActionOutcome::Skipped,
        };
        Some(outcome)
    }

    /// Runs one user action to completion: collect input, call the server,
    /// then either apply the success policy or report the failure. Nothing
    /// visible changes before the server has answered.
    pub async fn perform(&self, descriptor: &'static ActionDescriptor, trigger: NodeId) -> ActionOutcome {
        let generation = {
            let mut guard = self.ui.lock().await;
            match reserve(&mut guard, descriptor, trigger) {
                Some(generation) => generation,
                None => return ActionOutcome::Skipped,
            }
        };

        let amount = match descriptor.payload_source {
            PayloadSource::SingleAmountField => match self.ask_amount().await {
                Ok(amount) => Some(amount),
                Err(err) => {
                    release(&mut *self.ui.lock().await, trigger, generation);
                    debug!(kind = ?descriptor.kind, "{err}");
                    return ActionOutcome::Cancelled;
                }
            },
            PayloadSource::FormFields | PayloadSource::None => None,
        };

        let mut prepared = {
            let mut guard = self.ui.lock().await;
            if guard.generation != generation {
                debug!(kind = ?descriptor.kind, "page replaced while prompting");
                return ActionOutcome::Discarded;
            }
            prepare(&mut guard, descriptor, trigger, generation, amount)
        };

        info!(kind = ?descriptor.kind, entity = ?prepared.pending.entity_id, "action started");
        let result = self
            .client
            .send(
                descriptor,
                prepared.pending.entity_id.as_deref(),
                &prepared.payload,
                prepared.csrf_token.as_deref(),
            )
            .await;

        let mut guard = self.ui.lock().await;
        settle(&mut guard, &mut prepared, result)
    }

    async fn ask_amount(&self) -> Result<(String, f64), ActionError> {
        let prompt = Arc::clone(&self.prompt);
        let answer = tokio::task::spawn_blocking(move || prompt.blocking_lock().ask(AMOUNT_PROMPT))
            .await
            .map_err(|err| {
                error!("amount prompt failed: {err}");
                ActionError::UserCancelled
            })?;
        answer
            .as_deref()
            .and_then(parse_amount)
            .ok_or(ActionError::UserCancelled)
    }

    pub async fn toggle_theme(&self) -> bool {
        let (dark, prefs, path) = {
            let mut guard = self.ui.lock().await;
            let ui = &mut *guard;
            let dark = toggle_dark_mode(&mut ui.document, &mut ui.charts, &mut ui.prefs);
            (dark, ui.prefs.clone(), ui.prefs_path.clone())
        };
        if let Some(path) = path {
            if let Err(err) = persist_preferences(&path, &prefs).await {
                error!("failed to persist preferences: {err}");
            }
        }
        info!(dark, "theme toggled");
        dark
    }

    /// Opens the shared goal modal in create mode, overwriting anything a
    /// previous edit left behind.
    pub async fn open_goal_create(&self) -> bool {
        let mut guard = self.ui.lock().await;
        match goal_modal(&guard.document) {
            Some(parts) => {
                fill_goal_modal(&mut guard.document, &parts, GoalModalMode::Create);
                true
            }
            None => {
                warn!("goal modal missing from page");
                false
            }
        }
    }

    pub async fn select(&self, selector: &str) -> Option<NodeId> {
        self.ui.lock().await.document.select(selector)
    }

    pub async fn notify(&self, severity: Severity, text: &str) {
        let mut guard = self.ui.lock().await;
        let ui = &mut *guard;
        ui.notifier.notify(&mut ui.document, &mut ui.scheduler, severity, text);
    }

    /// Advances the virtual clock, firing due timers. Returns how many fired.
    pub async fn advance(&self, by: Duration) -> usize {
        self.ui.lock().await.advance(by)
    }

    /// Drains the timer queue against the wall clock.
    pub async fn run_timers(&self) {
        loop {
            let wait = {
                let ui = self.ui.lock().await;
                match ui.scheduler.next_due() {
                    Some(due) => due.saturating_sub(ui.scheduler.now()),
                    None => break,
                }
            };
            tokio::time::sleep(wait).await;
            self.advance(wait).await;
        }
    }

    pub async fn report(&self) -> PageReport {
        let ui = self.ui.lock().await;
        PageReport {
            dark_mode: ui.document.has_class(ui.document.body(), DARK_MODE_CLASS),
            reload_requests: ui.reload_requests,
            pending_timers: ui.scheduler.pending(),
            toasts: ui.notifier.history().cloned().collect(),
            charts: ui.charts.instances().to_vec(),
            body: ui.document.to_spec(),
        }
    }
}

/// Snapshot of the page after a run, for the command line driver.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub dark_mode: bool,
    pub reload_requests: u32,
    pub pending_timers: usize,
    pub toasts: Vec<ToastMessage>,
    pub charts: Vec<Chart>,
    pub body: ElementSpec,
}

/// Claims the trigger for one request. `None` when it is busy or gone.
fn reserve(ui: &mut UiState, descriptor: &ActionDescriptor, trigger: NodeId) -> Option<u64> {
    if !ui.document.is_attached(trigger) || ui.in_flight.contains(&trigger) || ui.document.is_disabled(trigger) {
        debug!(kind = ?descriptor.kind, trigger, "trigger busy or gone, ignoring");
        return None;
    }
    ui.in_flight.insert(trigger);
    ui.document.set_disabled(trigger, true);
    Some(ui.generation)
}

fn release(ui: &mut UiState, trigger: NodeId, generation: u64) {
    if ui.generation == generation {
        ui.in_flight.remove(&trigger);
        ui.document.set_disabled(trigger, false);
    }
}

fn prepare(
    ui: &mut UiState,
    descriptor: &'static ActionDescriptor,
    trigger: NodeId,
    generation: u64,
    amount: Option<(String, f64)>,
) -> Prepared {
    let entity_id = match descriptor.entity_source {
        EntitySource::TriggerData(key) => ui.document.data(trigger, key).map(str::to_string),
        EntitySource::None => None,
    };

    let payload = match (descriptor.payload_source, &amount) {
        (PayloadSource::FormFields, _) => Payload::Form(ui.document.form_fields(trigger)),
        (PayloadSource::SingleAmountField, Some((text, _))) => {
            Payload::Form(vec![("amount".to_string(), text.clone())])
        }
        (PayloadSource::SingleAmountField, None) | (PayloadSource::None, _) => Payload::Empty,
    };

    // Read at call time: the server may rotate the token between requests.
    let csrf_token = ui.document.csrf_token();

    Prepared {
        pending: PendingAction::new(descriptor, trigger, entity_id),
        payload,
        csrf_token,
        amount: amount.map(|(_, value)| value),
        generation,
    }
}

fn settle(ui: &mut UiState, prepared: &mut Prepared, result: Result<ResponseBody, ActionError>) -> ActionOutcome {
    let (amount, generation) = (prepared.amount, prepared.generation);
    let pending = &mut prepared.pending;
    let descriptor = pending.descriptor;

    if generation != ui.generation {
        pending.settle(false);
        debug!(kind = ?descriptor.kind, status = ?pending.status(), "page replaced while request was in flight");
        return ActionOutcome::Discarded;
    }

    ui.in_flight.remove(&pending.trigger);
    ui.document.set_disabled(pending.trigger, false);

    match result.and_then(|body| apply_success(ui, pending, body)) {
        Ok(()) => {
            pending.settle(true);
            let text = success_text(descriptor, amount);
            ui.notifier
                .notify(&mut ui.document, &mut ui.scheduler, Severity::Success, &text);
            info!(kind = ?descriptor.kind, status = ?pending.status(), "action completed");
            ActionOutcome::Completed
        }
        Err(err) => {
            pending.settle(false);
            if err.is_reported() {
                ui.notifier.notify(
                    &mut ui.document,
                    &mut ui.scheduler,
                    Severity::Error,
                    descriptor.failure_message,
                );
            }
            warn!(kind = ?descriptor.kind, status = ?pending.status(), "action failed: {err}");
            ActionOutcome::Failed(err)
        }
    }
}

fn apply_success(ui: &mut UiState, pending: &PendingAction, body: ResponseBody) -> Result<(), ActionError> {
    match pending.descriptor.on_success {
        SuccessPolicy::RemoveElement { item_class } => {
            let item = ui
                .document
                .closest(pending.trigger, item_class)
                .unwrap_or(pending.trigger);
            ui.document.add_class(item, "fade-out");
            // Stays disabled until the detach; the entity is already settled.
            ui.document.set_disabled(pending.trigger, true);
            ui.scheduler
                .schedule(REMOVE_ANIMATION, crate::scheduler::TimerTask::DetachElement(item));
        }
        SuccessPolicy::ReloadPage | SuccessPolicy::CloseModalAndReload => {
            close_open_modals(&mut ui.document);
            ui.reload_requests += 1;
        }
        SuccessPolicy::PopulateAndShowModal => {
            let ResponseBody::Json(value) = body else {
                return Err(ActionError::DecodeFailure("expected a JSON body".to_string()));
            };
            let goal: GoalDetails = serde_json::from_value(value)?;
            let id = pending
                .entity_id
                .clone()
                .ok_or_else(|| ActionError::MalformedTrigger("goal id missing".to_string()))?;
            let parts = goal_modal(&ui.document)
                .ok_or_else(|| ActionError::MalformedTrigger("goal modal missing".to_string()))?;
            fill_goal_modal(&mut ui.document, &parts, GoalModalMode::Edit { id, goal });
        }
    }
    Ok(())
}

fn success_text(descriptor: &ActionDescriptor, amount: Option<f64>) -> String {
    match amount {
        Some(amount) => descriptor
            .success_message
            .replace("{amount}", &format_amount(amount)),
        None => descriptor.success_message.to_string(),
    }
}

/// Accepts what a numeric check on the raw prompt text accepts: anything that
/// parses as a finite number once surrounding whitespace is dropped.
pub fn parse_amount(input: &str) -> Option<(String, f64)> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = trimmed.parse::<f64>().ok().filter(|value| value.is_finite())?;
    Some((trimmed.to_string(), value))
}

/// Thousands-separated, at most three fraction digits, trailing zeros dropped.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + whole.len() / 3 + 1);
    if value < 0.0 && (whole != "0" || !fraction.is_empty()) {
        out.push('-');
    }
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn close_open_modals(doc: &mut Document) -> usize {
    let open: Vec<NodeId> = doc
        .by_class("modal")
        .into_iter()
        .filter(|id| doc.has_class(*id, "show"))
        .collect();
    for id in &open {
        doc.remove_class(*id, "show");
    }
    open.len()
}

struct GoalModalParts {
    modal: NodeId,
    form: NodeId,
    title: Option<NodeId>,
}

enum GoalModalMode {
    Create,
    Edit { id: String, goal: GoalDetails },
}

fn goal_modal(doc: &Document) -> Option<GoalModalParts> {
    let modal = doc.by_id(GOAL_MODAL_ID)?;
    let form = doc.by_id(GOAL_FORM_ID)?;
    Some(GoalModalParts {
        modal,
        form,
        title: doc.descendant_by_class(modal, "modal-title"),
    })
}

/// Every field the modal carries is rewritten, whichever mode it opens in.
fn fill_goal_modal(doc: &mut Document, parts: &GoalModalParts, mode: GoalModalMode) {
    match mode {
        GoalModalMode::Create => {
            if let Some(title) = parts.title {
                doc.set_text(title, ADD_GOAL_TITLE);
            }
            for name in GOAL_FIELDS {
                doc.set_field(parts.form, name, "");
            }
            doc.set_attr(parts.form, "action", ADD_GOAL_PATH);
            doc.remove_data(parts.form, "goal-id");
        }
        GoalModalMode::Edit { id, goal } => {
            if let Some(title) = parts.title {
                doc.set_text(title, EDIT_GOAL_TITLE);
            }
            for (name, value) in goal.form_values() {
                doc.set_field(parts.form, name, &value);
            }
            let action = ActionKind::UpdateSavingsGoal
                .descriptor()
                .path_for(Some(&id))
                .unwrap_or_default();
            doc.set_attr(parts.form, "action", &action);
            doc.set_data(parts.form, "goal-id", &id);
        }
    }
    doc.add_class(parts.modal, "show");
}
