use crate::charts::{ChartRegistry, DashboardChartData, initialize_charts};
use crate::dom::{Document, ElementSpec, NodeId};
use crate::notifier::Notifier;
use crate::registry::ActionRegistry;
use crate::scheduler::{Scheduler, TimerTask};
use crate::storage::Preferences;
use crate::theme::apply_stored_theme;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// What the server renders: the page tree plus the chart series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub body: ElementSpec,
    #[serde(default)]
    pub chart_data: Option<DashboardChartData>,
}

/// Everything one page load owns. Replaced wholesale on reload.
pub struct UiState {
    pub document: Document,
    pub notifier: Notifier,
    pub scheduler: Scheduler,
    pub charts: ChartRegistry,
    pub registry: ActionRegistry,
    pub prefs: Preferences,
    pub prefs_path: Option<PathBuf>,
    pub in_flight: HashSet<NodeId>,
    pub reload_requests: u32,
    /// Bumped on every load; node ids from an older page are meaningless.
    pub generation: u64,
}

impl UiState {
    pub fn new(prefs: Preferences, prefs_path: Option<PathBuf>) -> Self {
        Self {
            document: Document::new(),
            notifier: Notifier::new(),
            scheduler: Scheduler::new(),
            charts: ChartRegistry::new(),
            registry: ActionRegistry::new(),
            prefs,
            prefs_path,
            in_flight: HashSet::new(),
            reload_requests: 0,
            generation: 0,
        }
    }

    /// Page-load initialisation: fresh document, charts, stored theme and
    /// trigger bindings. Everything tied to the previous page is dropped.
    pub fn load(&mut self, snapshot: &PageSnapshot) {
        self.document = Document::from_spec(&snapshot.body);
        self.notifier = Notifier::new();
        self.scheduler = Scheduler::new();
        self.charts = ChartRegistry::new();
        self.registry = ActionRegistry::new();
        self.in_flight.clear();
        self.reload_requests = 0;
        self.generation += 1;

        if let Some(data) = &snapshot.chart_data {
            initialize_charts(&self.document, &mut self.charts, data);
        }
        apply_stored_theme(&mut self.document, &mut self.charts, &self.prefs);
        self.registry.bind_document(&self.document);
    }

    /// Runs every timer due within `by`, in order, then parks the clock at
    /// the end of the window.
    pub fn advance(&mut self, by: Duration) -> usize {
        let until = self.scheduler.now() + by;
        let mut fired = 0;
        while let Some(task) = self.scheduler.pop_due(until) {
            self.run_timer(task);
            fired += 1;
        }
        self.scheduler.set_now(until);
        fired
    }

    fn run_timer(&mut self, task: TimerTask) {
        match task {
            TimerTask::ShowToast(id) => {
                self.notifier.show(&mut self.document, id);
            }
            TimerTask::DismissToast(id) => {
                self.notifier.dismiss(&mut self.document, id);
            }
            TimerTask::DetachElement(node) => {
                self.document.detach(node);
            }
        }
    }
}

pub type SharedUi = Arc<Mutex<UiState>>;
