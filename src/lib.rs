pub mod charts;
pub mod client;
pub mod config;
pub mod controller;
pub mod dom;
pub mod errors;
pub mod models;
pub mod notifier;
pub mod prompt;
pub mod registry;
pub mod scheduler;
pub mod state;
pub mod storage;
pub mod theme;

pub use client::RemoteActionClient;
pub use controller::{ActionOutcome, Dashboard, PageReport};
pub use registry::TriggerEvent;
pub use state::{PageSnapshot, UiState};
pub use storage::{load_preferences, resolve_prefs_path};
