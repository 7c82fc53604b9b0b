mod common;

use common::{closed_base_url, dashboard, dashboard_page, init_tracing, unique_prefs_path};
use dashboard_sync::charts::ChartId;
use dashboard_sync::models::Severity;
use dashboard_sync::notifier::ToastPhase;
use dashboard_sync::prompt::ScriptedPrompt;
use dashboard_sync::storage::Preferences;
use dashboard_sync::{ActionOutcome, Dashboard, RemoteActionClient, TriggerEvent, load_preferences};
use std::time::Duration;

fn dashboard_with_prefs(prefs: Preferences, path: Option<std::path::PathBuf>) -> Dashboard {
    init_tracing();
    let client = RemoteActionClient::new(&closed_base_url()).unwrap();
    Dashboard::new(client, Box::new(ScriptedPrompt::dismissing()), prefs, path)
}

#[tokio::test]
async fn page_theme_toggle_persists_and_restyles_in_place() {
    let path = unique_prefs_path();
    let dash = dashboard_with_prefs(Preferences::default(), Some(path.clone()));
    dash.load_page(&dashboard_page()).await;

    let before: Vec<ChartId> = dash.report().await.charts.iter().map(|c| c.id).collect();
    assert_eq!(before.len(), 3);

    let toggle = dash.select("#darkModeToggle").await.unwrap();
    let outcome = dash.dispatch(toggle, TriggerEvent::Click).await.unwrap();
    assert!(outcome.is_completed());

    let report = dash.report().await;
    assert!(report.dark_mode);
    let after: Vec<ChartId> = report.charts.iter().map(|c| c.id).collect();
    assert_eq!(after, before);
    for chart in &report.charts {
        assert_eq!(chart.revision, 1);
        assert_eq!(chart.options.legend_label_color, "#fff");
        for scale in chart.options.scales.values() {
            assert_eq!(scale.grid_color, "rgba(255,255,255,0.1)");
        }
    }

    let stored = load_preferences(&path).await;
    assert_eq!(stored.get("darkMode"), Some("true"));

    assert!(!dash.toggle_theme().await);
    let report = dash.report().await;
    assert!(!report.dark_mode);
    assert!(report.charts.iter().all(|c| c.revision == 2 && c.options.legend_label_color == "#666"));
    assert_eq!(load_preferences(&path).await.get("darkMode"), Some("false"));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn page_stored_dark_preference_applies_on_load() {
    let mut prefs = Preferences::default();
    prefs.set("darkMode", "true");
    let dash = dashboard_with_prefs(prefs, None);
    dash.load_page(&dashboard_page()).await;

    let report = dash.report().await;
    assert!(report.dark_mode);
    assert!(report.charts.iter().all(|c| c.options.legend_label_color == "#fff"));
}

#[tokio::test]
async fn page_light_theme_by_default() {
    let dash = dashboard_with_prefs(Preferences::default(), None);
    dash.load_page(&dashboard_page()).await;

    let report = dash.report().await;
    assert!(!report.dark_mode);
    assert!(report.charts.iter().all(|c| c.revision == 0 && c.options.legend_label_color == "#666"));
}

#[tokio::test]
async fn page_toast_lifecycle_follows_the_clock() {
    let dash = dashboard(&closed_base_url(), &[]);
    dash.load_page(&dashboard_page()).await;
    dash.notify(Severity::Info, "Saved").await;

    let ui = dash.shared();
    let phase = |ui: &dashboard_sync::UiState| ui.notifier.history().next().map(|t| t.phase);

    assert_eq!(phase(&*ui.lock().await), Some(ToastPhase::Inserted));
    dash.advance(Duration::from_millis(9)).await;
    assert_eq!(phase(&*ui.lock().await), Some(ToastPhase::Inserted));
    dash.advance(Duration::from_millis(1)).await;
    {
        let ui = ui.lock().await;
        assert_eq!(phase(&*ui), Some(ToastPhase::Visible));
        let toast = ui.notifier.history().next().unwrap();
        assert!(ui.document.has_class(toast.node, "show"));
        assert!(ui.document.has_class(toast.node, "toast-info"));
        assert_eq!(ui.document.attr(toast.node, "role"), Some("alert"));
    }

    dash.advance(Duration::from_millis(2989)).await;
    assert_eq!(phase(&*ui.lock().await), Some(ToastPhase::Visible));
    dash.advance(Duration::from_millis(1)).await;
    {
        let ui = ui.lock().await;
        assert_eq!(phase(&*ui), Some(ToastPhase::Removed));
        let toast = ui.notifier.history().next().unwrap();
        assert!(!ui.document.is_attached(toast.node));
        assert_eq!(ui.notifier.active().count(), 0);
        assert_eq!(ui.scheduler.pending(), 0);
    }
}

#[tokio::test]
async fn page_toasts_stack_in_one_container() {
    let dash = dashboard(&closed_base_url(), &[]);
    dash.load_page(&dashboard_page()).await;
    dash.notify(Severity::Success, "one").await;
    dash.notify(Severity::Error, "two").await;

    let ui = dash.shared();
    let ui = ui.lock().await;
    let container = ui.notifier.container().unwrap();
    assert_eq!(ui.document.by_id("toastContainer"), Some(container));
    assert_eq!(ui.document.by_class("toast-notification").len(), 2);
}

#[tokio::test]
async fn page_double_dismiss_is_harmless() {
    let dash = dashboard(&closed_base_url(), &[]);
    dash.load_page(&dashboard_page()).await;
    dash.notify(Severity::Success, "done").await;

    let ui = dash.shared();
    let mut guard = ui.lock().await;
    let state = &mut *guard;
    let id = state.notifier.history().next().unwrap().id;
    assert!(state.notifier.dismiss(&mut state.document, id));
    assert!(!state.notifier.dismiss(&mut state.document, id));
    drop(guard);

    // The scheduled dismissal still fires and finds nothing to do.
    assert_eq!(dash.advance(Duration::from_secs(5)).await, 2);
    let ui = ui.lock().await;
    assert_eq!(ui.notifier.get(id).map(|t| t.phase), Some(ToastPhase::Removed));
}

#[tokio::test]
async fn page_reload_rebinds_without_duplicates() {
    let dash = dashboard(&closed_base_url(), &[]);
    dash.load_page(&dashboard_page()).await;
    let first = dash.shared().lock().await.registry.len();
    assert!(first > 0);

    dash.notify(Severity::Info, "stale").await;
    dash.load_page(&dashboard_page()).await;

    let ui = dash.shared();
    let mut ui = ui.lock().await;
    assert_eq!(ui.registry.len(), first);
    let state = &mut *ui;
    assert_eq!(state.registry.bind_document(&state.document), 0);
    assert_eq!(state.notifier.history().count(), 0);
    assert_eq!(state.scheduler.pending(), 0);
    assert_eq!(state.charts.len(), 3);
}

#[tokio::test]
async fn page_events_bubble_to_bound_ancestor() {
    let dash = dashboard(&closed_base_url(), &[]);
    dash.load_page(&dashboard_page()).await;

    // The check icon sits inside the mark-paid button.
    let icon = dash.select(".fa-check:0").await.unwrap();
    let button = dash.select(".mark-paid-btn:0").await.unwrap();
    let ui = dash.shared();
    let ui = ui.lock().await;
    let (node, _) = ui
        .registry
        .resolve(&ui.document, icon, TriggerEvent::Click)
        .unwrap();
    assert_eq!(node, button);
}

#[tokio::test]
async fn page_unbound_target_is_ignored() {
    let dash = dashboard(&closed_base_url(), &[]);
    dash.load_page(&dashboard_page()).await;

    let canvas = dash.select("#trendChart").await.unwrap();
    assert!(dash.dispatch(canvas, TriggerEvent::Click).await.is_none());

    // Buttons do not answer submit events.
    let button = dash.select(".mark-paid-btn:0").await.unwrap();
    assert!(dash.dispatch(button, TriggerEvent::Submit).await.is_none());
}

#[tokio::test]
async fn page_new_goal_button_opens_empty_modal() {
    let dash = dashboard(&closed_base_url(), &[]);
    dash.load_page(&dashboard_page()).await;
    let opener = dash.select(".new-goal-btn").await.unwrap();

    let outcome = dash.dispatch(opener, TriggerEvent::Click).await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Completed));

    let ui = dash.shared();
    let ui = ui.lock().await;
    let modal = ui.document.by_id("addSavingsGoalModal").unwrap();
    assert!(ui.document.has_class(modal, "show"));
    assert_eq!(ui.notifier.history().count(), 0);
}
