use clap::Parser;
use dashboard_sync::config::{Cli, Commands, resolve_settings};
use dashboard_sync::errors::AppError;
use dashboard_sync::prompt::{Prompt, ScriptedPrompt, StdinPrompt};
use dashboard_sync::{ActionOutcome, Dashboard, PageSnapshot, RemoteActionClient, TriggerEvent, load_preferences};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli);

    let snapshot = read_page(&cli.page).await?;
    let prefs = load_preferences(&settings.prefs_path).await;
    let prompt: Box<dyn Prompt> = if cli.answers.is_empty() {
        Box::new(StdinPrompt)
    } else {
        Box::new(ScriptedPrompt::new(cli.answers.iter().cloned().map(Some)))
    };

    let client = RemoteActionClient::new(&settings.base_url)?;
    info!("using dashboard at {}", client.base_url());
    let dashboard = Dashboard::new(client, prompt, prefs, Some(settings.prefs_path.clone()));
    dashboard.load_page(&snapshot).await;

    let outcome = match &cli.command {
        Commands::Click { selector } => Some(fire(&dashboard, selector, TriggerEvent::Click).await?),
        Commands::Submit { selector } => Some(fire(&dashboard, selector, TriggerEvent::Submit).await?),
        Commands::ToggleTheme => {
            dashboard.toggle_theme().await;
            None
        }
        Commands::Show => None,
    };

    dashboard.run_timers().await;
    let report = dashboard.report().await;

    if let Some(out) = &cli.out {
        let next = PageSnapshot {
            body: report.body.clone(),
            chart_data: snapshot.chart_data.clone(),
        };
        fs::write(out, serde_json::to_vec_pretty(&next)?).await?;
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(ActionOutcome::Failed(err)) = outcome {
        warn!("action failed: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn read_page(path: &Path) -> Result<PageSnapshot, AppError> {
    let display = path.display().to_string();
    let bytes = fs::read(path).await.map_err(|source| AppError::PageRead {
        path: display.clone(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| AppError::PageParse { path: display, source })
}

async fn fire(dashboard: &Dashboard, selector: &str, event: TriggerEvent) -> Result<ActionOutcome, AppError> {
    let node = dashboard
        .select(selector)
        .await
        .ok_or_else(|| AppError::NoSuchElement(selector.to_string()))?;
    let outcome = dashboard
        .dispatch(node, event)
        .await
        .ok_or_else(|| AppError::NoSuchElement(format!("{selector} (no {event:?} handler)")))?;
    info!("outcome: {outcome:?}");
    Ok(outcome)
}
