mod render;
mod state;

use chrono::Utc;
use state::AppState;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut app_state = AppState::initialize().await?;
    tracing::info!(
        config = %app_state.config_manager.config_path().display(),
        "configuration loaded"
    );
    if let Some(label_id) = std::env::args().nth(1) {
        app_state.coordinator.select_label(label_id);
    }

    run_view_loop(app_state).await;
    Ok(())
}

/// Re-renders whenever a cell settles, the loading count changes or the
/// refresh interval elapses, printing each frame that differs from the last.
async fn run_view_loop(app_state: AppState) {
    let AppState {
        config,
        host,
        tracker,
        mut coordinator,
        ..
    } = app_state;

    let mut outstanding = tracker.subscribe();
    tokio::spawn(tracker.run());
    let mut updates = host.updates();

    let mut refresh = interval(Duration::from_secs(config.ui.refresh_interval_secs));
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    refresh.tick().await;

    let mut last_frame = String::new();
    loop {
        let view = coordinator.render(Utc::now());
        let busy = *outstanding.borrow_and_update();
        let frame = render::render_app(&view, busy);
        if frame != last_frame {
            println!("{frame}\n");
            last_frame = frame;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = outstanding.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = refresh.tick() => {
                tracing::debug!("refreshing thread list");
                coordinator.refresh();
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }
}
