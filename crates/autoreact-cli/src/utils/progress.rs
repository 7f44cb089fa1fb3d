use autoreact::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct SpinnerState {
    pb: ProgressBar,
    stage_started: Option<Instant>,
}

/// Renders one spinner per running stage; finished stages are printed above it.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<SpinnerState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::new_spinner()
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(target);
        pb.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(SpinnerState {
                pb,
                stage_started: None,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut guard) = state.lock() else {
                warn!("Progress state mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::StageStart { name, label } => {
                    guard.pb.reset();
                    guard.pb.set_style(Self::spinner_style());
                    guard
                        .pb
                        .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    guard.pb.set_message(format!("{} ({})", name, label));
                    guard.stage_started = Some(Instant::now());
                }
                Progress::StageFinish { name } => {
                    let elapsed = guard
                        .stage_started
                        .take()
                        .map(|t| t.elapsed())
                        .unwrap_or_default();
                    guard.pb.disable_steady_tick();
                    guard.pb.println(format!(
                        "✓ {} [{}]",
                        name,
                        crate::utils::timing::format_hms(elapsed)
                    ));
                    guard.pb.finish_with_message(format!("✓ {}", name));
                }
                Progress::Message(msg) => {
                    guard.pb.println(format!("  {}", msg));
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
