use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Subcommand;
use focos_core::session::{format_hms, hours_to_secs, strict_encouragement};
use focos_core::{
    BlockOperation, Config, HostsBlockManager, Mode, Notification, Notifier, NotifyError, NormalConfig, Phase,
    PomodoroConfig, SessionConfig, SessionController, SessionError, SessionEvent, Silent,
    StrictConfig, StrictLock,
};

#[derive(Subcommand)]
pub enum SessionMode {
    /// Block for a fixed time; Ctrl-C stops early
    Normal {
        /// Duration in hours (0.1 - 24)
        #[arg(long, default_value_t = 1.0)]
        hours: f64,
        /// Sites to block
        #[arg(required = true)]
        sites: Vec<String>,
    },
    /// Alternate blocked focus phases with unblocked breaks
    Pomodoro {
        /// Focus minutes per cycle (1 - 60)
        #[arg(long, default_value_t = 25)]
        focus: u32,
        /// Break minutes per cycle (1 - 30)
        #[arg(long = "break", default_value_t = 5)]
        break_minutes: u32,
        /// Number of focus cycles (1 - 10)
        #[arg(long, default_value_t = 4)]
        cycles: u32,
        /// Sites to block
        #[arg(required = true)]
        sites: Vec<String>,
    },
    /// Block for a fixed time with no way to stop early
    Strict {
        /// Duration in hours (0.5 - 24)
        #[arg(long, default_value_t = 1.0)]
        hours: f64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
        /// Sites to block
        #[arg(required = true)]
        sites: Vec<String>,
    },
}

impl SessionMode {
    fn into_parts(self) -> (SessionConfig, Vec<String>, bool) {
        match self {
            SessionMode::Normal { hours, sites } => (
                SessionConfig::Normal(NormalConfig {
                    duration_hours: hours,
                }),
                sites,
                false,
            ),
            SessionMode::Pomodoro {
                focus,
                break_minutes,
                cycles,
                sites,
            } => (
                SessionConfig::Pomodoro(PomodoroConfig {
                    focus_minutes: focus,
                    break_minutes,
                    cycles,
                }),
                sites,
                false,
            ),
            SessionMode::Strict { hours, yes, sites } => (
                SessionConfig::Strict(StrictConfig {
                    duration_hours: hours,
                }),
                sites,
                yes,
            ),
        }
    }
}

/// Prints notifications on their own line and rings the terminal bell.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut out = io::stdout().lock();
        writeln!(out, "\x07\n{}: {}", notification.title, notification.body)
            .map_err(|e| NotifyError(e.to_string()))
    }
}

pub async fn run(mode: SessionMode) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let (session_config, sites, assume_yes) = mode.into_parts();
    if let Some(lock) = StrictLock::active()? {
        tracing::warn!(pid = lock.pid, until = %lock.until, "session refused during strict session");
        return Err(SessionError::AlreadyRunning(Mode::Strict).into());
    }

    let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
        Arc::new(ConsoleNotifier)
    } else {
        Arc::new(Silent)
    };
    let blocker = Arc::new(HostsBlockManager::from_config(&config.hosts));
    let mut controller = SessionController::new(blocker, notifier);
    for site in &sites {
        if !controller.add_site(site)? {
            tracing::debug!(site = %site, "duplicate site ignored");
        }
    }

    let events = controller.start(session_config).await?;
    render(&events);

    if session_config.mode() == Mode::Strict {
        if !assume_yes && !confirm_strict(&controller)? {
            render(&controller.cancel()?);
            return Ok(());
        }
        render(&controller.confirm().await?);
    }
    // Released when this function returns, however the loop ends.
    let _strict_lock = match controller.snapshot() {
        Some(snapshot) if snapshot.locked => {
            let remaining = snapshot.remaining_secs.unwrap_or_default();
            let lock = StrictLock::new(remaining, controller.block_list().domains().to_vec());
            match lock.hold() {
                Ok(held) => Some(held),
                Err(e) => {
                    // The block is already applied; keep counting down.
                    tracing::warn!(error = %e, "strict lock not written; other focos commands are not locked out");
                    None
                }
            }
        }
        _ => None,
    };

    loop {
        tokio::select! {
            due = controller.wait_for_tick() => {
                if !due {
                    break;
                }
                let events = controller.tick().await;
                render(&events);
                if let Some(snapshot) = controller.snapshot() {
                    if snapshot.mode == Mode::Strict {
                        if let Some(remaining) = snapshot.remaining_secs {
                            print!("  {}", strict_encouragement(remaining));
                            flush();
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                match controller.stop().await {
                    Ok(events) => {
                        render(&events);
                        break;
                    }
                    Err(SessionError::StrictLocked) => {
                        eprintln!("\nstrict mode: the session cannot be stopped until it ends");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
    Ok(())
}

fn confirm_strict(controller: &SessionController) -> Result<bool, Box<dyn std::error::Error>> {
    let secs = match controller.session().map(|s| *s.config()) {
        Some(SessionConfig::Strict(c)) => hours_to_secs(c.duration_hours),
        _ => return Ok(false),
    };

    print!(
        "Strict mode blocks {} site(s) for {}. It cannot be stopped or changed until it ends.\nStart? [y/N] ",
        controller.block_list().len(),
        format_hms(Some(secs)),
    );
    flush();

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn render(events: &[SessionEvent]) {
    for event in events {
        match event {
            SessionEvent::SessionStarted {
                mode,
                phase,
                duration_secs,
                ..
            } => println!("{mode} session started: {} for {}", label(*phase), format_hms(Some(*duration_secs))),
            SessionEvent::ConfirmationRequested { .. } => {}
            SessionEvent::ConfirmationCancelled { .. } => println!("strict session cancelled, nothing was blocked"),
            SessionEvent::Tick {
                phase,
                remaining_secs,
                ..
            } => {
                print!("\r{:>10} {}", label(*phase), format_hms(Some(*remaining_secs)));
                flush();
            }
            SessionEvent::PhaseChanged {
                to,
                cycle_index,
                duration_secs,
                ..
            } => println!(
                "\ncycle {cycle_index}: {} for {}",
                label(*to),
                format_hms(Some(*duration_secs))
            ),
            SessionEvent::SessionCompleted { mode, .. } => println!("\n{mode} session complete, sites unblocked"),
            SessionEvent::SessionStopped { mode, .. } => println!("\n{mode} session stopped, sites unblocked"),
            SessionEvent::BlockFailed {
                operation, error, ..
            } => {
                let verb = match operation {
                    BlockOperation::Apply => "apply",
                    BlockOperation::Clear => "clear",
                };
                eprintln!("\nwarning: could not {verb} the block: {error}");
            }
        }
    }
}

fn label(phase: Phase) -> &'static str {
    match phase {
        Phase::Focusing => "focus",
        Phase::Breaking => "break",
        Phase::Active => "blocking",
        Phase::PendingConfirmation => "waiting",
        Phase::Idle => "idle",
    }
}

fn flush() {
    let _ = io::stdout().flush();
}
