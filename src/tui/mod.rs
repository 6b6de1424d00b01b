//! Terminal User Interface for DataQuest.
//!
//! Provides the main TUI application loop using ratatui and crossterm.

pub mod app;
mod events;
pub mod headless;
pub mod text;
mod ui;
pub mod widgets;

pub use app::{App, AppAction, Focus};
pub use events::{Event, EventHandler};
pub use ui::render;

use crate::backend::QueryBackend;
use crate::config::Config;
use crate::error::{DataQuestError, Result};
use crate::workflow::{CallOutcome, PendingCall};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
    /// Cancels in-flight calls and the input reader on quit.
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new(event_handler: EventHandler) -> Result<Self> {
        let terminal = Self::setup_terminal()?;

        Ok(Self {
            terminal,
            event_handler,
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| DataQuestError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|e| {
            DataQuestError::internal(format!("Failed to enter alternate screen: {e}"))
        })?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)
            .map_err(|e| DataQuestError::internal(format!("Failed to create terminal: {e}")))?;

        Ok(terminal)
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| DataQuestError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen).map_err(|e| {
            DataQuestError::internal(format!("Failed to leave alternate screen: {e}"))
        })?;

        self.terminal
            .show_cursor()
            .map_err(|e| DataQuestError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    /// Runs the main event loop until the user quits.
    pub async fn run(&mut self, app: &mut App, backend: Arc<dyn QueryBackend>) -> Result<()> {
        // Set up panic hook to restore terminal on panic
        let original_hook = panic::take_hook();
        let cancel = self.cancel.clone();
        panic::set_hook(Box::new(move |panic_info| {
            cancel.cancel();
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let (outcome_tx, mut outcome_rx) = mpsc::channel::<CallOutcome>(16);
        let mut input_rx = self.spawn_input_reader();

        let result = self
            .run_event_loop(app, &backend, outcome_tx, &mut input_rx, &mut outcome_rx)
            .await;

        // Cleanup: cancel in-flight calls and wait for tasks to finish
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        info!("All background tasks stopped");

        // Restore panic hook
        let _ = panic::take_hook();

        result
    }

    /// Polls the terminal on a blocking task and forwards events.
    fn spawn_input_reader(&self) -> mpsc::Receiver<Result<Event>> {
        let (tx, rx) = mpsc::channel(32);
        let handler = self.event_handler;
        let cancel = self.cancel.clone();

        self.tasks.spawn_blocking(move || {
            while !cancel.is_cancelled() {
                let event = handler.next();
                let failed = event.is_err();
                if tx.blocking_send(event).is_err() || failed {
                    break;
                }
            }
        });

        rx
    }

    /// The main event loop, separated for cleaner error handling.
    async fn run_event_loop(
        &mut self,
        app: &mut App,
        backend: &Arc<dyn QueryBackend>,
        outcome_tx: mpsc::Sender<CallOutcome>,
        input_rx: &mut mpsc::Receiver<Result<Event>>,
        outcome_rx: &mut mpsc::Receiver<CallOutcome>,
    ) -> Result<()> {
        loop {
            self.terminal
                .draw(|frame| ui::render(frame, app))
                .map_err(|e| DataQuestError::internal(format!("Failed to draw: {e}")))?;

            if !app.running {
                break;
            }

            tokio::select! {
                event = input_rx.recv() => {
                    let Some(event) = event else {
                        return Err(DataQuestError::internal("Terminal input closed"));
                    };
                    match app.handle_event(event?) {
                        AppAction::Dispatch(call) => {
                            self.dispatch(call, backend, outcome_tx.clone());
                        }
                        AppAction::Quit => info!("Quit requested"),
                        AppAction::None => {}
                    }
                }

                Some(outcome) = outcome_rx.recv() => {
                    app.apply_outcome(outcome);
                }
            }
        }

        Ok(())
    }

    /// Runs a backend call on its own task and reports the outcome.
    fn dispatch(
        &self,
        call: PendingCall,
        backend: &Arc<dyn QueryBackend>,
        tx: mpsc::Sender<CallOutcome>,
    ) {
        let backend = Arc::clone(backend);
        let cancel = self.cancel.clone();
        let ticket = call.ticket;

        self.tasks.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Call {} cancelled", ticket);
                }
                outcome = call.run(backend.as_ref()) => {
                    if tx.send(outcome).await.is_err() {
                        warn!("Dropping outcome of call {}: UI has shut down", ticket);
                    }
                }
            }
        });
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Runs the TUI application against `backend`.
pub async fn run(config: &Config, backend: Arc<dyn QueryBackend>) -> Result<()> {
    let event_handler =
        EventHandler::with_tick_rate(Duration::from_millis(config.ui.tick_rate_ms));
    let mut app = App::new(backend.describe());

    let mut tui = Tui::new(event_handler)?;
    tui.run(&mut app, backend).await
}
