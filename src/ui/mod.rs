use std::fmt::{Display, Formatter};

use std::io::Write;
use std::time::Instant;

use std::sync::mpsc::{channel, Sender};
use std::thread::{JoinHandle, ThreadId};

use console::{pad_str_with, style, Alignment};

use crate::StopReason;

/// Struct to hold the UI
/// Particulary the receiver channel
pub struct UI {
    sender: UISender,
    handle: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct UISender {
    sender: Sender<UIMessage>,
}

impl UISender {
    /// Send typed UIMessage to internal channel.
    /// Messages are dropped if the UI is gone.
    pub fn send(&self, user_msg: UIUserMessage) {
        #[cfg(not(feature = "disable_ui"))]
        {
            let _ = self.sender.send(UIMessage {
                thread_id: std::thread::current().id(),
                message: user_msg,
            });
        }
    }
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}

impl UI {
    pub fn get_sender(&self) -> UISender {
        self.sender.clone()
    }

    /// UI that discards every message
    pub fn silent() -> Self {
        let (sender, _) = channel();
        Self {
            sender: UISender { sender },
            handle: None,
        }
    }

    pub fn new() -> Self {
        let (sender, receiver) = channel::<UIMessage>();

        #[cfg(feature = "disable_ui")]
        let handle = {
            drop(receiver);
            None
        };

        #[cfg(not(feature = "disable_ui"))]
        let handle = Some(std::thread::spawn(move || {
            let mut out = std::io::stdout();

            let start_time = Instant::now();

            let mut total_fix_time = 0.0;
            let mut total_generate_time = 0.0;
            let mut total_solve_time = 0.0;
            let mut iterations = 0_usize;

            // the loop ends on ExitUi or once every sender is gone
            while let Ok(UIMessage { thread_id, message }) = receiver.recv() {
                match message {
                    UIUserMessage::Log(msg) => {
                        let elapsed = start_time.elapsed().as_secs_f64();
                        let _ = writeln!(&mut out, "[{thread_id:?}] {elapsed:>6.2}  {msg}");
                    }
                    UIUserMessage::LogS(msg) => {
                        let elapsed = start_time.elapsed().as_secs_f64();
                        let _ = writeln!(&mut out, "[{thread_id:?}] {elapsed:>6.2}  {msg}");
                    }
                    UIUserMessage::StartSolve { rows, columns } => {
                        let title =
                            format!("Column generation with {rows} rows and {columns} columns");
                        let _ = writeln!(&mut out, "{}", style(title).green());
                    }
                    UIUserMessage::IterationFinish(state) => {
                        total_fix_time += finite_or_zero(state.fix_time);
                        total_generate_time += finite_or_zero(state.generate_time);
                        total_solve_time += finite_or_zero(state.solve_time);
                        iterations += 1;

                        if state.iteration % 100 == 1 {
                            let _ = writeln!(&mut out, "{}", style(IterationUIState::HEADER).dim());
                        }
                        let _ = writeln!(&mut out, "{state}");
                    }
                    UIUserMessage::Stopping(reason) => {
                        let stopping = style(format!("-- Stopping. {reason}")).yellow().bold();
                        let _ = writeln!(&mut out, "{stopping}");
                    }
                    UIUserMessage::ExitUi => {
                        let total = total_fix_time + total_generate_time + total_solve_time;
                        let heading = pad_str_with("Statistics", 30, Alignment::Center, None, '⎯');
                        let _ = writeln!(&mut out, "{heading}");
                        let elapsed = start_time.elapsed().as_secs_f64();
                        let _ = writeln!(&mut out, "iterations: {iterations} in {elapsed:>8.2}s");
                        let _ = writeln!(
                            &mut out,
                            "total_solve_time: {total_solve_time:>8.2}s / \
                             total_generate_time: {total_generate_time:>8.2}s / \
                             total_fix_time: {total_fix_time:>8.2}s"
                        );
                        if total > 0.0 {
                            let share = total_generate_time / total * 100.0;
                            let _ = writeln!(&mut out, "{share:>3.1}% spent in pricing vs master");
                        }
                        let _ = writeln!(&mut out, "{}", "⎯".repeat(30));
                        break;
                    }
                }
            }

            let _ = out.flush();
        }));

        Self {
            sender: UISender { sender },
            handle,
        }
    }

    /// Prints the statistics and waits for the output thread
    pub fn shutdown(mut self) {
        self.sender.send(UIUserMessage::ExitUi);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[derive(Clone)]
/// Holds all state updates that can influence the UI
pub enum UIUserMessage {
    LogS(&'static str),
    Log(String),
    StartSolve { rows: usize, columns: usize },
    IterationFinish(IterationUIState),
    Stopping(StopReason),
    ExitUi,
}

/// One row of the iteration table
#[derive(Clone, Debug)]
pub struct IterationUIState {
    pub iteration: usize,
    pub fractional_objective: f64,
    pub rounded_objective: f64,
    pub active_size: usize,
    pub active_size_change: i64,
    pub pool_size: usize,
    pub generated: usize,
    pub fixed: i64,
    pub fix_time: f64,
    pub generate_time: f64,
    pub solve_time: f64,
    pub cumulative_time: f64,
    pub fractional_percent: f64,
}

impl IterationUIState {
    const HEADER: &'static str = "   Iter |       Objective       |    Problem    |    Pool      | Fixed |          Time (fix gen solve cum.)          | Frac. |";
}

impl Display for IterationUIState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rounded = if self.rounded_objective.is_nan() {
            "n/a".to_string()
        } else {
            format!("{:.0}", self.rounded_objective)
        };
        let percent = if self.fractional_percent.is_nan() {
            "-".to_string()
        } else {
            format!("{:.0}%", self.fractional_percent)
        };
        write!(
            f,
            "{:>7} {:>11.4} {:>10} {:>8} {:>5} {:>8} {:>5} {:>6} {:>10.1e} {:>9.2e} {:>9.2e} {:>10.3e} {:>6}",
            self.iteration,
            self.fractional_objective,
            rounded,
            self.active_size,
            self.active_size_change,
            self.pool_size,
            self.generated,
            self.fixed,
            self.fix_time,
            self.generate_time,
            self.solve_time,
            self.cumulative_time,
            percent
        )
    }
}

#[derive(Clone)]
pub struct UIMessage {
    pub thread_id: ThreadId,
    pub message: UIUserMessage,
}
