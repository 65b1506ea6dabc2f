//! A [`ChatView`] printing to the terminal.

use std::io;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use parley_core::{Role, StepEvent, StepSink};

use crate::session::ChatView;
use crate::transcript::Turn;

const BAR_CHAR: &str = "▎";
const MAX_OBSERVATION_CHARS: usize = 200;

/// Prints turns with a role marker and shows agent steps on a spinner.
pub struct TerminalView {
    style: ProgressStyle,
    live: Option<LiveSteps>,
}

impl TerminalView {
    /// Creates a terminal view.
    pub fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        Self { style, live: None }
    }

    /// Prints an error in place of an answer.
    pub fn show_error(&self, err: &dyn std::error::Error) {
        println!("{}⚠️  {}", BAR_CHAR.bright_red(), err.bright_red());
    }
}

impl Default for TerminalView {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView for TerminalView {
    fn show_turn(&mut self, turn: &Turn) {
        match turn.role {
            Role::User => {
                println!("{}🧑 {}", BAR_CHAR.bright_green(), turn.content)
            }
            Role::Assistant => println!(
                "{}🤖 {}",
                BAR_CHAR.bright_cyan(),
                turn.content.bright_white()
            ),
        }
    }

    fn live_steps(&mut self) -> &dyn StepSink {
        let bar = ProgressBar::new_spinner();
        bar.set_style(self.style.clone());
        bar.enable_steady_tick(Duration::from_millis(100));
        &*self.live.insert(LiveSteps { bar })
    }

    fn finish_steps(&mut self) {
        if let Some(live) = self.live.take() {
            live.bar.finish_and_clear();
        }
    }
}

struct LiveSteps {
    bar: ProgressBar,
}

impl StepSink for LiveSteps {
    fn on_step(&self, event: &StepEvent) -> io::Result<()> {
        if self.bar.is_finished() {
            return Err(io::Error::other("live region is closed"));
        }
        match event {
            StepEvent::Thinking => self.bar.set_message("🤔 Thinking..."),
            StepEvent::Token(_) => self.bar.set_message("✍️  Writing..."),
            StepEvent::ToolStarted { name, input } => {
                self.bar.set_message(format!("🔧 Running {name}..."));
                self.bar.println(format!(
                    "{}🔧 {} {}",
                    BAR_CHAR.bright_yellow(),
                    name.bold(),
                    input.dimmed()
                ));
            }
            StepEvent::ToolFinished { name, output } => {
                self.bar.println(format!(
                    "{}📄 {} {}",
                    BAR_CHAR.bright_yellow(),
                    name.bold(),
                    excerpt(output).dimmed()
                ));
            }
            StepEvent::ToolFailed { name, reason } => {
                self.bar.println(format!(
                    "{}❌ {} {}",
                    BAR_CHAR.bright_red(),
                    name.bold(),
                    reason.red()
                ));
            }
            StepEvent::Finished => self.bar.set_message("✅ Done"),
        }
        Ok(())
    }
}

fn excerpt(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= MAX_OBSERVATION_CHARS && !text.contains('\n') {
        return line.to_owned();
    }
    let mut excerpt: String =
        line.chars().take(MAX_OBSERVATION_CHARS).collect();
    excerpt.push('…');
    excerpt
}
