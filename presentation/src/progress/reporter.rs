//! Per-agent spinners driven by status changes

use colored::Colorize;
use crew_domain::{AgentId, AgentStatus};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

/// Shows one spinner for each agent that is thinking or working.
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<AgentId, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// A reporter that tracks spinners without drawing anything.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    pub fn on_status(&self, agent_id: &AgentId, status: AgentStatus) {
        let mut bars = self.bars.lock().unwrap_or_else(|e| e.into_inner());

        if status.is_busy() {
            let bar = bars.entry(agent_id.clone()).or_insert_with(|| {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.set_prefix(agent_id.to_string());
                pb.enable_steady_tick(TICK);
                pb
            });
            bar.set_message(format!("{}...", status.as_str()));
        } else if let Some(bar) = bars.remove(agent_id) {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
    }

    /// Number of agents with a live spinner.
    pub fn active(&self) -> usize {
        self.bars.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Print a line above the spinners.
    pub fn println(&self, line: &str) {
        if self.multi.is_hidden() {
            println!("{}", line);
        } else if self.multi.println(line).is_err() {
            println!("{}", line);
        }
    }

    /// Drop every spinner, e.g. when an agent is stopped mid-call.
    pub fn clear(&self) {
        let mut bars = self.bars.lock().unwrap_or_else(|e| e.into_inner());
        for (agent_id, bar) in bars.drain() {
            bar.abandon_with_message(format!("{} {}", "stopped".dimmed(), agent_id));
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
