//! Progress reporting for batch runs

use casegen_application::{ProgressNotifier, TurnObserver};
use casegen_domain::{BatchResult, Message, MessageKind, TerminationReason};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Progress bar over the batch; the message line follows the latest turn.
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn batch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock()
            && let Some(bar) = guard.as_ref()
        {
            f(bar);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_batch_start(&self, total_tasks: usize) {
        let bar = ProgressBar::new(total_tasks as u64);
        bar.set_style(Self::batch_style());
        bar.set_prefix("Requirements");
        bar.set_message("Starting...");
        bar.enable_steady_tick(std::time::Duration::from_millis(120));

        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_task_complete(&self, _index: usize, requirement_id: &str, success: bool) {
        self.with_bar(|bar| {
            let status = if success {
                format!("{} {}", "v".green(), requirement_id)
            } else {
                format!("{} {}", "x".red(), requirement_id)
            };
            bar.println(format!("  {status}"));
            bar.inc(1);
        });
    }

    fn on_batch_complete(&self, result: &BatchResult) {
        if let Ok(mut guard) = self.bar.lock()
            && let Some(bar) = guard.take()
        {
            bar.finish_with_message(format!(
                "{} ({} generated)",
                "done".green(),
                result.history.len()
            ));
        }
    }
}

impl TurnObserver for ProgressReporter {
    fn on_message(&self, conversation: &str, index: usize, message: &Message) {
        if index == 0 {
            return;
        }
        let action = match message.kind {
            MessageKind::ToolCall => "querying knowledge graph",
            MessageKind::ToolResult => "got retrieval result",
            MessageKind::Terminal => "ended the conversation",
            MessageKind::Text => "spoke",
        };
        self.with_bar(|bar| {
            bar.set_message(format!("{conversation}: {} {action}", message.source));
        });
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_batch_start(&self, total_tasks: usize) {
        println!(
            "{} {} ({} requirements)",
            "->".cyan(),
            "Generating test cases".bold(),
            total_tasks
        );
    }

    fn on_task_complete(&self, _index: usize, requirement_id: &str, success: bool) {
        if success {
            println!("  {} {}", "v".green(), requirement_id);
        } else {
            println!("  {} {} (failed)", "x".red(), requirement_id);
        }
    }

    fn on_batch_complete(&self, _result: &BatchResult) {
        println!();
    }
}

impl TurnObserver for SimpleProgress {
    fn on_message(&self, _conversation: &str, _index: usize, _message: &Message) {}

    fn on_conversation_end(&self, conversation: &str, reason: TerminationReason, turns: usize) {
        if matches!(
            reason,
            TerminationReason::OrchestratorFailed | TerminationReason::Cancelled
        ) {
            println!("    {} {} after {} turns: {}", "!".yellow(), conversation, turns, reason);
        }
    }
}
