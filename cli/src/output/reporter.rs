//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use std::cell::RefCell;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// On a TTY each step shows a spinner until it succeeds; otherwise
/// - `step()` prints `"  → {message}"`
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ! {message}"`
///
/// All of them, and `output()`, are suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    active: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            active: RefCell::new(None),
        }
    }

    /// Stop the running spinner, leaving its line on screen.
    pub fn abandon(&self) {
        if let Some(pb) = self.active.borrow_mut().take() {
            pb.abandon();
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        let mut active = self.active.borrow_mut();
        if let Some(prev) = active.take() {
            let msg = prev.message();
            progress::finish_ok(&prev, &msg);
        }
        if self.ctx.show_progress() {
            *active = Some(progress::spinner(message));
        } else {
            println!("  {} {message}", "→".style(self.ctx.styles.step));
        }
    }

    fn success(&self, message: &str) {
        match self.active.borrow_mut().take() {
            Some(pb) => progress::finish_ok(&pb, message),
            None => self.ctx.success(message),
        }
    }

    fn warn(&self, message: &str) {
        match self.active.borrow_mut().take() {
            Some(pb) => progress::finish_warn(&pb, message),
            None => {
                if !self.ctx.quiet {
                    println!("  {} {message}", "!".style(self.ctx.styles.warning));
                }
            }
        }
    }

    fn output(&self, text: &str) {
        match self.active.borrow().as_ref() {
            Some(pb) => pb.suspend(|| self.ctx.block(text)),
            None => self.ctx.block(text),
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        self.abandon();
    }
}
