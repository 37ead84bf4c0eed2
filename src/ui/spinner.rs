use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Activity indicator shown while the engine runs. Drawn on stderr, so it is
/// hidden only when stderr is not a terminal.
pub struct Spinner {
    pb: ProgressBar,
}

fn draws_to_terminal() -> bool {
    atty::is(atty::Stream::Stderr)
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if draws_to_terminal() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };

        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"])
            .template("{spinner} {wide_msg} {elapsed}")
        {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        pb.set_message(message.to_string());

        Self { pb }
    }

    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_follows_stderr() {
        let spinner = Spinner::new("Running fio...");
        assert_eq!(spinner.pb.is_hidden(), !draws_to_terminal());
        assert_eq!(draws_to_terminal(), atty::is(atty::Stream::Stderr));
        spinner.clear();
        assert!(spinner.pb.is_finished());
    }
}
