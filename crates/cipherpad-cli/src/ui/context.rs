//! UI context for environment detection and configuration.

use std::io::IsTerminal;

/// Terminal and environment context for UI decisions.
#[derive(Debug, Clone)]
pub struct UiContext {
    /// Whether color output is enabled
    pub color: bool,
    /// Whether unicode symbols are enabled
    pub unicode: bool,
    /// Whether stdin is a terminal the user can answer prompts on
    pub interactive: bool,
    /// Whether stderr is a terminal (spinners draw there)
    pub stderr_tty: bool,
    pub quiet: bool,
}

impl UiContext {
    /// Create context from environment and CLI flags.
    pub fn from_env(quiet: bool, no_color_flag: bool) -> Self {
        let stderr_tty = std::io::stderr().is_terminal();
        let term_is_dumb = std::env::var("TERM").map(|v| v == "dumb").unwrap_or(false);
        let no_color_env = std::env::var("NO_COLOR").is_ok();

        // Resolve color: disabled if NO_COLOR env, --no-color flag, or TERM=dumb
        let color = stderr_tty && !no_color_flag && !no_color_env && !term_is_dumb;

        Self {
            color,
            unicode: !term_is_dumb,
            interactive: std::io::stdin().is_terminal(),
            stderr_tty,
            quiet,
        }
    }

    /// Check if animations (spinners) are allowed.
    pub fn allows_animation(&self) -> bool {
        self.stderr_tty && !self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_flag_disables_color() {
        let ctx = UiContext::from_env(false, true);
        assert!(!ctx.color);
    }

    #[test]
    fn test_quiet_disables_animation() {
        let ctx = UiContext::from_env(true, false);
        assert!(!ctx.allows_animation());
    }
}
