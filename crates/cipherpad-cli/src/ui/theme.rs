//! Badge tokens for status lines.

use owo_colors::OwoColorize;

/// Badge types for status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Ok,
    Warn,
    Err,
    Info,
}

impl Badge {
    /// Get badge with symbol for display.
    pub fn display(&self, unicode: bool) -> &'static str {
        match (self, unicode) {
            (Self::Ok, true) => "[\u{2713}]",   // [✓]
            (Self::Warn, true) => "[\u{26A0}]", // [⚠]
            (Self::Err, true) => "[\u{2717}]",  // [✗]
            (Self::Info, true) => "[\u{2139}]", // [ℹ]
            (Self::Ok, false) => "[OK]",
            (Self::Warn, false) => "[WARN]",
            (Self::Err, false) => "[ERR]",
            (Self::Info, false) => "[INFO]",
        }
    }

    /// Badge text, colored when `color` is set.
    pub fn paint(&self, unicode: bool, color: bool) -> String {
        let text = self.display(unicode);
        if !color {
            return text.to_string();
        }
        match self {
            Self::Ok => text.green().to_string(),
            Self::Warn => text.yellow().to_string(),
            Self::Err => text.red().to_string(),
            Self::Info => text.cyan().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_badges_have_no_escape_codes() {
        for badge in [Badge::Ok, Badge::Warn, Badge::Err, Badge::Info] {
            assert!(!badge.paint(false, false).contains('\u{1b}'));
        }
        assert_eq!(Badge::Warn.paint(false, false), "[WARN]");
    }

    #[test]
    fn test_colored_badge_wraps_text() {
        let painted = Badge::Ok.paint(false, true);
        assert!(painted.contains("[OK]"));
        assert!(painted.contains('\u{1b}'));
    }
}
