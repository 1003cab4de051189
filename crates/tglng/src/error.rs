//! Error handling.
//!
//! TglNG has two error channels. Parse errors are reported at the point of
//! detection through [Interpreter::error](crate::interp::Interpreter::error),
//! which renders a caret diagnostic, and then propagate as
//! [ParseResult::Error](crate::parse_result::ParseResult::Error). Evaluation
//! errors are values of [EvalError] and propagate with `?` up to the driver,
//! which prints each once. There is no unwinding for user-visible errors.

use colored::Colorize;

/// An error produced while evaluating a command tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    message: String,
}

impl EvalError {
    pub fn new<T: Into<String>>(message: T) -> EvalError {
        EvalError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Shorthand for the result type returned by every evaluation.
pub type EvalResult = Result<String, EvalError>;

/// Renders a parse diagnostic: the message, a window of up to 16 characters
/// of context on either side of the error position with whitespace
/// flattened to plain spaces, and a caret marking the exact column.
pub fn render_diagnostic(why: &str, text: &[char], offset: usize) -> String {
    let context_start = offset.saturating_sub(16);
    let context_end = (offset + 16).min(text.len());
    let context: String = text[context_start..context_end]
        .iter()
        .map(|&c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    let caret_col = offset - context_start;
    format!(
        "{} {}\n  {}\n  {}{}",
        "tglng: error:".red().bold(),
        why,
        context,
        " ".repeat(caret_col),
        "^".bold(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn caret_lands_on_offset() {
        colored::control::set_override(false);
        let text = chars("abc def");
        let rendered = render_diagnostic("boom", &text, 4);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "  abc def");
        assert_eq!(lines[2], "      ^");
    }

    #[test]
    fn window_is_clipped_and_whitespace_flattened() {
        colored::control::set_override(false);
        let text = chars("aaaaaaaaaaaaaaaaaaaaaaaa\tbbbbbbbbbbbbbbbbbbbbbbbb");
        let rendered = render_diagnostic("boom", &text, 24);
        let lines: Vec<&str> = rendered.lines().collect();
        // 16 characters either side, tab shown as a space.
        assert_eq!(lines[1], "  aaaaaaaaaaaaaaaa bbbbbbbbbbbbbbb");
        assert_eq!(lines[2], "                  ^");
    }

    #[test]
    fn offset_at_end_of_input() {
        colored::control::set_override(false);
        let text = chars("ab");
        let rendered = render_diagnostic("boom", &text, 2);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "  ab");
        assert_eq!(lines[2], "    ^");
    }
}
