//! Line-editor helper: slash-command completion and input styling

use super::commands::COMMANDS;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper, Result as RustylineResult};
use std::borrow::Cow;

const INPUT_BACKGROUND: &str = "\x1b[48;5;236m";

#[derive(Clone, Copy, Debug, Default)]
pub struct InputStyleHelper;

impl InputStyleHelper {
    /// Commands starting with the word under the cursor, if it is the first word.
    fn candidates(line: &str, pos: usize) -> Vec<&'static str> {
        let head = &line[..pos];
        if !head.starts_with('/') || head.contains(char::is_whitespace) {
            return Vec::new();
        }
        COMMANDS
            .iter()
            .copied()
            .filter(|command| command.starts_with(head))
            .collect()
    }
}

impl Completer for InputStyleHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> RustylineResult<(usize, Vec<Self::Candidate>)> {
        let pairs = Self::candidates(line, pos)
            .into_iter()
            .map(|command| Pair {
                display: command.to_string(),
                replacement: format!("{} ", command),
            })
            .collect();
        Ok((0, pairs))
    }
}

impl Hinter for InputStyleHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for InputStyleHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Cow::Owned(format!("{}\x1b[2K{}", INPUT_BACKGROUND, prompt))
    }

    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.is_empty() {
            return Cow::Borrowed(line);
        }

        let mut styled = String::with_capacity(line.len() + 16);
        styled.push_str(INPUT_BACKGROUND);
        styled.push_str(&line.replace(
            '\n',
            &format!("\x1b[0K\r\n{}\x1b[2K", INPUT_BACKGROUND),
        ));
        styled.push_str("\x1b[0K");
        Cow::Owned(styled)
    }
}

impl Validator for InputStyleHelper {
    fn validate(&self, _ctx: &mut ValidationContext<'_>) -> RustylineResult<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

impl Helper for InputStyleHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    mod completion_tests {
        use super::*;

        #[test]
        fn completes_prefix() {
            let candidates = InputStyleHelper::candidates("/po", 3);
            assert_eq!(candidates, vec!["/policies", "/policy"]);
        }

        #[test]
        fn bare_slash_offers_everything() {
            assert_eq!(InputStyleHelper::candidates("/", 1).len(), COMMANDS.len());
        }

        #[test]
        fn no_completion_after_first_word() {
            assert!(InputStyleHelper::candidates("/call read", 10).is_empty());
        }

        #[test]
        fn no_completion_for_replies() {
            assert!(InputStyleHelper::candidates("yes", 3).is_empty());
        }
    }

    mod highlighter_tests {
        use super::*;

        #[test]
        fn highlight_prompt_adds_background() {
            let result = InputStyleHelper.highlight_prompt("> ", false);
            assert!(result.starts_with("\x1b[48;5;236m\x1b[2K"));
            assert!(result.ends_with("> "));
        }

        #[test]
        fn highlight_empty_line_returns_borrowed() {
            let result = InputStyleHelper.highlight("", 0);
            assert!(matches!(result, Cow::Borrowed("")));
        }

        #[test]
        fn highlight_multiline_restyles_each_line() {
            let result = InputStyleHelper.highlight("a\nb", 0);
            assert_eq!(result.matches(INPUT_BACKGROUND).count(), 2);
            assert!(result.ends_with("\x1b[0K"));
        }
    }
}
