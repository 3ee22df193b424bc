use std::fmt;

use quiz_core::model::OptionKey;

/// One line typed by the student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Select(OptionKey),
    Hint,
    Back,
    Next,
    Retry,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownInput(pub String);

impl fmt::Display for UnknownInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown command `{}` (a-d, hint, back, next, retry, quit)",
            self.0
        )
    }
}

impl std::error::Error for UnknownInput {}

/// Parse a command line. Blank input yields `None`.
///
/// # Errors
///
/// Returns `UnknownInput` for anything that is not a command.
pub fn parse(line: &str) -> Result<Option<Input>, UnknownInput> {
    let word = line.trim();
    if word.is_empty() {
        return Ok(None);
    }
    let input = match word.to_ascii_lowercase().as_str() {
        "hint" | "h" => Input::Hint,
        "back" => Input::Back,
        "next" | "n" => Input::Next,
        "retry" | "r" => Input::Retry,
        "quit" | "q" | "exit" => Input::Quit,
        other => other
            .to_ascii_uppercase()
            .parse::<OptionKey>()
            .map(Input::Select)
            .map_err(|_| UnknownInput(word.to_owned()))?,
    };
    Ok(Some(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_letters_are_case_insensitive() {
        assert_eq!(parse("a"), Ok(Some(Input::Select(OptionKey::A))));
        assert_eq!(parse(" D \n"), Ok(Some(Input::Select(OptionKey::D))));
    }

    #[test]
    fn commands_and_blank_lines() {
        assert_eq!(parse("HINT"), Ok(Some(Input::Hint)));
        assert_eq!(parse("q"), Ok(Some(Input::Quit)));
        assert_eq!(parse("   "), Ok(None));
        assert_eq!(parse("e"), Err(UnknownInput("e".into())));
    }
}
