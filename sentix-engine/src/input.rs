//! Input text admission rules.
//!
//! A text is analysable when it has at least one alphabetic character and
//! none of the characters that break the prompt envelope.

use crate::error::{InputError, TextSubject};

/// Characters rejected in any input text.
pub const FORBIDDEN_CHARS: [char; 3] = ['.', '\'', '"'];

/// Check a single text.
pub fn validate_text(text: &str, subject: TextSubject) -> Result<(), InputError> {
    if !text.chars().any(char::is_alphabetic) {
        return Err(InputError::NoLetters { subject });
    }

    if let Some(found) = text.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(InputError::ForbiddenCharacter { subject, found });
    }

    Ok(())
}

/// Check every text of a batch, reporting the first offender.
pub fn validate_batch<S: AsRef<str>>(texts: &[S]) -> Result<(), InputError> {
    if texts.is_empty() {
        return Err(InputError::Empty);
    }

    texts
        .iter()
        .enumerate()
        .try_for_each(|(i, t)| validate_text(t.as_ref(), TextSubject::Index(i)))
}

/// Check both sides of a comparison.
pub fn validate_pair(a: &str, b: &str) -> Result<(), InputError> {
    validate_text(a, TextSubject::A)?;
    validate_text(b, TextSubject::B)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("I love this!" => Ok(()) ; "exclamation is fine")]
    #[test_case("1234" => Err(InputError::NoLetters { subject: TextSubject::Single }) ; "digits only")]
    #[test_case("   " => Err(InputError::NoLetters { subject: TextSubject::Single }) ; "blank")]
    #[test_case("" => Err(InputError::NoLetters { subject: TextSubject::Single }) ; "empty")]
    #[test_case("This is awful and terrible." => Err(InputError::ForbiddenCharacter { subject: TextSubject::Single, found: '.' }) ; "period")]
    #[test_case("it's fine" => Err(InputError::ForbiddenCharacter { subject: TextSubject::Single, found: '\'' }) ; "apostrophe")]
    #[test_case("say \"hi\"" => Err(InputError::ForbiddenCharacter { subject: TextSubject::Single, found: '"' }) ; "double quote")]
    #[test_case("café olé" => Ok(()) ; "accented letters")]
    fn single_text_rules(text: &str) -> Result<(), InputError> {
        validate_text(text, TextSubject::Single)
    }

    #[test]
    fn letters_rule_checked_before_characters() {
        assert_eq!(
            validate_text("12.5", TextSubject::Single),
            Err(InputError::NoLetters {
                subject: TextSubject::Single
            })
        );
    }

    #[test]
    fn batch_reports_offending_index() {
        let texts = ["good day", "great day", "42"];
        assert_eq!(
            validate_batch(&texts),
            Err(InputError::NoLetters {
                subject: TextSubject::Index(2)
            })
        );
    }

    #[test]
    fn empty_batch_rejected() {
        let texts: [&str; 0] = [];
        assert_eq!(validate_batch(&texts), Err(InputError::Empty));
    }

    #[test]
    fn pair_reports_side() {
        let err = validate_pair("fine words", "bad words.").unwrap_err();
        assert_eq!(err.subject(), Some(TextSubject::B));
        assert!(validate_pair("fine words", "other words").is_ok());
    }
}
