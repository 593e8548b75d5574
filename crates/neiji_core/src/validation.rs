//! crates/neiji_core/src/validation.rs
//!
//! Field validators used by the sign-in conversation and the account service,
//! plus the password strength meter shown while a password is being typed.

use crate::domain::{PasswordStrength, StrengthLevel};
use regex::Regex;
use std::sync::LazyLock;

pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static LETTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]").expect("valid letter regex"));
// ASCII only: `\d` would also accept digits from other scripts.
static DIGIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]").expect("valid digit regex"));
static LOWER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]").expect("valid regex"));
static UPPER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]").expect("valid regex"));
static SPECIAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[!@#$%^&*(),.?":{}|<>_+=~`\[\]\\';/-]"#).expect("valid special-char regex")
});

/// Why a field was rejected. The `Display` text is what the assistant says back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Hmm, you forgot to type your email!")]
    EmailEmpty,
    #[error("That email is a bit too long. Could you check it?")]
    EmailTooLong,
    #[error("Hmm, that email doesn't look valid. Could you type it again? (example: name@example.com)")]
    EmailMalformed,
    #[error("This password is too short. It needs at least 8 characters. Try again!")]
    PasswordTooShort,
    #[error("This password is too long. Keep it under 128 characters!")]
    PasswordTooLong,
    #[error("Your password needs both letters and digits to be safe. Try again!")]
    PasswordNeedsLettersAndDigits,
    #[error("Your password needs at least one letter. Add a few letters!")]
    PasswordNeedsLetter,
    #[error("Your password needs at least one digit. Add one or more digits!")]
    PasswordNeedsDigit,
}

/// `Ok(())` when the field is acceptable; the error carries the cause otherwise.
pub type ValidationResult = Result<(), ValidationError>;

/// Syntactic email check; no uniqueness or deliverability lookup.
pub fn validate_email(input: &str) -> ValidationResult {
    if input.trim().is_empty() {
        return Err(ValidationError::EmailEmpty);
    }
    if input.chars().count() > MAX_EMAIL_LEN {
        return Err(ValidationError::EmailTooLong);
    }
    if !EMAIL_RE.is_match(input) {
        return Err(ValidationError::EmailMalformed);
    }
    Ok(())
}

/// Length bounds, then at least one ASCII letter and one digit.
///
/// Special characters are scored by [`password_strength`] but never required.
pub fn validate_password(input: &str) -> ValidationResult {
    let len = input.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooLong);
    }

    let has_letters = LETTER_RE.is_match(input);
    let has_digits = DIGIT_RE.is_match(input);
    match (has_letters, has_digits) {
        (false, false) => Err(ValidationError::PasswordNeedsLettersAndDigits),
        (false, true) => Err(ValidationError::PasswordNeedsLetter),
        (true, false) => Err(ValidationError::PasswordNeedsDigit),
        (true, true) => Ok(()),
    }
}

/// One point per satisfied criterion; the level is read off the total.
pub fn password_strength(input: &str) -> PasswordStrength {
    let criteria = [
        LOWER_RE.is_match(input),
        UPPER_RE.is_match(input),
        DIGIT_RE.is_match(input),
        SPECIAL_RE.is_match(input),
        input.chars().count() >= MIN_PASSWORD_LEN,
    ];
    let score = criteria.iter().filter(|&&met| met).count() as u8;

    if score >= 5 {
        PasswordStrength {
            level: StrengthLevel::Strong,
            score,
            label: "Strong",
            color: "#10B981",
        }
    } else if score >= 3 {
        PasswordStrength {
            level: StrengthLevel::Medium,
            score,
            label: "Medium",
            color: "#F97316",
        }
    } else {
        PasswordStrength {
            level: StrengthLevel::Weak,
            score,
            label: "Weak",
            color: "#DC2626",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert_eq!(validate_email("user@example.com"), Ok(()));
        assert_eq!(validate_email("first.last@sub.example.co"), Ok(()));
    }

    #[test]
    fn rejects_bad_emails_with_their_cause() {
        assert_eq!(validate_email("   "), Err(ValidationError::EmailEmpty));
        assert_eq!(validate_email("notanemail"), Err(ValidationError::EmailMalformed));
        assert_eq!(validate_email("a b@example.com"), Err(ValidationError::EmailMalformed));
        assert_eq!(validate_email("a@b@example.com"), Err(ValidationError::EmailMalformed));
        assert_eq!(validate_email("user@example"), Err(ValidationError::EmailMalformed));

        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(validate_email(&long), Err(ValidationError::EmailTooLong));
    }

    #[test]
    fn password_rules_follow_their_order() {
        assert_eq!(validate_password("short1"), Err(ValidationError::PasswordTooShort));
        assert_eq!(
            validate_password(&"a1".repeat(65)),
            Err(ValidationError::PasswordTooLong)
        );
        assert_eq!(
            validate_password("!!!!????"),
            Err(ValidationError::PasswordNeedsLettersAndDigits)
        );
        assert_eq!(validate_password("12345678"), Err(ValidationError::PasswordNeedsLetter));
        assert_eq!(validate_password("aaaaaaaa"), Err(ValidationError::PasswordNeedsDigit));
        assert_eq!(validate_password("goodPass1"), Ok(()));
    }

    #[test]
    fn only_ascii_digits_count() {
        let arabic_indic_one = "abcdefg\u{0661}";
        assert_eq!(
            validate_password(arabic_indic_one),
            Err(ValidationError::PasswordNeedsDigit)
        );
        assert_eq!(password_strength(arabic_indic_one).score, 2);
    }

    #[test]
    fn specials_are_never_mandatory() {
        assert_eq!(validate_password("abcdefg1"), Ok(()));
    }

    #[test]
    fn strength_scores_each_criterion_once() {
        let s = password_strength("aaaaaaaa");
        assert_eq!(s.score, 2);
        assert_eq!(s.level, StrengthLevel::Weak);

        let s = password_strength("goodPass1");
        assert_eq!(s.score, 4);
        assert_eq!(s.level, StrengthLevel::Medium);

        let s = password_strength("g00d-Pass");
        assert_eq!(s.score, 5);
        assert_eq!(s.level, StrengthLevel::Strong);
        assert_eq!(s.label, "Strong");

        assert_eq!(password_strength("").score, 0);
    }

    #[test]
    fn adding_a_missing_class_never_lowers_the_score() {
        let base = "abcdefgh";
        let before = password_strength(base).score;
        for extra in ["A", "7", "!", "["] {
            let after = password_strength(&format!("{base}{extra}")).score;
            assert!(after > before, "adding {extra:?} should raise the score");
        }
    }
}
