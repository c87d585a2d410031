//! Semantic field rules shared by the auth and pantry write paths.
//!
//! Each rule receives an already type-checked value and either accepts it,
//! accepts it with a normalized replacement (lowercasing for the
//! case-insensitive fields), or rejects it with a client-facing reason.

use regex::Regex;

use super::FieldValue;

const MAX_EMAIL_LENGTH: usize = 320;

fn expect_text(value: &FieldValue) -> Result<&str, String> {
    value
        .as_text()
        .ok_or_else(|| "must be a string".to_string())
}

/// Password strength: length plus one of each character class.
/// Passwords stay case-sensitive, so no normalization happens here.
pub fn password(value: &FieldValue) -> Result<Option<FieldValue>, String> {
    let password = expect_text(value)?;
    if password.chars().count() < 8 {
        return Err("must be at least 8 characters long".to_string());
    }
    if !password.chars().any(char::is_uppercase) {
        return Err("must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(char::is_lowercase) {
        return Err("must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("must contain at least one digit".to_string());
    }
    if password.chars().all(char::is_alphanumeric) {
        return Err("must contain at least one special character".to_string());
    }
    Ok(None)
}

/// Usernames are alphanumeric and stored lowercase.
pub fn username(value: &FieldValue) -> Result<Option<FieldValue>, String> {
    let username = expect_text(value)?;
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("must contain only letters and digits".to_string());
    }
    Ok(Some(FieldValue::Text(username.to_lowercase())))
}

/// Email format check; the stored value is lowercased so the UNIQUE
/// constraint enforces case-insensitive uniqueness.
pub fn email(value: &FieldValue) -> Result<Option<FieldValue>, String> {
    let email = expect_text(value)?;
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(format!("must be at most {MAX_EMAIL_LENGTH} characters long"));
    }
    let well_formed =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email));
    if !well_formed {
        return Err("must be a valid email address".to_string());
    }
    Ok(Some(FieldValue::Text(email.to_lowercase())))
}

/// Security answers are alphabetic and compared case-insensitively.
pub fn security_answer(value: &FieldValue) -> Result<Option<FieldValue>, String> {
    let answer = expect_text(value)?;
    if !answer.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err("must contain only alphabetic characters".to_string());
    }
    Ok(Some(FieldValue::Text(answer.to_lowercase())))
}

/// Item names are alphabetic words and stored lowercase.
pub fn item_name(value: &FieldValue) -> Result<Option<FieldValue>, String> {
    let item = expect_text(value)?;
    let alphabetic_words = item
        .split_whitespace()
        .all(|word| word.chars().all(char::is_alphabetic));
    if !alphabetic_words {
        return Err("must contain only alphabetic characters and spaces".to_string());
    }
    Ok(Some(FieldValue::Text(item.to_lowercase())))
}

/// Expiry dates travel as `dd-mm-yyyy` strings.
pub fn expiry_date(value: &FieldValue) -> Result<Option<FieldValue>, String> {
    let date = expect_text(value)?;
    chrono::NaiveDate::parse_from_str(date, "%d-%m-%Y")
        .map_err(|_| "must be a date in the format 'dd-mm-yyyy'".to_string())?;
    Ok(None)
}

/// Item counts are non-negative integers.
pub fn item_count(value: &FieldValue) -> Result<Option<FieldValue>, String> {
    let count = value
        .as_count()
        .ok_or_else(|| "must be an integer".to_string())?;
    if count < 0 {
        return Err("must be a non-negative integer".to_string());
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> FieldValue {
        FieldValue::Text(value.to_string())
    }

    #[test]
    fn password_accepts_all_character_classes() {
        assert_eq!(password(&text("Abcdefg1!")), Ok(None));
        assert_eq!(password(&text("SecureP@ssw0rd")), Ok(None));
    }

    #[test]
    fn password_rejects_each_missing_class() {
        assert!(password(&text("Abc1!")).is_err()); // too short
        assert!(password(&text("abcdefg1!")).is_err()); // no uppercase
        assert!(password(&text("ABCDEFG1!")).is_err()); // no lowercase
        assert!(password(&text("Abcdefgh!")).is_err()); // no digit
        assert!(password(&text("Abcdefg12")).is_err()); // no special
    }

    #[test]
    fn username_lowercases_and_rejects_symbols() {
        assert_eq!(
            username(&text("Alice99")),
            Ok(Some(FieldValue::Text("alice99".to_string())))
        );
        assert!(username(&text("alice smith")).is_err());
        assert!(username(&text("alice!")).is_err());
    }

    #[test]
    fn email_normalizes_to_lowercase() {
        assert_eq!(
            email(&text("Alice@Example.COM")),
            Ok(Some(FieldValue::Text("alice@example.com".to_string())))
        );
    }

    #[test]
    fn email_rejects_malformed_and_oversized_addresses() {
        assert!(email(&text("not-an-email")).is_err());
        assert!(email(&text("missing-domain@")).is_err());
        assert!(email(&text("spaces in@example.com")).is_err());

        let local = "a".repeat(MAX_EMAIL_LENGTH);
        assert!(email(&text(&format!("{local}@example.com"))).is_err());
    }

    #[test]
    fn security_answer_is_alphabetic_and_lowercased() {
        assert_eq!(
            security_answer(&text("Fish")),
            Ok(Some(FieldValue::Text("fish".to_string())))
        );
        assert!(security_answer(&text("fish42")).is_err());
        assert!(security_answer(&text("two words")).is_err());
    }

    #[test]
    fn item_name_allows_spaces_between_alphabetic_words() {
        assert_eq!(
            item_name(&text("Baked Beans")),
            Ok(Some(FieldValue::Text("baked beans".to_string())))
        );
        assert!(item_name(&text("beans 2")).is_err());
    }

    #[test]
    fn expiry_date_requires_day_month_year() {
        assert_eq!(expiry_date(&text("01-12-2026")), Ok(None));
        assert!(expiry_date(&text("2026-12-01")).is_err());
        assert!(expiry_date(&text("32-01-2026")).is_err());
        assert!(expiry_date(&text("tomorrow")).is_err());
    }

    #[test]
    fn item_count_rejects_negatives() {
        assert_eq!(item_count(&FieldValue::Count(0)), Ok(None));
        assert_eq!(item_count(&FieldValue::Count(12)), Ok(None));
        assert!(item_count(&FieldValue::Count(-1)).is_err());
    }
}
