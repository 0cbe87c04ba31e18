//! Recipient phone number handling.
//!
//! Inbound numbers are free-form (`"+1 (555) 123-4567"`); everything that
//! touches the quota store or the provider works on the normalized form.

mod validator;

pub use validator::{PhoneValidator, ValidationResult};

/// Strip everything except digits and a leading `+`.
///
/// A `+` survives only when it is the first character kept, so
/// `"555+1234"` becomes `"5551234"` and `"++44 20"` becomes `"+4420"`.
pub fn normalize(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() {
            normalized.push(c);
        } else if c == '+' && normalized.is_empty() {
            normalized.push(c);
        }
    }
    normalized
}

/// Number of digits in an already normalized phone
pub fn digit_count(normalized: &str) -> usize {
    normalized.bytes().filter(u8::is_ascii_digit).count()
}

/// Mask a normalized phone for logs: `+15551234567` -> `+155******67`
pub fn mask(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 6 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 6), tail)
}
