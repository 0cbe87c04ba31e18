//! Reminder text sent to recipients.

/// Compose the SMS body for a reminder setup.
///
/// The body never contains the recipient's phone number.
pub fn compose_body(
    recipient_name: &str,
    scheduled_date: &str,
    interval_days: i64,
    repeat_mode: bool,
) -> String {
    let name = match recipient_name.trim() {
        "" => "there",
        name => name,
    };

    let mut body = format!(
        "Hi {}! Heads up: the next cycle is expected to start on {} (every {} days).",
        name,
        scheduled_date.trim(),
        interval_days
    );
    if repeat_mode {
        body.push_str(" You'll get a reminder like this every cycle.");
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_off_reminder() {
        assert_eq!(
            compose_body("Sam", "2026-04-02", 28, false),
            "Hi Sam! Heads up: the next cycle is expected to start on 2026-04-02 (every 28 days)."
        );
    }

    #[test]
    fn test_repeat_mode_adds_sentence() {
        let body = compose_body(" Alex ", "2026-04-02", 30, true);
        assert!(body.starts_with("Hi Alex!"));
        assert!(body.ends_with("You'll get a reminder like this every cycle."));
    }

    #[test]
    fn test_blank_name_falls_back() {
        assert!(compose_body("  ", "tomorrow", 28, false).starts_with("Hi there!"));
    }
}
