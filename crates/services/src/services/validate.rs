//! Per-field request validation. Every check appends to a shared error list
//! so a single response reports all violations, not just the first.

use std::str::FromStr;

use chrono::NaiveDate;
use db::types::{ApprovalStatus, TaskPriority, TaskStatus};

#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.errors.push(format!("{field} {message}"));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.errors
    }
}

/// Required string, trimmed, with an inclusive length range.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    min: usize,
    max: usize,
) -> Option<String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    let length = trimmed.chars().count();
    if length < min || length > max {
        errors.push(
            field,
            &format!("must be between {min} and {max} characters"),
        );
        return None;
    }
    Some(trimmed.to_string())
}

/// Optional free text with a maximum length. An empty string is treated as
/// "clear the field".
pub fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Option<Option<String>> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.chars().count() > max {
        errors.push(field, &format!("must be at most {max} characters"));
        return None;
    }
    if trimmed.is_empty() {
        Some(None)
    } else {
        Some(Some(trimmed.to_string()))
    }
}

pub fn positive_id(errors: &mut FieldErrors, field: &str, value: Option<i64>) -> Option<i64> {
    let value = value?;
    if value <= 0 {
        errors.push(field, "must be a positive integer");
        return None;
    }
    Some(value)
}

pub fn parse_status(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<TaskStatus> {
    let value = value?;
    match TaskStatus::from_str(value.trim()) {
        Ok(status) => Some(status),
        Err(_) => {
            errors.push(field, "must be one of todo, in_progress, done");
            None
        }
    }
}

pub fn parse_priority(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<TaskPriority> {
    let value = value?;
    match TaskPriority::from_str(value.trim()) {
        Ok(priority) => Some(priority),
        Err(_) => {
            errors.push(field, "must be one of low, medium, high");
            None
        }
    }
}

pub fn parse_approval_status(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<ApprovalStatus> {
    let value = value?;
    match ApprovalStatus::from_str(value.trim()) {
        Ok(approval) => Some(approval),
        Err(_) => {
            errors.push(field, "must be one of pending, approved, rejected");
            None
        }
    }
}

/// Strict `YYYY-MM-DD` date: the string must parse and format back to
/// itself, so `2024-02-30` and `2024-2-3` are both rejected.
pub fn parse_date(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<NaiveDate> {
    let value = value?;
    let trimmed = value.trim();
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) if date.format("%Y-%m-%d").to_string() == trimmed => Some(date),
        _ => {
            errors.push(field, "must be a valid date in YYYY-MM-DD format");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_enforces_bounds() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            required_text(&mut errors, "title", Some("  Setup X  "), 3, 255),
            Some("Setup X".to_string())
        );
        assert!(errors.is_empty());

        assert_eq!(required_text(&mut errors, "title", Some(""), 3, 255), None);
        assert_eq!(required_text(&mut errors, "title", None, 3, 255), None);
        assert_eq!(errors.into_vec().len(), 2);
    }

    #[test]
    fn text_bounds_count_characters_not_bytes() {
        let mut errors = FieldErrors::new();
        // Two characters, six bytes.
        assert_eq!(required_text(&mut errors, "title", Some("日本"), 3, 255), None);
        assert_eq!(errors.into_vec().len(), 1);

        let mut errors = FieldErrors::new();
        let max_len = "é".repeat(255);
        assert_eq!(
            required_text(&mut errors, "title", Some(&max_len), 3, 255),
            Some(max_len.clone())
        );
        assert_eq!(
            optional_text(&mut errors, "description", Some(&max_len), 255),
            Some(Some(max_len))
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn optional_text_distinguishes_absent_from_clear() {
        let mut errors = FieldErrors::new();
        assert_eq!(optional_text(&mut errors, "description", None, 1000), None);
        assert_eq!(
            optional_text(&mut errors, "description", Some(""), 1000),
            Some(None)
        );
        assert_eq!(
            optional_text(&mut errors, "description", Some("notes"), 1000),
            Some(Some("notes".to_string()))
        );
        assert!(errors.is_empty());

        let long = "x".repeat(1001);
        assert_eq!(
            optional_text(&mut errors, "description", Some(&long), 1000),
            None
        );
        assert!(!errors.is_empty());
    }

    #[test]
    fn parse_date_requires_exact_round_trip() {
        let mut errors = FieldErrors::new();
        assert!(parse_date(&mut errors, "date", Some("2024-02-29")).is_some());
        assert!(errors.is_empty());

        assert!(parse_date(&mut errors, "date", Some("2024-02-30")).is_none());
        assert!(parse_date(&mut errors, "date", Some("2024-2-3")).is_none());
        assert!(parse_date(&mut errors, "date", Some("not-a-date")).is_none());
        assert_eq!(errors.into_vec().len(), 3);
    }

    #[test]
    fn enum_fields_reject_unknown_values() {
        let mut errors = FieldErrors::new();
        assert!(parse_status(&mut errors, "status", Some("archived")).is_none());
        assert!(parse_priority(&mut errors, "priority", Some("urgent")).is_none());
        assert!(parse_approval_status(&mut errors, "approval_status", Some("maybe")).is_none());
        assert_eq!(errors.into_vec().len(), 3);

        let mut errors = FieldErrors::new();
        assert_eq!(
            parse_status(&mut errors, "status", Some("in_progress")),
            Some(TaskStatus::InProgress)
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn positive_id_rejects_zero_and_negative() {
        let mut errors = FieldErrors::new();
        assert_eq!(positive_id(&mut errors, "assigned_to", Some(7)), Some(7));
        assert_eq!(positive_id(&mut errors, "assigned_to", Some(0)), None);
        assert_eq!(positive_id(&mut errors, "assigned_to", Some(-3)), None);
        assert_eq!(errors.into_vec().len(), 2);
    }
}
