/// Validate an email: must contain '@' and '.', max 254 chars.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("Email is required".to_string());
    }
    if trimmed.len() > 254 {
        return Some("Email must be at most 254 characters".to_string());
    }
    if !trimmed.contains('@') || !trimmed.contains('.') {
        return Some("Email must be a valid address".to_string());
    }
    None
}

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    if value.trim().chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Trimmed value, or `None` when blank.
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rules() {
        assert!(validate_email("jane@example.edu").is_none());
        assert_eq!(validate_email("  ").as_deref(), Some("Email is required"));
        assert!(validate_email("jane.example.edu").is_some());
        assert!(validate_email(&format!("{}@x.io", "a".repeat(260))).is_some());
    }

    #[test]
    fn required_and_optional_lengths() {
        assert_eq!(validate_required(" ", "School", 10).as_deref(), Some("School is required"));
        assert!(validate_required("State U", "School", 10).is_none());
        assert!(validate_required("State University", "School", 10).is_some());
        assert!(validate_optional("", "Role", 5).is_none());
        assert!(validate_optional("President", "Role", 5).is_some());
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank("  Alpha Beta "), Some("Alpha Beta".to_string()));
        assert_eq!(non_blank("   "), None);
    }
}
