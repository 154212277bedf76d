//! Path parameter validation.

/// Validate job ID format.
///
/// Valid format: alphanumeric characters and hyphens only, 8-64 chars.
/// Anything else could escape the output root once joined into a path.
pub fn is_valid_job_id(id: &str) -> bool {
    if id.len() < 8 || id.len() > 64 {
        return false;
    }
    id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_job_ids() {
        assert!(is_valid_job_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_valid_job_id("abcd1234"));
    }

    #[test]
    fn test_invalid_job_ids() {
        assert!(!is_valid_job_id(""));
        assert!(!is_valid_job_id("short"));
        assert!(!is_valid_job_id("../../etc/passwd"));
        assert!(!is_valid_job_id("job_with_underscore"));
        assert!(!is_valid_job_id(&"a".repeat(65)));
    }
}
