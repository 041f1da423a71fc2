use crate::error::ValidationError;
use regex::Regex;
use std::sync::OnceLock;

pub const MAX_PROMPT_LENGTH: usize = 10_000;
pub const MAX_BRANCH_NAME_LENGTH: usize = 255;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

fn agent_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^bc_[A-Za-z0-9]+$").expect("agent id pattern"))
}

fn repository_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"^https://github\.com/[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$")
                .expect("repository url pattern"),
            Regex::new(r"^[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$").expect("repository short pattern"),
        ]
    })
}

fn branch_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_./-]+$").expect("branch pattern"))
}

pub fn is_valid_agent_id(agent_id: &str) -> bool {
    agent_id_pattern().is_match(agent_id)
}

pub fn is_valid_repository(repository: &str) -> bool {
    repository_patterns()
        .iter()
        .any(|pattern| pattern.is_match(repository))
}

pub fn validate_agent_id(agent_id: Option<&str>) -> Result<String, ValidationError> {
    let agent_id = agent_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ValidationError::new("Agent ID is required"))?;

    if !is_valid_agent_id(agent_id) {
        return Err(ValidationError::new(
            "Invalid agent ID format. Expected format: bc_[alphanumeric] (e.g., bc_abc123)",
        ));
    }

    Ok(agent_id.to_string())
}

pub fn validate_repository(repository: Option<&str>) -> Result<String, ValidationError> {
    let repository = repository
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ValidationError::new("Repository is required"))?;

    if !is_valid_repository(repository) {
        return Err(ValidationError::new(
            "Invalid repository format. Use owner/repo or https://github.com/owner/repo",
        ));
    }

    Ok(repository.to_string())
}

pub fn validate_prompt(prompt: Option<&str>) -> Result<String, ValidationError> {
    let prompt = prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ValidationError::new("Prompt is required"))?;

    if prompt.chars().count() > MAX_PROMPT_LENGTH {
        return Err(ValidationError::new(format!(
            "Prompt exceeds maximum length of {MAX_PROMPT_LENGTH} characters"
        )));
    }

    Ok(prompt.to_string())
}

/// Absent or empty input is not an error: the remote service picks a branch.
pub fn validate_branch_name(branch_name: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(branch_name) = branch_name.filter(|b| !b.is_empty()) else {
        return Ok(None);
    };

    if branch_name.chars().count() > MAX_BRANCH_NAME_LENGTH {
        return Err(ValidationError::new(format!(
            "Branch name exceeds maximum length of {MAX_BRANCH_NAME_LENGTH} characters"
        )));
    }

    if !branch_pattern().is_match(branch_name) {
        return Err(ValidationError::new(
            "Invalid branch name. Use only alphanumeric characters, dots, hyphens, and forward slashes.",
        ));
    }

    Ok(Some(branch_name.to_string()))
}

pub fn validate_limit(limit: Option<f64>) -> u32 {
    validate_limit_with_max(limit, MAX_LIMIT)
}

/// Never fails: out-of-range values are clamped into `1..=max` and
/// fractions are floored.
pub fn validate_limit_with_max(limit: Option<f64>, max: u32) -> u32 {
    let max = max.max(1);
    match limit {
        None => DEFAULT_LIMIT.min(max),
        Some(value) if value.is_nan() => DEFAULT_LIMIT.min(max),
        Some(value) if value < 1.0 => 1,
        Some(value) if value > f64::from(max) => max,
        Some(value) => value.floor() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_id_accepts_well_formed_ids() {
        for id in ["bc_abc123", "bc_a", "bc_123"] {
            assert_eq!(validate_agent_id(Some(id)).unwrap(), id);
        }
    }

    #[test]
    fn agent_id_rejects_malformed_ids() {
        for id in [
            "abc123",
            "bc_",
            "bc_abc-123",
            "bc_abc_123",
            "BC_abc123",
            " bc_abc123",
            "bc_abc123 ",
            "bc_abc123\n",
        ] {
            let err = validate_agent_id(Some(id)).unwrap_err();
            assert!(err.message().starts_with("Invalid agent ID format"), "{id:?}");
        }
    }

    #[test]
    fn agent_id_missing_is_required_error() {
        assert_eq!(
            validate_agent_id(None).unwrap_err().message(),
            "Agent ID is required"
        );
        assert_eq!(
            validate_agent_id(Some("")).unwrap_err().message(),
            "Agent ID is required"
        );
    }

    #[test]
    fn repository_accepts_short_and_github_forms() {
        assert!(validate_repository(Some("owner/repo")).is_ok());
        assert!(validate_repository(Some("https://github.com/owner/repo")).is_ok());
        assert!(validate_repository(Some("my.org/my-repo_2")).is_ok());
    }

    #[test]
    fn repository_rejects_other_shapes() {
        for repo in [
            "invalid",
            "https://gitlab.com/owner/repo",
            "http://github.com/owner/repo",
            "https://github.com/owner",
            "owner/repo/extra",
        ] {
            assert!(validate_repository(Some(repo)).is_err(), "{repo}");
        }
        assert_eq!(
            validate_repository(None).unwrap_err().message(),
            "Repository is required"
        );
    }

    #[test]
    fn prompt_length_boundary_is_inclusive() {
        let at_limit = "a".repeat(MAX_PROMPT_LENGTH);
        assert!(validate_prompt(Some(&at_limit)).is_ok());

        let over = "a".repeat(MAX_PROMPT_LENGTH + 1);
        let err = validate_prompt(Some(&over)).unwrap_err();
        assert!(err.message().contains("10000"));

        assert_eq!(validate_prompt(Some("")).unwrap_err().message(), "Prompt is required");
    }

    #[test]
    fn branch_name_optional_and_checked() {
        assert_eq!(validate_branch_name(None).unwrap(), None);
        assert_eq!(
            validate_branch_name(Some("feature/fix-1.2")).unwrap(),
            Some("feature/fix-1.2".to_string())
        );
        assert!(validate_branch_name(Some("bad branch")).is_err());
        assert!(validate_branch_name(Some(&"b".repeat(256))).is_err());
        assert!(validate_branch_name(Some(&"b".repeat(255))).is_ok());
    }

    #[test]
    fn limit_is_clamped_and_floored() {
        assert_eq!(validate_limit(None), 10);
        assert_eq!(validate_limit(Some(0.0)), 1);
        assert_eq!(validate_limit(Some(-5.0)), 1);
        assert_eq!(validate_limit(Some(1000.0)), 100);
        assert_eq!(validate_limit_with_max(Some(50.0), 25), 25);
        assert_eq!(validate_limit(Some(5.7)), 5);
        assert_eq!(validate_limit(Some(f64::NAN)), 10);
    }
}
