/// Default partner identification tag for revenue measurement tracking.
pub const DEFAULT_TAG_KEY: &str = "aws-apn-id";
pub const DEFAULT_TAG_VALUE: &str = "pc:3jtjsihjubajawpl401j5b27s";

/// The single key/value pair applied to every resource in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTag {
    pub key: String,
    pub value: String,
}

impl TargetTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Default for TargetTag {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_KEY, DEFAULT_TAG_VALUE)
    }
}

/// Resources that must never be tagged, resolved once per run.
///
/// The Athena `primary` workgroup exists in every account and cannot be
/// deleted, so it is excluded by default. The exclusion list is configuration
/// (`ATHENA_EXCLUDED_WORKGROUPS`, comma-separated), not a constant inside the
/// enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPolicy {
    excluded_workgroups: Vec<String>,
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            excluded_workgroups: vec!["primary".to_string()],
        }
    }
}

impl TagPolicy {
    pub fn new(excluded_workgroups: Vec<String>) -> Self {
        Self {
            excluded_workgroups,
        }
    }

    pub fn from_env() -> Self {
        match std::env::var("ATHENA_EXCLUDED_WORKGROUPS") {
            Ok(raw) => Self::new(
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            Err(_) => Self::default(),
        }
    }

    pub fn is_workgroup_excluded(&self, name: &str) -> bool {
        self.excluded_workgroups.iter().any(|w| w == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tag_values() {
        let tag = TargetTag::default();
        assert_eq!(tag.key, "aws-apn-id");
        assert_eq!(tag.value, "pc:3jtjsihjubajawpl401j5b27s");
    }

    #[test]
    fn primary_workgroup_excluded_by_default() {
        let policy = TagPolicy::default();
        assert!(policy.is_workgroup_excluded("primary"));
        assert!(!policy.is_workgroup_excluded("analytics"));
    }

    #[test]
    fn exclusion_list_is_configurable() {
        let policy = TagPolicy::new(vec!["primary".to_string(), "scratch".to_string()]);
        assert!(policy.is_workgroup_excluded("scratch"));

        let empty = TagPolicy::new(Vec::new());
        assert!(!empty.is_workgroup_excluded("primary"));
    }
}
