/// Sentinel version for archives whose name carries no version segment.
pub const UNKNOWN_VERSION: &str = "---";

/// Best-effort parse of the community naming convention
/// `<priority>-<mod_id>[-<version>]_<rest>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameParts {
    pub priority: String,
    pub mod_id: String,
    pub version: String,
}

/// Split the underscore-delimited prefix into its hyphen segments. Names
/// that do not follow the convention yield empty segments, never a panic;
/// callers decide whether an empty mod id is usable.
pub fn parse(filename: &str) -> FilenameParts {
    let prefix = filename.split('_').next().unwrap_or_default();
    let segments: Vec<&str> = prefix.split('-').collect();

    let priority = segments.first().copied().unwrap_or_default().to_string();
    let mod_id = segments.get(1).copied().unwrap_or_default().to_string();
    let version = segments
        .get(2)
        .map(|segment| segment.to_string())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string());

    FilenameParts {
        priority,
        mod_id,
        version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_convention() {
        let parts = parse("001-ExampleMod-1.2.3_P.pak");
        assert_eq!(parts.priority, "001");
        assert_eq!(parts.mod_id, "ExampleMod");
        assert_eq!(parts.version, "1.2.3");
    }

    #[test]
    fn missing_version_yields_sentinel() {
        let parts = parse("001-Foo_bar.pak");
        assert_eq!(parts.priority, "001");
        assert_eq!(parts.mod_id, "Foo");
        assert_eq!(parts.version, UNKNOWN_VERSION);
    }

    #[test]
    fn unstructured_name_does_not_panic() {
        let parts = parse("readme.pak");
        assert!(parts.mod_id.is_empty());
        assert_eq!(parts.version, UNKNOWN_VERSION);
    }

    #[test]
    fn empty_name_yields_empty_parts() {
        let parts = parse("");
        assert_eq!(parts.priority, "");
        assert!(parts.mod_id.is_empty());
        assert_eq!(parts.version, UNKNOWN_VERSION);
    }
}
