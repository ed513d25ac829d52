/// Split `publisher/namespace/dataset[:version]` into the id part and
/// an optional version.
///
/// Only the first `:` separates; a version string containing further
/// colons is preserved whole. Callers decide what a missing version
/// means (`latest` for pull/info, must-specify for unpublish). No slug
/// validation happens here; see [`crate::is_valid_id`].
pub fn parse_identifier(s: &str) -> (&str, Option<&str>) {
    match s.split_once(':') {
        Some((id, version)) => (id, Some(version)),
        None => (s, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_version() {
        assert_eq!(parse_identifier("a/b/c:1.0"), ("a/b/c", Some("1.0")));
    }

    #[test]
    fn test_without_version() {
        assert_eq!(parse_identifier("a/b/c"), ("a/b/c", None));
    }

    #[test]
    fn test_version_keeps_later_colons() {
        assert_eq!(
            parse_identifier("a/b/c:2024:special"),
            ("a/b/c", Some("2024:special"))
        );
    }

    #[test]
    fn test_empty_version() {
        assert_eq!(parse_identifier("a/b/c:"), ("a/b/c", Some("")));
    }
}
