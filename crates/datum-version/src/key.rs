use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// Ordering rank for one version string.
///
/// Semver sorts before numeric tuples, which sort before plain strings;
/// within a rank the parsed value decides, and the raw string breaks
/// remaining ties.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    SemVer(semver::Version),
    Numeric(Vec<u128>),
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionKey {
    rank: Rank,
    raw: String,
}

impl VersionKey {
    pub fn new(raw: &str) -> Self {
        let rank = match semver::Version::parse(raw) {
            Ok(v) => Rank::SemVer(v),
            Err(_) => {
                let numbers: Vec<u128> = NUMBER_REGEX
                    .find_iter(raw)
                    .filter_map(|m| m.as_str().parse().ok())
                    .collect();
                if numbers.is_empty() {
                    Rank::Plain
                } else {
                    Rank::Numeric(numbers)
                }
            }
        };
        Self {
            rank,
            raw: raw.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Compare two version strings under the layered ordering.
pub fn compare(a: &str, b: &str) -> Ordering {
    VersionKey::new(a).cmp(&VersionKey::new(b))
}

/// Sort version strings ascending, newest last.
pub fn sorted(versions: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut keys: Vec<VersionKey> = versions.into_iter().map(|v| VersionKey::new(&v)).collect();
    keys.sort();
    keys.into_iter().map(|k| k.raw).collect()
}

/// The newest version among the given strings.
pub fn latest<'a>(versions: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    versions.into_iter().max_by(|a, b| compare(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semver_ordering() {
        assert_eq!(compare("0.1.0", "0.2.0"), Ordering::Less);
        assert_eq!(compare("1.0.10", "1.0.9"), Ordering::Greater);
        assert_eq!(compare("2.0.0", "2.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_prerelease_sorts_before_release() {
        assert_eq!(compare("1.0.0-rc.1", "1.0.0"), Ordering::Less);
    }

    #[test]
    fn test_numeric_tuple_fallback() {
        assert_eq!(compare("2024-01", "2024-02"), Ordering::Less);
        assert_eq!(compare("2023-12", "2024-01"), Ordering::Less);
        assert_eq!(compare("v10", "v9"), Ordering::Greater);
    }

    #[test]
    fn test_plain_fallback_is_lexicographic() {
        assert_eq!(compare("alpha", "beta"), Ordering::Less);
    }

    #[test]
    fn test_sorted_newest_last() {
        let versions = vec![
            "0.2.0".to_string(),
            "0.1.0".to_string(),
            "0.10.0".to_string(),
        ];
        assert_eq!(sorted(versions), vec!["0.1.0", "0.2.0", "0.10.0"]);
    }

    #[test]
    fn test_latest() {
        assert_eq!(latest(["0.1.0", "0.2.0", "0.1.9"]), Some("0.2.0"));
        assert_eq!(latest([]), None);
    }

    #[test]
    fn test_latest_is_not_lexicographic() {
        // a plain string sort would pick "0.9.0" here
        assert_eq!(latest(["0.9.0", "0.10.0"]), Some("0.10.0"));
    }
}

#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn compare_is_reflexive(v in "[a-z0-9.-]{0,16}") {
            prop_assert_eq!(compare(&v, &v), Ordering::Equal);
        }

        #[test]
        fn compare_is_antisymmetric(a in "[a-z0-9.-]{0,16}", b in "[a-z0-9.-]{0,16}") {
            prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
        }

        #[test]
        fn sorted_is_idempotent(vs in proptest::collection::vec("[a-z0-9.-]{0,12}", 0..8)) {
            let once = sorted(vs);
            let twice = sorted(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
