//! # Version Comparison
//!
//! Classifies the delta between an installed version and a candidate as a
//! major, minor, or patch update.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Update classification between two versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    /// Candidate is not newer
    #[default]
    None,
    Patch,
    Minor,
    Major,
    /// Candidate is newer only by its pre-release tag or beyond the third
    /// component
    Unknown,
}

impl UpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::None => "none",
            UpdateType::Patch => "patch",
            UpdateType::Minor => "minor",
            UpdateType::Major => "major",
            UpdateType::Unknown => "unknown",
        }
    }

    pub fn is_update(&self) -> bool {
        !matches!(self, UpdateType::None)
    }

    fn from_index(index: usize) -> Self {
        match index {
            0 => UpdateType::Major,
            1 => UpdateType::Minor,
            _ => UpdateType::Patch,
        }
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SEMVER_WIDTH: usize = 3;

fn leading_digits() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*(\d+)").expect("static pattern"))
}

/// Split a version string into numeric components, padded to three
///
/// Each component keeps only its leading digits ("3-beta" -> 3); anything
/// without leading digits, or too large for u64, becomes 0.
pub fn normalize(version: &str) -> Vec<u64> {
    let mut parts: Vec<u64> = version
        .trim()
        .split('.')
        .map(|part| {
            leading_digits()
                .captures(part)
                .and_then(|caps| caps.get(1))
                .and_then(|digits| digits.as_str().parse().ok())
                .unwrap_or(0)
        })
        .collect();

    while parts.len() < SEMVER_WIDTH {
        parts.push(0);
    }

    parts
}

/// One dotted component: its number plus any pre-release tag after it
#[derive(Debug, Clone)]
struct Component {
    number: u64,
    tag: Option<String>,
}

impl Component {
    fn parse(part: &str) -> Self {
        let part = part.trim();
        let digits = leading_digits()
            .captures(part)
            .and_then(|caps| caps.get(1));

        let number = digits
            .and_then(|d| d.as_str().parse().ok())
            .unwrap_or(0);
        let rest = match digits {
            Some(d) => &part[d.end()..],
            None => part,
        };
        let tag = rest.trim_start_matches(['-', '_', '+', '.']);

        Self {
            number,
            tag: (!tag.is_empty()).then(|| tag.to_ascii_lowercase()),
        }
    }

    fn bare(number: u64) -> Self {
        Self { number, tag: None }
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number.cmp(&other.number).then_with(|| match (&self.tag, &other.tag) {
            (None, None) => Ordering::Equal,
            // "1.0-beta" < "1.0"
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => compare_tags(a, b),
        })
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Component {}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// dev < alpha < beta < rc < anything else, then the trailing number
fn compare_tags(a: &str, b: &str) -> Ordering {
    fn rank(tag: &str) -> (u8, &str, u64) {
        let split = tag
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(tag.len());
        let (name, number) = tag.split_at(split);
        let name = name.trim_end_matches(['-', '_', '.']);
        let weight = match name {
            "dev" => 0,
            "alpha" | "a" => 1,
            "beta" | "b" => 2,
            "rc" | "c" => 3,
            _ => 4,
        };
        let number = number
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .unwrap_or(0);
        (weight, name, number)
    }

    rank(a).cmp(&rank(b))
}

fn components(version: &str) -> Vec<Component> {
    // Build metadata never affects ordering
    let version = version.split('+').next().unwrap_or_default();
    let mut parts: Vec<Component> = version.trim().split('.').map(Component::parse).collect();
    while parts.len() < SEMVER_WIDTH {
        parts.push(Component::bare(0));
    }
    parts
}

fn ordering(current: &[Component], candidate: &[Component]) -> Ordering {
    let width = current.len().max(candidate.len());
    let zero = Component::bare(0);
    (0..width)
        .map(|i| {
            let a = current.get(i).unwrap_or(&zero);
            let b = candidate.get(i).unwrap_or(&zero);
            a.cmp(b)
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Compare an installed version against a candidate
///
/// Whether the candidate is newer follows pre-release aware ordering
/// (`6.5-RC1` < `6.5`); the label comes from the first of the three numeric
/// components that grew. A candidate newer only by its tag or past the third
/// component is `Unknown`.
pub fn compare(current: &str, candidate: &str) -> UpdateType {
    if ordering(&components(current), &components(candidate)) != Ordering::Less {
        return UpdateType::None;
    }

    let current = normalize(current);
    let candidate = normalize(candidate);

    candidate
        .iter()
        .zip(current.iter())
        .take(SEMVER_WIDTH)
        .position(|(new, old)| new > old)
        .map(UpdateType::from_index)
        .unwrap_or(UpdateType::Unknown)
}

/// Compare against an optional candidate; no candidate means no update
pub fn compare_optional(current: &str, candidate: Option<&str>) -> UpdateType {
    candidate
        .map(|candidate| compare(current, candidate))
        .unwrap_or(UpdateType::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_cases() {
        assert_eq!(compare("1.0.0", "2.0.0"), UpdateType::Major);
        assert_eq!(compare("1.2.0", "1.3.0"), UpdateType::Minor);
        assert_eq!(compare("1.2.3", "1.2.4"), UpdateType::Patch);
        assert_eq!(compare("1.2.3", "1.2.3"), UpdateType::None);
        assert_eq!(compare("2.0.0", "1.9.9"), UpdateType::None);
    }

    #[test]
    fn test_reflexive() {
        for v in ["0", "1", "1.2", "1.2.3", "6.4.2", "10.0.0-beta", "", "abc", "1.2.3.4"] {
            assert_eq!(compare(v, v), UpdateType::None, "compare({v:?}, {v:?})");
        }
    }

    #[test]
    fn test_missing_components_are_padded() {
        assert_eq!(normalize("6.4"), vec![6, 4, 0]);
        assert_eq!(normalize("7"), vec![7, 0, 0]);
        assert_eq!(compare("6.4", "6.4.1"), UpdateType::Patch);
        assert_eq!(compare("6", "6.1"), UpdateType::Minor);
        assert_eq!(compare("6.4", "6.4.0"), UpdateType::None);
    }

    #[test]
    fn test_non_numeric_components_coerce_to_zero() {
        assert_eq!(normalize("1.x.3"), vec![1, 0, 3]);
        assert_eq!(normalize("5.3-beta1"), vec![5, 3, 0]);
        assert_eq!(normalize("2.1.0-rc2"), vec![2, 1, 0]);
        assert_eq!(compare("1.x.3", "1.1.0"), UpdateType::Minor);
    }

    #[test]
    fn test_first_differing_component_labels_delta() {
        // A major bump with smaller minor/patch is still major
        assert_eq!(compare("1.9.9", "2.0.0"), UpdateType::Major);
        assert_eq!(compare("1.2.9", "1.3.0"), UpdateType::Minor);
    }

    #[test]
    fn test_fourth_component_bump_is_unknown() {
        assert_eq!(compare("4.1.2", "4.1.2.1"), UpdateType::Unknown);
        assert_eq!(compare("4.1.2.1", "4.1.2"), UpdateType::None);
    }

    #[test]
    fn test_prerelease_ranks_below_release() {
        assert_eq!(compare("1.0.0-beta", "1.0.0"), UpdateType::Unknown);
        assert_eq!(compare("6.5-RC1", "6.5"), UpdateType::Unknown);
        assert_eq!(compare("6.5-RC1", "6.5.1"), UpdateType::Patch);
        assert_eq!(compare("6.4.2", "6.5-RC1"), UpdateType::Minor);
        assert_eq!(compare("1.0.0", "1.0.0-beta"), UpdateType::None);
    }

    #[test]
    fn test_prerelease_tags_are_ordered() {
        assert_eq!(compare("2.0-alpha", "2.0-beta"), UpdateType::Unknown);
        assert_eq!(compare("2.0-beta2", "2.0-beta10"), UpdateType::Unknown);
        assert_eq!(compare("2.0-rc1", "2.0-beta3"), UpdateType::None);
        assert_eq!(compare("2.0-RC1", "2.0-rc1"), UpdateType::None);
        assert_eq!(compare("1.2.3+build5", "1.2.3"), UpdateType::None);
    }

    #[test]
    fn test_optional_candidate() {
        assert_eq!(compare_optional("1.0.0", None), UpdateType::None);
        assert_eq!(compare_optional("1.0.0", Some("1.0.1")), UpdateType::Patch);
    }

    #[test]
    fn test_serialized_labels() {
        assert_eq!(serde_json::to_string(&UpdateType::Major).unwrap(), "\"major\"");
        assert_eq!(UpdateType::Unknown.to_string(), "unknown");
        assert!(!UpdateType::None.is_update());
    }
}
