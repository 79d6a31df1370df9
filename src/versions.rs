// src/versions.rs

//! Release-tag parsing and pairing of consecutive releases.

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)(?:\.(\d+))?(?:-rc(\d+))?$").expect("tag pattern is valid")
    })
}

/// A release version such as `6.6.8`, `6.6.8.1` or `6.7.0-rc3`.
/// Missing trailing components compare as zero.
#[derive(Debug, Clone)]
pub struct Version {
    release: Vec<u64>,
    rc: Option<u64>,
}

impl Version {
    /// Parses a tag, with or without a leading `v`
    pub fn parse(tag: &str) -> Option<Self> {
        let caps = tag_pattern().captures(tag.trim())?;
        let number = |i: usize| caps.get(i).map(|m| m.as_str().parse::<u64>()).transpose();

        let mut release = Vec::with_capacity(4);
        for i in 1..=4 {
            if let Some(n) = number(i).ok()? {
                release.push(n);
            }
        }
        let rc = number(5).ok()?;
        Some(Self { release, rc })
    }

    fn component(&self, i: usize) -> u64 {
        self.release.get(i).copied().unwrap_or(0)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.release.len().max(other.release.len());
        (0..width)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
            // A release candidate precedes its release.
            .then_with(|| match (self.rc, other.rc) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.release.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))?;
        if let Some(rc) = self.rc {
            write!(f, "-rc{rc}")?;
        }
        Ok(())
    }
}

/// Two consecutive releases: the older is the target, the newer the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPair {
    pub source: String,
    pub target: String,
}

/// Release tags strictly newer than `min`, oldest first
pub fn tags_newer_than(tags: &[String], min: &Version) -> Vec<String> {
    let mut versions: Vec<(Version, &String)> = tags
        .iter()
        .filter_map(|tag| Version::parse(tag).map(|v| (v, tag)))
        .filter(|(v, _)| v > min)
        .collect();
    versions.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    versions.into_iter().map(|(_, tag)| tag.clone()).collect()
}

/// Pairs each release with its successor, capped at `max` pairs
pub fn adjacent_pairs(sorted_tags: &[String], max: Option<usize>) -> Vec<VersionPair> {
    let pairs = sorted_tags.windows(2).map(|w| VersionPair {
        source: w[1].clone(),
        target: w[0].clone(),
    });
    match max {
        Some(max) => pairs.take(max).collect(),
        None => pairs.collect(),
    }
}

/// Tags sorted newest first: versioned tags by version, then the rest by name
pub fn sort_tags_newest_first(tags: &mut [String]) {
    tags.sort_by(|a, b| match (Version::parse(a), Version::parse(b)) {
        (Some(va), Some(vb)) => vb.cmp(&va),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_accepts_release_shapes() {
        assert_eq!(Version::parse("v6.6.8").unwrap().to_string(), "6.6.8");
        assert_eq!(Version::parse("6.6.8.1").unwrap().to_string(), "6.6.8.1");
        assert_eq!(Version::parse("v6.7.0-rc3").unwrap().to_string(), "6.7.0-rc3");
        assert!(Version::parse("v6.7").is_none());
        assert!(Version::parse("openkylin-6.6-next").is_none());
        assert!(Version::parse("v6.6.8-foo").is_none());
    }

    #[test]
    fn test_ordering() {
        let v = |s| Version::parse(s).unwrap();
        assert!(v("v6.6.9") > v("v6.6.8"));
        assert!(v("v6.6.10") > v("v6.6.9"));
        assert!(v("v6.7.0-rc1") < v("v6.7.0"));
        assert!(v("v6.7.0-rc2") > v("v6.7.0-rc1"));
        assert!(v("v6.6.8.1") > v("v6.6.8"));
        assert_eq!(v("6.6.8.0").cmp(&v("6.6.8")), Ordering::Equal);
    }

    #[test]
    fn test_adjacent_pairs_from_unsorted_tags() {
        let all = tags(&["v6.6.10", "v6.6.7", "v6.6.9", "v6.6.8", "next-2024", "v6.6.11-rc1", "v6.6.11"]);
        let min = Version::parse("v6.6.8").unwrap();

        let sorted = tags_newer_than(&all, &min);
        assert_eq!(sorted, tags(&["v6.6.9", "v6.6.10", "v6.6.11-rc1", "v6.6.11"]));

        let pairs = adjacent_pairs(&sorted, Some(2));
        assert_eq!(
            pairs,
            vec![
                VersionPair { source: "v6.6.10".into(), target: "v6.6.9".into() },
                VersionPair { source: "v6.6.11-rc1".into(), target: "v6.6.10".into() },
            ]
        );
    }

    #[test]
    fn test_single_tag_has_no_pairs() {
        assert!(adjacent_pairs(&tags(&["v6.6.9"]), None).is_empty());
    }

    #[test]
    fn test_sort_tags_newest_first() {
        let mut all = tags(&["v6.6.8", "alpha", "v6.6.10", "zeta", "v6.6.9"]);
        sort_tags_newest_first(&mut all);
        assert_eq!(all, tags(&["v6.6.10", "v6.6.9", "v6.6.8", "zeta", "alpha"]));
    }
}
