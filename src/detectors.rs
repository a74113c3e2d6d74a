//! Detector set and the deterministic placeholder digest.
//!
//! A [`Detector`] pairs a category tag with a compiled regex. Detectors are
//! grouped into ordered tiers so that a literal nested inside a wider match
//! (an IP address embedded in a file path, say) is consumed by the wider
//! detector first — see [`TIER_1`]/[`TIER_2`] and `Detector::tier`.
use regex::Regex;

/// Short TAG spelling pinned per the placeholder format (`{{TAG-HASH8}}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Ip,
    Mac,
    File,
    Cred,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::File, Category::Cred, Category::Mac, Category::Ip];

    pub fn tag(self) -> &'static str {
        match self {
            Category::Ip => "IP",
            Category::Mac => "MAC",
            Category::File => "FILE",
            Category::Cred => "CRED",
        }
    }

    /// Tier 0 (FILE_DIR/CRED/MAC) runs before tier 1 (IPV4) so a wider match
    /// swallows any IP literal nested inside it.
    pub fn tier(self) -> usize {
        match self {
            Category::File | Category::Cred | Category::Mac => 0,
            Category::Ip => 1,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Credential keyword list. Matches the key half of `key<sep>value` pairs.
const CRED_KEYWORDS: &[&str] = &[
    "username",
    "user_name",
    "user",
    "uid",
    "password",
    "passwd",
    "pwd",
    "pass",
    "secret",
    "token",
    "api_key",
    "apikey",
    "access_key",
    "access_token",
    "auth_token",
    "client_secret",
    "client_id",
    "private_key",
    "ssh_user",
    "ssh_pass",
    "ssh_password",
    "ssh_key",
    "root_password",
    "root_pass",
    "admin_user",
    "admin_password",
    "admin_pass",
    "admin_email",
    "aws_ssh_user",
    "aws_access_key_id",
    "aws_secret_access_key",
    "db_user",
    "db_password",
    "db_pass",
    "account",
    "login",
    "cred",
    "credential",
    "bearer",
    "session_token",
    "refresh_token",
];

fn ipv4_pattern() -> String {
    let octet = r"(?:25[0-5]|2[0-4][0-9]|[01]?[0-9]{1,2})";
    format!(r"\b(?:{octet}\.){{3}}{octet}(?:[:\\]\d+)?\b")
}

fn mac_pattern() -> String {
    r"\b(?:[0-9A-Fa-f]{2}:){5}[0-9A-Fa-f]{2}\b".to_string()
}

/// `regex` has no lookaround, so the "slash at a non-word boundary" rule is
/// expressed as a leading boundary-or-start group (captured separately) plus
/// the path body; callers must use capture group 1 as the real match span.
fn file_dir_pattern() -> String {
    r"(?:^|[^A-Za-z0-9_/])(/[^\s:\t]+)\b".to_string()
}

fn cred_pattern() -> String {
    let alternation = CRED_KEYWORDS
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    format!(r"(?i)\b(?:{alternation})(?:[:=\s]+)\S+")
}

/// A named category backed by a compiled regex, immutable after construction.
pub struct Detector {
    pub category: Category,
    regex: Regex,
    /// When `Some`, the real match span is capture group 1, not group 0
    /// (needed for `FILE_DIR`'s boundary-workaround pattern).
    capture_group: Option<usize>,
}

impl Detector {
    fn new(category: Category, pattern: &str, capture_group: Option<usize>) -> Self {
        let regex = Regex::new(pattern).expect("detector pattern must compile");
        Self {
            category,
            regex,
            capture_group,
        }
    }

    /// Iterate non-overlapping matches in `text` as `(start, end, matched)`.
    pub fn matches<'s, 't>(&'s self, text: &'t str) -> impl Iterator<Item = (usize, usize, &'t str)> + 't
    where
        's: 't,
    {
        let group = self.capture_group;
        self.regex.captures_iter(text).filter_map(move |caps| {
            let m = match group {
                Some(idx) => caps.get(idx)?,
                None => caps.get(0)?,
            };
            Some((m.start(), m.end(), m.as_str()))
        })
    }
}

/// The full detector set, one per [`Category`], compiled once and shared
/// read-only across workers for the lifetime of a run.
pub struct DetectorSet {
    detectors: Vec<Detector>,
    salt: String,
}

impl DetectorSet {
    pub fn new(salt: impl Into<String>) -> Self {
        let detectors = vec![
            Detector::new(Category::File, &file_dir_pattern(), Some(1)),
            Detector::new(Category::Cred, &cred_pattern(), None),
            Detector::new(Category::Mac, &mac_pattern(), None),
            Detector::new(Category::Ip, &ipv4_pattern(), None),
        ];
        Self {
            detectors,
            salt: salt.into(),
        }
    }

    /// Detectors in tier 0 (`FILE_DIR`, `CRED`, `MAC`), applied before tier 1.
    pub fn tier0(&self) -> impl Iterator<Item = &Detector> {
        self.detectors.iter().filter(|d| d.category.tier() == 0)
    }

    /// Detectors in tier 1 (`IPV4`), applied after tier 0.
    pub fn tier1(&self) -> impl Iterator<Item = &Detector> {
        self.detectors.iter().filter(|d| d.category.tier() == 1)
    }

    pub fn all(&self) -> impl Iterator<Item = &Detector> {
        self.detectors.iter()
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// `{{TAG-HASH8}}` for a literal matched by `category`, per §4.1.
    pub fn placeholder(&self, category: Category, literal: &str) -> String {
        placeholder(category, &self.salt, literal)
    }
}

fn digest8(input: &str) -> String {
    let digest = md5::compute(input.as_bytes());
    format!("{digest:x}")[..8].to_string()
}

/// Pure function of `(category, salt, lower(literal))`. Two processes with
/// the same salt produce identical placeholders for the same literal.
pub fn placeholder(category: Category, salt: &str, literal: &str) -> String {
    let seed1 = digest8(&format!("{}{}", category.tag(), salt));
    let seed2 = digest8(&format!("{}{}", seed1, literal.to_lowercase()));
    format!("{{{{{}-{}}}}}", category.tag(), seed2)
}

/// Replace every tier-0 then tier-1 detector match in `line`, applying each
/// tier to the result of the previous one so a wider match (e.g. a path)
/// consumes any narrower literal (e.g. an IP) nested inside it.
pub fn scrub_line(detectors: &DetectorSet, line: &str) -> String {
    let mut current = line.to_string();
    for tier in [0usize, 1usize] {
        let iter: Box<dyn Iterator<Item = &Detector>> = if tier == 0 {
            Box::new(detectors.tier0())
        } else {
            Box::new(detectors.tier1())
        };
        for detector in iter {
            current = replace_matches(detector, &current, |lit| {
                detectors.placeholder(detector.category, lit)
            });
        }
    }
    current
}

fn replace_matches(detector: &Detector, text: &str, mut replacement: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0usize;
    for (start, end, matched) in detector.matches(text) {
        if start < last {
            continue; // overlapping match already consumed
        }
        out.push_str(&text[last..start]);
        out.push_str(&replacement(matched));
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_deterministic() {
        let a = placeholder(Category::Ip, "1234", "10.20.30.40");
        let b = placeholder(Category::Ip, "1234", "10.20.30.40");
        assert_eq!(a, b);
        assert!(a.starts_with("{{IP-"));
        assert!(a.ends_with("}}"));
    }

    #[test]
    fn placeholder_varies_by_salt() {
        let a = placeholder(Category::Ip, "1234", "10.20.30.40");
        let b = placeholder(Category::Ip, "5678", "10.20.30.40");
        assert_ne!(a, b);
    }

    #[test]
    fn placeholder_is_case_insensitive_on_literal() {
        let a = placeholder(Category::Mac, "1234", "AA:BB:CC:DD:EE:FF");
        let b = placeholder(Category::Mac, "1234", "aa:bb:cc:dd:ee:ff");
        assert_eq!(a, b);
    }

    #[test]
    fn ipv4_only() {
        let d = DetectorSet::new("1234");
        let out = scrub_line(&d, "connect from 10.20.30.40 ok");
        assert!(!out.contains("10.20.30.40"));
        assert!(out.contains("{{IP-"));
    }

    #[test]
    fn ip_inside_path_is_not_double_matched() {
        let d = DetectorSet::new("1234");
        let out = scrub_line(&d, "path /var/log/10.0.0.1.log failed");
        assert!(!out.contains("10.0.0.1"));
        assert!(out.contains("{{FILE-"));
        assert!(!out.contains("{{IP-"));
    }

    #[test]
    fn credential_pair_replaced_whole() {
        let d = DetectorSet::new("1234");
        let out = scrub_line(&d, "ssh_user: admin");
        assert!(!out.contains("admin"));
        assert!(out.contains("{{CRED-"));
    }

    #[test]
    fn mac_and_ip_same_line() {
        let d = DetectorSet::new("1234");
        let out = scrub_line(&d, "host aa:bb:cc:dd:ee:ff at 192.168.1.1");
        assert!(out.contains("{{MAC-"));
        assert!(out.contains("{{IP-"));
        assert!(!out.contains("192.168.1.1"));
    }

    #[test]
    fn relative_fragment_not_matched_as_path() {
        let d = DetectorSet::new("1234");
        let out = scrub_line(&d, "a/b/c is a relative fragment");
        assert!(!out.contains("{{FILE-"));
    }
}
