//! Catalog strategy (the "low level" strategy by CLI name): precompute a
//! per-file segment catalog of distinct literals, then rewrite the file by
//! substituting each literal for its placeholder in tier-then-length order.
//!
//! SPEC_FULL.md §4.3/§9 reimplements this natively instead of shelling out to
//! `sed`/`rg`/`sort`: the catalog is collected with the compiled detector
//! regexes directly, and the rewrite is a sequence of in-memory literal
//! substitutions rather than externally-built `sed` command chunks.
use std::collections::HashSet;

use crate::context::Context;
use crate::detectors::Category;

/// Outcome of scanning one file's content for distinct literals.
pub enum Classification {
    /// `total` distinct literals reached `threshold` before all tiers
    /// finished scanning; the caller should fall back to a streaming
    /// strategy instead of building a (too-large) catalog.
    Reject,
    /// No detector matched anything; nothing to rewrite.
    Empty,
    Accept(SegmentCatalog),
}

/// `Category -> distinct literals`, sorted by decreasing length within each
/// category so a longer match is substituted before a literal that is one of
/// its suffixes (invariant #4).
#[derive(Debug, Default, Clone)]
pub struct SegmentCatalog {
    entries: Vec<(Category, Vec<String>)>,
}

impl SegmentCatalog {
    pub fn total_literals(&self) -> usize {
        self.entries.iter().map(|(_, lits)| lits.len()).sum()
    }

    /// Categories in tier order (tier 0 before tier 1), each already sorted
    /// by decreasing literal length.
    pub fn tiers_in_order(&self) -> impl Iterator<Item = &(Category, Vec<String>)> {
        self.entries.iter()
    }
}

/// Strip a trailing `'` (shell-quoting artifact) then surrounding whitespace.
/// A deliberate heuristic (SPEC_FULL.md §9); it can over-strip legitimate
/// content ending in a literal apostrophe, and that is accepted.
fn clean_suffix(literal: &str) -> String {
    let trimmed = literal.trim();
    trimmed.strip_suffix('\'').unwrap_or(trimmed).trim().to_string()
}

/// Scan `content` once per detector tier, collecting distinct literals.
/// Returns `Reject` as soon as the running total reaches `threshold` (when
/// `enforce_threshold` is set), without necessarily finishing later tiers.
pub fn classify(context: &Context, content: &str, threshold: usize, enforce_threshold: bool) -> Classification {
    let mut entries: Vec<(Category, Vec<String>)> = Vec::new();
    let mut total = 0usize;

    let tiers: [Box<dyn Iterator<Item = &crate::detectors::Detector>>; 2] =
        [Box::new(context.detectors.tier0()), Box::new(context.detectors.tier1())];
    for tier in tiers {
        for detector in tier {
            let mut seen: HashSet<String> = HashSet::new();
            for (_, _, matched) in detector.matches(content) {
                seen.insert(clean_suffix(matched));
            }
            if seen.is_empty() {
                continue;
            }
            let mut literals: Vec<String> = seen.into_iter().collect();
            literals.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            total += literals.len();
            entries.push((detector.category, literals));
            if enforce_threshold && total >= threshold {
                return Classification::Reject;
            }
        }
    }

    if total == 0 {
        return Classification::Empty;
    }
    Classification::Accept(SegmentCatalog { entries })
}

/// Apply every catalog entry's substitutions, tier-then-length order, each
/// literal replaced everywhere it occurs in `content`.
pub fn rewrite(context: &Context, content: &str, catalog: &SegmentCatalog) -> String {
    let mut out = content.to_string();
    for (category, literals) in catalog.tiers_in_order() {
        for literal in literals {
            if literal.is_empty() {
                continue;
            }
            let placeholder = context.placeholder(*category, literal);
            out = out.replace(literal.as_str(), &placeholder);
        }
    }
    out
}

/// Fixed-tag variant used only by the `RIPGREP` strategy name: one pass per
/// detector directly over `content`, substituting a category-fixed token
/// instead of calling the placeholder digest. Does not achieve cross-strategy
/// placeholder agreement (SPEC_FULL.md §9, a flagged and intentional gap).
pub fn ripgrep_rewrite(context: &Context, content: &str) -> String {
    let mut out = content.to_string();
    for detector in context.detectors.tier0().chain(context.detectors.tier1()) {
        let tag = format!("{{{{{}}}}}", detector.category.tag());
        out = replace_detector_matches(detector, &out, &tag);
    }
    out
}

fn replace_detector_matches(detector: &crate::detectors::Detector, text: &str, replacement: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last = 0usize;
    for (start, end, _) in detector.matches(text) {
        if start < last {
            continue;
        }
        result.push_str(&text[last..start]);
        result.push_str(replacement);
        last = end;
    }
    result.push_str(&text[last..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_empty_when_nothing_matches() {
        let ctx = Context::new("1234");
        match classify(&ctx, "just plain text", 200, true) {
            Classification::Empty => {}
            _ => panic!("expected Empty"),
        }
    }

    #[test]
    fn classify_rejects_above_threshold() {
        let ctx = Context::new("1234");
        let content: String = (0..10)
            .map(|i| format!("10.0.0.{i}\n"))
            .collect();
        match classify(&ctx, &content, 5, true) {
            Classification::Reject => {}
            _ => panic!("expected Reject"),
        }
    }

    #[test]
    fn classify_accepts_below_threshold() {
        let ctx = Context::new("1234");
        let content = "10.0.0.1 10.0.0.2\n";
        match classify(&ctx, content, 200, true) {
            Classification::Accept(catalog) => assert_eq!(catalog.total_literals(), 2),
            _ => panic!("expected Accept"),
        }
    }

    #[test]
    fn rewrite_applies_longest_literal_first() {
        let ctx = Context::new("1234");
        let content = "path /var/log/app/app.log and /var/log/app\n";
        if let Classification::Accept(catalog) = classify(&ctx, content, 200, false) {
            let out = rewrite(&ctx, content, &catalog);
            assert!(!out.contains("/var/log/app"));
            assert!(out.contains("{{FILE-"));
        } else {
            panic!("expected Accept");
        }
    }

    #[test]
    fn rewrite_matches_streaming_placeholder() {
        let ctx = Context::new("1234");
        let content = "connect from 10.20.30.40 ok\n";
        let streamed = crate::detectors::scrub_line(&ctx.detectors, content.trim_end());
        if let Classification::Accept(catalog) = classify(&ctx, content, 200, false) {
            let out = rewrite(&ctx, content, &catalog);
            assert_eq!(out.trim_end(), streamed);
        } else {
            panic!("expected Accept");
        }
    }

    #[test]
    fn ripgrep_variant_uses_fixed_tag_not_hash() {
        let ctx = Context::new("1234");
        let out = ripgrep_rewrite(&ctx, "connect from 10.20.30.40 ok\n");
        assert!(out.contains("{{IP}}"));
        assert!(!out.contains("10.20.30.40"));
    }
}
