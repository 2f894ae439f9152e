//! Marker regions: user-editable spans of generated files that survive
//! regeneration.
//!
//! A region is delimited by two comment lines:
//!
//! ```text
//! # +opforge:static:begin:role-labels
//! app.kubernetes.io/part-of: shop
//! # +opforge:static:end:role-labels
//! ```
//!
//! `//` works as the comment leader as well. Regions do not nest and a name
//! appears at most once per file. Parsing is byte-exact: rendering a parsed
//! document reproduces its input.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::MarkerError;
use crate::spec::MarkerScope;

static MARKER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?://|#)\s*\+opforge:(static|dynamic):(begin|end):([A-Za-z0-9][A-Za-z0-9_.-]*)\s*$",
    )
    .expect("marker pattern is valid")
});

/// One delimited region, with its delimiter lines kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub scope: MarkerScope,
    pub begin: String,
    pub body: String,
    pub end: String,
    /// 1-based line of the begin marker.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Region(Region),
}

/// A document split into plain text and marker regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkedDocument {
    segments: Vec<Segment>,
}

/// Outcome of merging a fresh rendering with the file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub content: String,
    /// Regions present on disk that the fresh rendering no longer contains.
    pub dropped: Vec<String>,
}

struct Delimiter<'a> {
    scope: MarkerScope,
    begin: bool,
    name: &'a str,
}

fn delimiter(line: &str) -> Option<Delimiter<'_>> {
    let caps = MARKER_LINE.captures(line.trim_end_matches(['\n', '\r']))?;
    let scope = MarkerScope::parse(caps.get(1)?.as_str())?;
    let begin = caps.get(2)?.as_str() == "begin";
    let name = caps.get(3)?.as_str();
    Some(Delimiter { scope, begin, name })
}

impl MarkedDocument {
    pub fn parse(text: &str) -> Result<Self, MarkerError> {
        let mut segments = Vec::new();
        let mut text_buf = String::new();
        let mut open: Option<Region> = None;
        let mut seen: HashSet<String> = HashSet::new();

        for (idx, line) in text.split_inclusive('\n').enumerate() {
            let lineno = idx + 1;
            let Some(marker) = delimiter(line) else {
                match open.as_mut() {
                    Some(region) => region.body.push_str(line),
                    None => text_buf.push_str(line),
                }
                continue;
            };

            if marker.begin {
                if let Some(outer) = &open {
                    return Err(MarkerError::Nested {
                        outer: outer.name.clone(),
                        inner: marker.name.to_string(),
                        line: lineno,
                    });
                }
                if !seen.insert(marker.name.to_string()) {
                    return Err(MarkerError::Duplicate {
                        name: marker.name.to_string(),
                        line: lineno,
                    });
                }
                if !text_buf.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text_buf)));
                }
                open = Some(Region {
                    name: marker.name.to_string(),
                    scope: marker.scope,
                    begin: line.to_string(),
                    body: String::new(),
                    end: String::new(),
                    line: lineno,
                });
                continue;
            }

            let Some(mut region) = open.take() else {
                return Err(MarkerError::UnexpectedEnd {
                    name: marker.name.to_string(),
                    line: lineno,
                });
            };
            if region.name != marker.name {
                return Err(MarkerError::MismatchedEnd {
                    open: region.name,
                    found: marker.name.to_string(),
                    line: lineno,
                });
            }
            if region.scope != marker.scope {
                return Err(MarkerError::ScopeMismatch {
                    name: region.name,
                    begin: region.scope.to_string(),
                    end: marker.scope.to_string(),
                    line: lineno,
                });
            }
            region.end = line.to_string();
            segments.push(Segment::Region(region));
        }

        if let Some(region) = open {
            return Err(MarkerError::Unclosed {
                name: region.name,
                line: region.line,
            });
        }
        if !text_buf.is_empty() {
            segments.push(Segment::Text(text_buf));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Region(r) => Some(r),
            Segment::Text(_) => None,
        })
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions().find(|r| r.name == name)
    }

    /// Reassemble the document text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Region(r) => {
                    out.push_str(&r.begin);
                    out.push_str(&r.body);
                    out.push_str(&r.end);
                }
            }
        }
        out
    }
}

/// Merge a fresh rendering with the document currently on disk.
///
/// Text outside regions always comes from `fresh`. Static regions take the
/// existing body when one exists; dynamic regions keep the existing body and
/// append the fresh default lines it is missing.
pub fn merge(fresh: &MarkedDocument, existing: &MarkedDocument) -> Merged {
    let mut content = String::new();
    for segment in fresh.segments() {
        match segment {
            Segment::Text(text) => content.push_str(text),
            Segment::Region(region) => {
                content.push_str(&region.begin);
                match existing.region(&region.name) {
                    None => content.push_str(&region.body),
                    Some(prev) => match region.scope {
                        MarkerScope::Static => content.push_str(&prev.body),
                        MarkerScope::Dynamic => {
                            content.push_str(&union_lines(&prev.body, &region.body))
                        }
                    },
                }
                content.push_str(&region.end);
            }
        }
    }

    let dropped = existing
        .regions()
        .filter(|r| fresh.region(&r.name).is_none())
        .map(|r| r.name.clone())
        .collect();
    Merged { content, dropped }
}

fn union_lines(existing: &str, defaults: &str) -> String {
    let mut present: HashSet<String> = existing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    let mut out = existing.to_string();
    for line in defaults.split_inclusive('\n') {
        let key = line.trim();
        if key.is_empty() || !present.insert(key.to_string()) {
            continue;
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(line);
        if !line.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRESH: &str = "\
kind: ClusterRole
labels:
  # +opforge:static:begin:role-labels
  app: shop
  # +opforge:static:end:role-labels
rules:
  # +opforge:dynamic:begin:dependency-rules
  - gadgets
  - caches
  # +opforge:dynamic:end:dependency-rules
";

    #[test]
    fn test_parse_is_byte_exact() {
        let doc = MarkedDocument::parse(FRESH).unwrap();
        assert_eq!(doc.render(), FRESH);
        let names: Vec<_> = doc.regions().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["role-labels", "dependency-rules"]);
        assert_eq!(doc.region("role-labels").unwrap().line, 3);
    }

    #[test]
    fn test_go_comment_leader() {
        let text = "package x\n// +opforge:static:begin:imports\nimport \"fmt\"\n// +opforge:static:end:imports\n";
        let doc = MarkedDocument::parse(text).unwrap();
        assert_eq!(doc.region("imports").unwrap().body, "import \"fmt\"\n");
    }

    #[test]
    fn test_static_region_keeps_existing_body() {
        let existing = FRESH.replace("  app: shop\n", "  app: shop\n  team: payments\n");
        let merged = merge(
            &MarkedDocument::parse(FRESH).unwrap(),
            &MarkedDocument::parse(&existing).unwrap(),
        );
        assert!(merged.content.contains("  team: payments\n"));
        assert!(merged.dropped.is_empty());
    }

    #[test]
    fn test_static_region_keeps_emptied_body() {
        let existing = FRESH.replace("  app: shop\n", "");
        let merged = merge(
            &MarkedDocument::parse(FRESH).unwrap(),
            &MarkedDocument::parse(&existing).unwrap(),
        );
        assert!(!merged.content.contains("app: shop"));
    }

    #[test]
    fn test_dynamic_region_appends_missing_defaults() {
        let existing = FRESH.replace("  - caches\n", "  - custom\n");
        let merged = merge(
            &MarkedDocument::parse(FRESH).unwrap(),
            &MarkedDocument::parse(&existing).unwrap(),
        );
        let body = MarkedDocument::parse(&merged.content)
            .unwrap()
            .region("dependency-rules")
            .unwrap()
            .body
            .clone();
        assert_eq!(body, "  - gadgets\n  - custom\n  - caches\n");
    }

    #[test]
    fn test_merge_is_stable() {
        let existing = FRESH.replace("  - caches\n", "  - custom\n");
        let fresh = MarkedDocument::parse(FRESH).unwrap();
        let once = merge(&fresh, &MarkedDocument::parse(&existing).unwrap()).content;
        let twice = merge(&fresh, &MarkedDocument::parse(&once).unwrap()).content;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_text_outside_regions_is_regenerated() {
        let existing = FRESH.replace("kind: ClusterRole", "kind: Role");
        let merged = merge(
            &MarkedDocument::parse(FRESH).unwrap(),
            &MarkedDocument::parse(&existing).unwrap(),
        );
        assert!(merged.content.starts_with("kind: ClusterRole\n"));
    }

    #[test]
    fn test_regions_no_longer_rendered_are_reported() {
        let existing = format!("{FRESH}# +opforge:static:begin:old\nx\n# +opforge:static:end:old\n");
        let merged = merge(
            &MarkedDocument::parse(FRESH).unwrap(),
            &MarkedDocument::parse(&existing).unwrap(),
        );
        assert_eq!(merged.dropped, ["old"]);
        assert!(!merged.content.contains("old"));
    }

    #[test]
    fn test_unclosed_region() {
        let err = MarkedDocument::parse("# +opforge:static:begin:a\nx\n").unwrap_err();
        assert_eq!(
            err,
            MarkerError::Unclosed {
                name: "a".into(),
                line: 1
            }
        );
    }

    #[test]
    fn test_unexpected_end() {
        let err = MarkedDocument::parse("x\n# +opforge:static:end:a\n").unwrap_err();
        assert_eq!(
            err,
            MarkerError::UnexpectedEnd {
                name: "a".into(),
                line: 2
            }
        );
    }

    #[test]
    fn test_mismatched_end() {
        let err = MarkedDocument::parse("# +opforge:static:begin:a\n# +opforge:static:end:b\n")
            .unwrap_err();
        assert!(matches!(err, MarkerError::MismatchedEnd { line: 2, .. }));
    }

    #[test]
    fn test_scope_mismatch() {
        let err = MarkedDocument::parse("# +opforge:static:begin:a\n# +opforge:dynamic:end:a\n")
            .unwrap_err();
        assert!(matches!(err, MarkerError::ScopeMismatch { .. }));
    }

    #[test]
    fn test_nested_region() {
        let err = MarkedDocument::parse(
            "# +opforge:static:begin:a\n# +opforge:static:begin:b\n# +opforge:static:end:b\n# +opforge:static:end:a\n",
        )
        .unwrap_err();
        assert_eq!(
            err,
            MarkerError::Nested {
                outer: "a".into(),
                inner: "b".into(),
                line: 2
            }
        );
    }

    #[test]
    fn test_duplicate_region() {
        let text = "# +opforge:static:begin:a\n# +opforge:static:end:a\n# +opforge:static:begin:a\n# +opforge:static:end:a\n";
        assert!(matches!(
            MarkedDocument::parse(text).unwrap_err(),
            MarkerError::Duplicate { line: 3, .. }
        ));
    }

    #[test]
    fn test_marker_like_text_inside_values_is_ignored() {
        let text = "note: \"+opforge:static:begin:a\"\n";
        let doc = MarkedDocument::parse(text).unwrap();
        assert_eq!(doc.regions().count(), 0);
    }
}
