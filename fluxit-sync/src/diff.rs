//! Unified diff between existing and newly generated content.
//!
//! Lines come back tagged so a presentation layer can color them without
//! re-parsing the text.

use std::fmt;

use similar::{ChangeTag, TextDiff};

const CONTEXT_RADIUS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineKind {
    /// `--- a/name` or `+++ b/name`.
    FileHeader,
    /// `@@ -l,s +l,s @@`.
    Hunk,
    Added,
    Removed,
    Context,
}

/// One line of diff output, without its trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    pub text: String,
}

impl DiffLine {
    fn new(kind: DiffLineKind, text: impl Into<String>) -> Self {
        DiffLine {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedDiff {
    pub lines: Vec<DiffLine>,
}

impl UnifiedDiff {
    /// True when old and new content were identical.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiffLine> {
        self.lines.iter()
    }

    /// Number of added and removed lines.
    pub fn stats(&self) -> (usize, usize) {
        self.lines.iter().fold((0, 0), |(add, del), line| match line.kind {
            DiffLineKind::Added => (add + 1, del),
            DiffLineKind::Removed => (add, del + 1),
            _ => (add, del),
        })
    }
}

impl fmt::Display for UnifiedDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.text)?;
        }
        Ok(())
    }
}

/// Line diff of `old` → `new`, labelled `a/{name}` and `b/{name}`.
pub fn generate_diff(old: &str, new: &str, name: &str) -> UnifiedDiff {
    let text_diff = TextDiff::from_lines(old, new);
    let mut unified = text_diff.unified_diff();
    unified.context_radius(CONTEXT_RADIUS);

    let mut lines = Vec::new();
    for hunk in unified.iter_hunks() {
        if lines.is_empty() {
            lines.push(DiffLine::new(DiffLineKind::FileHeader, format!("--- a/{name}")));
            lines.push(DiffLine::new(DiffLineKind::FileHeader, format!("+++ b/{name}")));
        }
        lines.push(DiffLine::new(DiffLineKind::Hunk, hunk.header().to_string()));

        for change in hunk.iter_changes() {
            let (kind, sign) = match change.tag() {
                ChangeTag::Insert => (DiffLineKind::Added, '+'),
                ChangeTag::Delete => (DiffLineKind::Removed, '-'),
                ChangeTag::Equal => (DiffLineKind::Context, ' '),
            };
            let value = change.value();
            let value = value.strip_suffix('\n').unwrap_or(value);
            lines.push(DiffLine::new(kind, format!("{sign}{value}")));
            if change.missing_newline() {
                lines.push(DiffLine::new(
                    DiffLineKind::Context,
                    "\\ No newline at end of file",
                ));
            }
        }
    }
    UnifiedDiff { lines }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(diff: &UnifiedDiff) -> Vec<DiffLineKind> {
        diff.iter().map(|l| l.kind).collect()
    }

    #[test]
    fn identical_content_has_no_lines() {
        let diff = generate_diff("a: 1\n", "a: 1\n", "x.yaml");
        assert!(diff.is_empty());
        assert_eq!(diff.to_string(), "");
    }

    #[test]
    fn single_change_is_tagged() {
        let diff = generate_diff("a: 1\nb: 2\n", "a: 1\nb: 3\n", "deploy.yaml");
        use DiffLineKind::*;
        assert_eq!(
            kinds(&diff),
            vec![FileHeader, FileHeader, Hunk, Context, Removed, Added]
        );
        assert_eq!(diff.lines[0].text, "--- a/deploy.yaml");
        assert_eq!(diff.lines[1].text, "+++ b/deploy.yaml");
        assert_eq!(diff.lines[2].text, "@@ -1,2 +1,2 @@");
        assert_eq!(diff.lines[4].text, "-b: 2");
        assert_eq!(diff.lines[5].text, "+b: 3");
        assert_eq!(diff.stats(), (1, 1));
    }

    #[test]
    fn display_is_a_plain_unified_diff() {
        let diff = generate_diff("x\n", "y\n", "f");
        assert_eq!(diff.to_string(), "--- a/f\n+++ b/f\n@@ -1 +1 @@\n-x\n+y\n");
    }

    #[test]
    fn context_is_limited_to_three_lines() {
        let old: String = (1..=20).map(|i| format!("l{i}\n")).collect();
        let new = old.replace("l10\n", "changed\n");
        let diff = generate_diff(&old, &new, "f");
        let context = diff
            .iter()
            .filter(|l| l.kind == DiffLineKind::Context)
            .count();
        assert_eq!(context, 6);
        assert_eq!(diff.lines[2].text, "@@ -7,7 +7,7 @@");
    }

    #[test]
    fn missing_trailing_newline_is_marked() {
        let diff = generate_diff("a\n", "a\nb", "f");
        let last = diff.lines.last().expect("lines");
        assert_eq!(last.text, "\\ No newline at end of file");
        assert!(diff.iter().any(|l| l.kind == DiffLineKind::Added && l.text == "+b"));
    }
}
