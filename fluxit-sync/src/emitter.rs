//! Style-preserving YAML emitter.
//!
//! The event stream from `yaml-rust2` is folded into a small node tree that
//! remembers each scalar's quoting style, then written back out in one fixed
//! block layout:
//!
//! ```text
//! key:
//!   nested: 'single quoted kept'
//!   list:
//!     - plain
//!     - name: first key on the dash line
//!       other: "double quoted kept"
//! ```
//!
//! Mappings indent by 2, sequence dashes sit 2 in from their parent key and
//! item content 4 in. Comments, flow layout and original anchor names are not
//! carried over; anchors become `id001`, `id002`, ... in order of appearance.

use std::collections::HashMap;
use std::fmt::Write as _;

use yaml_rust2::parser::{Event, EventReceiver, Parser, Tag};
use yaml_rust2::scanner::{ScanError, TScalarStyle};

// ---------------------------------------------------------------------------
// Node tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl From<TScalarStyle> for Style {
    fn from(style: TScalarStyle) -> Self {
        match style {
            TScalarStyle::SingleQuoted => Style::SingleQuoted,
            TScalarStyle::DoubleQuoted => Style::DoubleQuoted,
            TScalarStyle::Literal => Style::Literal,
            TScalarStyle::Plain => Style::Plain,
            _ => Style::Folded,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Props {
    anchor: usize,
    tag: Option<String>,
}

impl Props {
    fn new(anchor: usize, tag: Option<Tag>) -> Self {
        Props {
            anchor,
            tag: tag.as_ref().map(tag_text),
        }
    }

    fn is_empty(&self) -> bool {
        self.anchor == 0 && self.tag.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Scalar {
        value: String,
        style: Style,
        props: Props,
    },
    Sequence {
        items: Vec<Node>,
        props: Props,
    },
    Mapping {
        entries: Vec<(Node, Node)>,
        props: Props,
    },
    Alias(usize),
}

fn tag_text(tag: &Tag) -> String {
    match tag.handle.as_str() {
        "tag:yaml.org,2002:" => format!("!!{}", tag.suffix),
        "!" | "!!" => format!("{}{}", tag.handle, tag.suffix),
        handle => format!("!<{handle}{}>", tag.suffix),
    }
}

// ---------------------------------------------------------------------------
// Event stream → node tree
// ---------------------------------------------------------------------------

enum Frame {
    Sequence(Vec<Node>, Props),
    Mapping(Vec<(Node, Node)>, Option<Node>, Props),
}

#[derive(Default)]
struct TreeBuilder {
    documents: Vec<Node>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.documents.push(node),
            Some(Frame::Sequence(items, _)) => items.push(node),
            Some(Frame::Mapping(entries, pending, _)) => match pending.take() {
                Some(key) => entries.push((key, node)),
                None => *pending = Some(node),
            },
        }
    }
}

impl EventReceiver for TreeBuilder {
    fn on_event(&mut self, ev: Event) {
        match ev {
            Event::Scalar(value, style, anchor, tag) => self.push(Node::Scalar {
                value,
                style: style.into(),
                props: Props::new(anchor, tag),
            }),
            Event::Alias(id) => self.push(Node::Alias(id)),
            Event::SequenceStart(anchor, tag) => self
                .stack
                .push(Frame::Sequence(Vec::new(), Props::new(anchor, tag))),
            Event::MappingStart(anchor, tag) => self
                .stack
                .push(Frame::Mapping(Vec::new(), None, Props::new(anchor, tag))),
            Event::SequenceEnd | Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Sequence(items, props)) => self.push(Node::Sequence { items, props }),
                Some(Frame::Mapping(entries, _, props)) => {
                    self.push(Node::Mapping { entries, props })
                }
                None => {}
            },
            _ => {}
        }
    }
}

fn parse_stream(content: &str) -> Result<Vec<Node>, ScanError> {
    let mut builder = TreeBuilder::default();
    Parser::new_from_str(content).load(&mut builder, true)?;
    Ok(builder.documents)
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Parse `content` and write it back in canonical layout.
pub(crate) fn canonical_text(content: &str) -> Result<String, ScanError> {
    let documents = parse_stream(content)?;
    let mut emitter = Emitter::default();
    for (i, doc) in documents.iter().enumerate() {
        if i > 0 {
            emitter.out.push_str("---\n");
        }
        emitter.document(doc);
    }
    Ok(emitter.out)
}

#[derive(Default)]
struct Emitter {
    out: String,
    anchors: HashMap<usize, usize>,
}

impl Emitter {
    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat(' ').take(indent));
    }

    fn anchor_name(&mut self, id: usize) -> String {
        let next = self.anchors.len() + 1;
        let n = *self.anchors.entry(id).or_insert(next);
        format!("id{n:03}")
    }

    fn props(&mut self, props: &Props) -> String {
        let mut parts = Vec::new();
        if props.anchor != 0 {
            parts.push(format!("&{}", self.anchor_name(props.anchor)));
        }
        if let Some(tag) = &props.tag {
            parts.push(tag.clone());
        }
        parts.join(" ")
    }

    /// Single-line rendering, or `None` when the node needs block layout.
    fn inline(&mut self, node: &Node) -> Option<String> {
        match node {
            Node::Alias(id) => Some(format!("*{}", self.anchor_name(*id))),
            Node::Scalar { value, style, props } => {
                if block_style(value, *style).is_some() {
                    return None;
                }
                let props = self.props(props);
                let text = if is_plain_null(value, *style) {
                    String::new()
                } else {
                    quote_scalar(value, *style)
                };
                Some(join_props(&props, &text))
            }
            Node::Sequence { items, props } if items.is_empty() => {
                let props = self.props(props);
                Some(join_props(&props, "[]"))
            }
            Node::Mapping { entries, props } if entries.is_empty() => {
                let props = self.props(props);
                Some(join_props(&props, "{}"))
            }
            Node::Sequence { .. } | Node::Mapping { .. } => None,
        }
    }

    /// Flow rendering, used for mapping keys that are not simple scalars.
    fn flow(&mut self, node: &Node) -> String {
        match node {
            Node::Alias(id) => format!("*{}", self.anchor_name(*id)),
            Node::Scalar { value, style, props } => {
                let props = self.props(props);
                let style = match style {
                    Style::Literal | Style::Folded => Style::DoubleQuoted,
                    other => *other,
                };
                join_props(&props, &quote_scalar(value, style))
            }
            Node::Sequence { items, props } => {
                let props = self.props(props);
                let items: Vec<String> = items.iter().map(|item| self.flow(item)).collect();
                join_props(&props, &format!("[{}]", items.join(", ")))
            }
            Node::Mapping { entries, props } => {
                let props = self.props(props);
                let mut parts = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    let key = self.flow(k);
                    let value = self.flow(v);
                    parts.push(format!("{key}: {value}"));
                }
                join_props(&props, &format!("{{{}}}", parts.join(", ")))
            }
        }
    }

    fn key(&mut self, node: &Node) -> String {
        match node {
            Node::Alias(_) => format!("{} ", self.flow(node)),
            Node::Scalar { value, style, props } if is_plain_null(value, *style) => {
                let props = self.props(props);
                join_props(&props, "~")
            }
            Node::Scalar { .. } => match self.inline(node) {
                Some(text) if !text.is_empty() => text,
                _ => self.flow(node),
            },
            _ => self.flow(node),
        }
    }

    fn document(&mut self, node: &Node) {
        if let Some(text) = self.inline(node) {
            self.out.push_str(if text.is_empty() { "~" } else { &text });
            self.out.push('\n');
            return;
        }
        match node {
            Node::Mapping { entries, props } => {
                let props = self.props(props);
                if !props.is_empty() {
                    self.out.push_str(&props);
                    self.out.push('\n');
                }
                self.mapping(entries, 0, false);
            }
            Node::Sequence { items, props } => {
                let props = self.props(props);
                if !props.is_empty() {
                    self.out.push_str(&props);
                    self.out.push('\n');
                }
                self.sequence(items, 0, false);
            }
            Node::Scalar { value, style, props } => {
                let props = self.props(props);
                self.block_scalar(value, *style, &props, 0);
            }
            Node::Alias(_) => {}
        }
    }

    /// Write the value half of `key:` (the key sits at column `indent`).
    fn value(&mut self, node: &Node, indent: usize) {
        if let Some(text) = self.inline(node) {
            if !text.is_empty() {
                self.out.push(' ');
                self.out.push_str(&text);
            }
            self.out.push('\n');
            return;
        }
        match node {
            Node::Mapping { entries, props } => {
                self.collection_props(props);
                self.mapping(entries, indent + 2, false);
            }
            Node::Sequence { items, props } => {
                self.collection_props(props);
                self.sequence(items, indent + 2, false);
            }
            Node::Scalar { value, style, props } => {
                let props = self.props(props);
                self.out.push(' ');
                self.block_scalar(value, *style, &props, indent);
            }
            Node::Alias(_) => {}
        }
    }

    fn collection_props(&mut self, props: &Props) {
        let props = self.props(props);
        if !props.is_empty() {
            self.out.push(' ');
            self.out.push_str(&props);
        }
        self.out.push('\n');
    }

    fn mapping(&mut self, entries: &[(Node, Node)], indent: usize, first_inline: bool) {
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 || !first_inline {
                self.pad(indent);
            }
            let key = self.key(key);
            self.out.push_str(&key);
            self.out.push(':');
            self.value(value, indent);
        }
    }

    /// Write sequence items with their dash at column `indent`.
    fn sequence(&mut self, items: &[Node], indent: usize, first_inline: bool) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 || !first_inline {
                self.pad(indent);
            }
            self.out.push('-');
            if let Some(text) = self.inline(item) {
                if !text.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(&text);
                }
                self.out.push('\n');
                continue;
            }
            match item {
                Node::Mapping { entries, props } if props.is_empty() => {
                    self.out.push(' ');
                    self.mapping(entries, indent + 2, true);
                }
                Node::Sequence { items, props } if props.is_empty() => {
                    self.out.push(' ');
                    self.sequence(items, indent + 2, true);
                }
                Node::Mapping { entries, props } => {
                    self.collection_props(props);
                    self.mapping(entries, indent + 2, false);
                }
                Node::Sequence { items, props } => {
                    self.collection_props(props);
                    self.sequence(items, indent + 2, false);
                }
                Node::Scalar { value, style, props } => {
                    let props = self.props(props);
                    self.out.push(' ');
                    self.block_scalar(value, *style, &props, indent);
                }
                Node::Alias(_) => {}
            }
        }
    }

    /// Write a literal or folded scalar whose parent sits at column `indent`.
    fn block_scalar(&mut self, value: &str, style: Style, props: &str, indent: usize) {
        let Some(indicator) = block_style(value, style) else {
            let text = join_props(props, &quote_scalar(value, Style::DoubleQuoted));
            self.out.push_str(&text);
            self.out.push('\n');
            return;
        };

        let body = value.trim_end_matches('\n');
        let trailing = value.len() - body.len();
        let chomp = match trailing {
            0 => "-",
            1 => "",
            _ => "+",
        };
        let explicit_indent = if body.trim_start_matches('\n').starts_with([' ', '\t']) {
            "2"
        } else {
            ""
        };
        if !props.is_empty() {
            self.out.push_str(props);
            self.out.push(' ');
        }
        let _ = writeln!(self.out, "{indicator}{explicit_indent}{chomp}");

        let lines = match indicator {
            '>' => fold_lines(body),
            _ => body.split('\n').map(str::to_string).collect(),
        };
        for line in lines {
            if !line.is_empty() {
                self.pad(indent + 2);
                self.out.push_str(&line);
            }
            self.out.push('\n');
        }
        for _ in 1..trailing {
            self.out.push('\n');
        }
    }
}

// ---------------------------------------------------------------------------
// Scalar helpers
// ---------------------------------------------------------------------------

/// An empty or `~` plain scalar. Written as nothing after a key, an item
/// dash or props.
fn is_plain_null(value: &str, style: Style) -> bool {
    style == Style::Plain && (value == "~" || value.is_empty())
}

fn join_props(props: &str, text: &str) -> String {
    match (props.is_empty(), text.is_empty()) {
        (true, _) => text.to_string(),
        (false, true) => props.to_string(),
        (false, false) => format!("{props} {text}"),
    }
}

/// Block indicator for scalars that keep block style, if any.
///
/// Folded scalars whose lines cannot be folded back losslessly are written
/// literally; block scalars with no content fall back to double quotes.
fn block_style(value: &str, style: Style) -> Option<char> {
    let body = value.trim_end_matches('\n');
    if body.is_empty() {
        return None;
    }
    match style {
        Style::Literal => Some('|'),
        Style::Folded => {
            let foldable = !body.starts_with('\n')
                && body
                    .split('\n')
                    .all(|line| !line.starts_with([' ', '\t']));
            Some(if foldable { '>' } else { '|' })
        }
        _ => None,
    }
}

/// Lines for a folded scalar: a run of `n` newlines needs `n` blank lines.
fn fold_lines(body: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut segments = body.split('\n').peekable();
    while let Some(segment) = segments.next() {
        lines.push(segment.to_string());
        if segment.is_empty() {
            continue;
        }
        if segments.peek().is_some() {
            lines.push(String::new());
        }
    }
    lines
}

fn quote_scalar(value: &str, style: Style) -> String {
    match style {
        Style::Plain if !value.contains('\n') && !value.is_empty() => value.to_string(),
        Style::SingleQuoted if !value.contains('\n') => format!("'{}'", value.replace('\'', "''")),
        Style::Plain if value.is_empty() => "''".to_string(),
        _ => double_quote(value),
    }
}

fn double_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
