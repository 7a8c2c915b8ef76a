//! Low-level markup scanning.
//!
//! A small, forgiving scanner tailored to the account portal's pages. It
//! builds a flat list of elements (tag name, attributes, parent, byte
//! ranges) in document order and answers the few queries the interpreter
//! needs: find by tag, inspect attributes, walk to the parent, collect text.
//!
//! It is not a conforming HTML parser. Tag and attribute names are matched
//! case-insensitively; `td`, `th`, `tr`, `li` and `p` are closed implicitly
//! the way browsers do; stray closing tags are ignored; unclosed elements
//! run to the end of the document.

use std::ops::Range;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

#[derive(Debug, Clone)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    parent: Option<usize>,
    /// Opening tag start .. end of closing tag.
    outer: Range<usize>,
    /// Between the opening and closing tags.
    inner: Range<usize>,
}

/// A scanned page. Borrows the source markup.
#[derive(Debug)]
pub struct Document<'a> {
    source: &'a str,
    nodes: Vec<Node>,
}

/// A handle to one element of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'d, 'a> {
    doc: &'d Document<'a>,
    index: usize,
}

impl<'a> Document<'a> {
    /// Scans `source`. Never fails; malformed markup yields fewer elements.
    pub fn parse(source: &'a str) -> Self {
        let mut nodes: Vec<Node> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        let mut pos = 0usize;

        while let Some(rel) = source[pos..].find('<') {
            let start = pos + rel;
            let rest = &source[start..];

            if let Some(comment) = rest.strip_prefix("<!--") {
                pos = comment
                    .find("-->")
                    .map_or(source.len(), |e| start + 4 + e + 3);
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                pos = rest.find('>').map_or(source.len(), |e| start + e + 1);
                continue;
            }

            if let Some(after) = rest.strip_prefix("</") {
                let name_len = after
                    .find(|c: char| !is_name_char(c))
                    .unwrap_or(after.len());
                let name = after[..name_len].to_ascii_lowercase();
                let end = rest.find('>').map_or(source.len(), |e| start + e + 1);
                if !name.is_empty() {
                    close_element(&mut nodes, &mut open, &name, start, end);
                }
                pos = end;
                continue;
            }

            let after = &rest[1..];
            if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                // A literal '<' in text.
                pos = start + 1;
                continue;
            }
            let name_len = after
                .find(|c: char| !is_name_char(c))
                .unwrap_or(after.len());
            let name = after[..name_len].to_ascii_lowercase();
            let (attrs, tag_end, self_closing) = parse_attributes(source, start + 1 + name_len);

            close_implicitly(&mut nodes, &mut open, &name, start);

            let index = nodes.len();
            nodes.push(Node {
                name: name.clone(),
                attrs,
                parent: open.last().copied(),
                outer: start..tag_end,
                inner: tag_end..tag_end,
            });

            if self_closing || VOID_TAGS.contains(&name.as_str()) {
                pos = tag_end;
                continue;
            }

            if RAW_TEXT_TAGS.contains(&name.as_str()) {
                let content_end = find_ci(&source[tag_end..], &format!("</{name}"))
                    .map_or(source.len(), |i| tag_end + i);
                let end = source[content_end..]
                    .find('>')
                    .map_or(source.len(), |i| content_end + i + 1);
                nodes[index].inner = tag_end..content_end;
                nodes[index].outer.end = end;
                pos = end;
                continue;
            }

            open.push(index);
            pos = tag_end;
        }

        for idx in open {
            nodes[idx].inner.end = source.len();
            nodes[idx].outer.end = source.len();
        }

        Self { source, nodes }
    }

    /// The markup this document was scanned from.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_, 'a>> + '_ {
        (0..self.nodes.len()).map(move |index| Element { doc: self, index })
    }

    /// All elements with the given tag name, in document order.
    pub fn find_all<'d>(&'d self, tag: &'d str) -> impl Iterator<Item = Element<'d, 'a>> + 'd {
        self.elements().filter(move |e| e.name().eq_ignore_ascii_case(tag))
    }

    /// Text of `<body>`, or of the whole document if there is none.
    pub fn body_text(&self) -> String {
        match self.find_all("body").next() {
            Some(body) => body.text(),
            None => text_of(self.source),
        }
    }
}

impl<'d, 'a> Element<'d, 'a> {
    fn node(&self) -> &'d Node {
        &self.doc.nodes[self.index]
    }

    /// Lower-cased tag name.
    pub fn name(&self) -> &'d str {
        &self.node().name
    }

    /// Entity-decoded attribute value; names match case-insensitively.
    pub fn attr(&self, name: &str) -> Option<&'d str> {
        self.node()
            .attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|token| token == class))
    }

    pub fn id(&self) -> Option<&'d str> {
        self.attr("id")
    }

    /// Markup between the opening and closing tags.
    pub fn inner_html(&self) -> &'a str {
        &self.doc.source[self.node().inner.clone()]
    }

    /// Decoded text content with tags removed. See [`text_of`].
    pub fn text(&self) -> String {
        text_of(self.inner_html())
    }

    pub fn parent(&self) -> Option<Element<'d, 'a>> {
        self.node().parent.map(|index| Element {
            doc: self.doc,
            index,
        })
    }

    /// Nearest ancestor with the given tag name.
    pub fn closest(&self, tag: &str) -> Option<Element<'d, 'a>> {
        let mut current = self.parent();
        while let Some(el) = current {
            if el.name().eq_ignore_ascii_case(tag) {
                return Some(el);
            }
            current = el.parent();
        }
        None
    }

    /// All elements nested inside this one, in document order.
    pub fn descendants(&self) -> impl Iterator<Item = Element<'d, 'a>> + 'd {
        let doc = self.doc;
        let inner = self.node().inner.clone();
        (self.index + 1..doc.nodes.len())
            .take_while(move |&i| doc.nodes[i].outer.start < inner.end)
            .map(move |index| Element { doc, index })
    }

    /// Same element?
    pub fn is(&self, other: &Element<'_, '_>) -> bool {
        self.index == other.index
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'
}

/// Case-insensitive (ASCII) substring search.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

/// Pops `name` and everything opened after it. Unmatched closers are ignored.
fn close_element(nodes: &mut [Node], open: &mut Vec<usize>, name: &str, start: usize, end: usize) {
    let Some(depth) = open.iter().rposition(|&i| nodes[i].name == name) else {
        return;
    };
    let matched = open[depth];
    for idx in open.drain(depth..) {
        nodes[idx].inner.end = start;
        nodes[idx].outer.end = start;
    }
    nodes[matched].outer.end = end;
}

/// Browser-style implicit closing for table cells, rows, list items and
/// paragraphs.
fn close_implicitly(nodes: &mut [Node], open: &mut Vec<usize>, name: &str, start: usize) {
    let closes: &[&str] = match name {
        "td" | "th" => &["td", "th"],
        "tr" => &["td", "th", "tr"],
        "li" => &["li"],
        "p" => &["p"],
        _ => return,
    };
    while let Some(&top) = open.last() {
        if !closes.contains(&nodes[top].name.as_str()) {
            break;
        }
        nodes[top].inner.end = start;
        nodes[top].outer.end = start;
        open.pop();
    }
}

/// Parses attributes from just after the tag name up to and including `>`.
/// Returns the attributes, the byte offset after the tag, and whether it
/// ended with `/>`.
fn parse_attributes(source: &str, from: usize) -> (Vec<(String, String)>, usize, bool) {
    let b = source.as_bytes();
    let len = b.len();
    let mut i = from;
    let mut attrs = Vec::new();

    loop {
        while i < len && b[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            return (attrs, len, false);
        }
        match b[i] {
            b'>' => return (attrs, i + 1, false),
            b'/' if b.get(i + 1) == Some(&b'>') => return (attrs, i + 2, true),
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let name_start = i;
        while i < len && !b[i].is_ascii_whitespace() && b[i] != b'=' && b[i] != b'>' {
            if b[i] == b'/' && b.get(i + 1) == Some(&b'>') {
                break;
            }
            i += 1;
        }
        if i == name_start {
            // Stray '='.
            i += 1;
            continue;
        }
        let name = source[name_start..i].to_ascii_lowercase();

        while i < len && b[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < len && b[i] == b'=' {
            i += 1;
            while i < len && b[i].is_ascii_whitespace() {
                i += 1;
            }
            let value = if i < len && (b[i] == b'"' || b[i] == b'\'') {
                let quote = b[i];
                i += 1;
                let value_start = i;
                while i < len && b[i] != quote {
                    i += 1;
                }
                let value = &source[value_start..i];
                if i < len {
                    i += 1;
                }
                value
            } else {
                let value_start = i;
                while i < len && !b[i].is_ascii_whitespace() && b[i] != b'>' {
                    i += 1;
                }
                &source[value_start..i]
            };
            attrs.push((name, decode_entities(value)));
        } else {
            attrs.push((name, String::new()));
        }
    }
}

/// Removes tags, comments and script/style bodies, then decodes entities.
/// A `<br>` becomes a single space.
pub fn text_of(fragment: &str) -> String {
    let b = fragment.as_bytes();
    let len = b.len();
    let mut out = String::with_capacity(len);
    let mut i = 0usize;
    let mut text_start = 0usize;

    while i < len {
        if b[i] != b'<' {
            i += 1;
            continue;
        }
        let starts_tag = b
            .get(i + 1)
            .is_some_and(|c| c.is_ascii_alphabetic() || *c == b'/' || *c == b'!');
        if !starts_tag {
            i += 1;
            continue;
        }
        out.push_str(&fragment[text_start..i]);
        let rest = &fragment[i..];

        if let Some(comment) = rest.strip_prefix("<!--") {
            i = comment.find("-->").map_or(len, |e| i + 4 + e + 3);
            text_start = i;
            continue;
        }

        // Skip to the end of the tag, respecting quoted attribute values.
        let tag_start = i;
        let mut quote: Option<u8> = None;
        i += 1;
        while i < len {
            match (quote, b[i]) {
                (Some(q), c) if c == q => quote = None,
                (None, b'"') | (None, b'\'') => quote = Some(b[i]),
                (None, b'>') => break,
                _ => {}
            }
            i += 1;
        }
        i = (i + 1).min(len);

        let tag = &fragment[tag_start..i];
        let tag_name: String = tag
            .trim_start_matches('<')
            .chars()
            .take_while(|c| is_name_char(*c))
            .collect::<String>()
            .to_ascii_lowercase();
        if tag_name == "br" {
            out.push(' ');
        }
        if RAW_TEXT_TAGS.contains(&tag_name.as_str()) {
            i = find_ci(&fragment[i..], &format!("</{tag_name}"))
                .and_then(|close| fragment[i + close..].find('>').map(|e| i + close + e + 1))
                .unwrap_or(len);
        }
        text_start = i;
    }
    if text_start < len {
        out.push_str(&fragment[text_start..]);
    }
    decode_entities(&out)
}

/// Decodes named (`&nbsp;`, `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`)
/// and numeric entities. `&nbsp;` becomes U+00A0. Unknown entities are
/// left untouched.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        let tail = &rest[i..];
        let decoded = tail[1..]
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| entity_char(&tail[1..1 + semi]).map(|c| (c, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 2..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity_char(entity: &str) -> Option<char> {
    match entity {
        "nbsp" => Some('\u{a0}'),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Collapses runs of whitespace (NBSP included) into single spaces and trims.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}
