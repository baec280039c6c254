//! Format-preserving handle on a single project document.
//!
//! The raw source string is the document of record. Lookups parse it with
//! `roxmltree`; every edit splices the raw string using byte positions from
//! `roxmltree::Node::range()`, so whitespace, comments, attribute order and
//! everything the rules do not touch survive a save byte for byte.

use std::ops::Range;
use std::path::Path;

use roxmltree::{Document, Node};
use tracing::{debug, trace};

use crate::condition::ConfigPlatform;
use crate::error::ProjectError;
use crate::report::Outcome;
use crate::select::{Selector, is_msbuild_element};

const BOM: char = '\u{feff}';
const INDENT_UNIT: &str = "  ";

// ═══════════════════════════════════════════════════════════════════════════════
//  Block – a settings block located by selector
// ═══════════════════════════════════════════════════════════════════════════════

/// A settings block: the `index`-th match of `selector`, optionally followed
/// by a path of child elements (e.g. `<BuildLog>` inside an
/// `<ItemDefinitionGroup>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    selector: Selector,
    index: usize,
    path: Vec<&'static str>,
    condition: Option<String>,
}

impl Block {
    /// The first `<name>` child of this block.
    pub fn child(&self, name: &'static str) -> Block {
        let mut path = self.path.clone();
        path.push(name);
        Block { path, ..self.clone() }
    }

    /// `Condition` attribute of the selected node, verbatim.
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    /// Configuration/platform the block applies to, e.g. `Debug|Win32`.
    pub fn label(&self) -> Option<String> {
        self.condition
            .as_deref()
            .and_then(ConfigPlatform::from_condition)
            .map(|cp| cp.to_string())
    }

    fn tag(&self) -> &'static str {
        self.path.last().copied().unwrap_or_else(|| self.selector.tag())
    }
}

/// Saved document state for [`Project::rollback`].
#[derive(Debug, Clone)]
pub struct Checkpoint(String);

// ═══════════════════════════════════════════════════════════════════════════════
//  Project
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Project {
    source: String,
    /// The file started with a UTF-8 byte-order mark (Visual Studio writes one).
    bom: bool,
}

impl Project {
    /// Parse a project document from its XML source.
    pub fn parse(source: impl Into<String>) -> Result<Self, ProjectError> {
        let mut source = source.into();
        let bom = source.starts_with(BOM);
        if bom {
            source.drain(..BOM.len_utf8());
        }
        Document::parse(&source)?;
        Ok(Self { source, bom })
    }

    /// Load a project document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;
        Self::parse(source)
    }

    /// The current XML source, without byte-order mark (reflects all edits).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Write the document back to disk, restoring the byte-order mark.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        let mut out = String::with_capacity(self.source.len() + BOM.len_utf8());
        if self.bom {
            out.push(BOM);
        }
        out.push_str(&self.source);
        std::fs::write(path, out).map_err(|e| ProjectError::io(path, e))?;
        debug!(path = %path.display(), "saved project");
        Ok(())
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.source.clone())
    }

    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.source = checkpoint.0;
    }

    fn document(&self) -> Result<Document<'_>, ProjectError> {
        Ok(Document::parse(&self.source)?)
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// All blocks `selector` matches, in document order.
    pub fn blocks(&self, selector: Selector) -> Result<Vec<Block>, ProjectError> {
        let doc = self.document()?;
        let blocks: Vec<Block> = selector
            .select(&doc)
            .iter()
            .enumerate()
            .map(|(index, node)| Block {
                selector,
                index,
                path: Vec::new(),
                condition: node.attribute("Condition").map(String::from),
            })
            .collect();
        debug!(%selector, count = blocks.len(), "selected blocks");
        Ok(blocks)
    }

    /// Text of the first `<name>` child of `block`, if there is one.
    pub fn child_text(&self, block: &Block, name: &str) -> Result<Option<String>, ProjectError> {
        let doc = self.document()?;
        let parent = resolve(&doc, block)?;
        find_child(parent, name).map(element_text).transpose()
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    /// Set the text of `<name>` under `block`, appending the element when it
    /// is absent. Equal text (exact comparison) is left untouched.
    pub fn upsert(
        &mut self,
        block: &Block,
        name: &str,
        value: &str,
    ) -> Result<Outcome, ProjectError> {
        let edit = {
            let doc = self.document()?;
            let parent = resolve(&doc, block)?;
            match find_child(parent, name) {
                None => Some((Outcome::Added, append_child(&self.source, parent, name, value))),
                Some(element) => {
                    if element_text(element)? == value {
                        None
                    } else {
                        let body = escape_text(value);
                        Some((Outcome::Updated, set_body(&self.source, element, body)))
                    }
                }
            }
        };
        Ok(self.apply(block, name, edit))
    }

    /// Append `<name>` under `block` only when it is absent. An existing
    /// element is never compared or changed.
    pub fn insert_if_absent(
        &mut self,
        block: &Block,
        name: &str,
        value: &str,
    ) -> Result<Outcome, ProjectError> {
        let edit = {
            let doc = self.document()?;
            let parent = resolve(&doc, block)?;
            match find_child(parent, name) {
                None => Some((Outcome::Added, append_child(&self.source, parent, name, value))),
                Some(_) => None,
            }
        };
        Ok(self.apply(block, name, edit))
    }

    fn apply(&mut self, block: &Block, name: &str, edit: Option<(Outcome, Splice)>) -> Outcome {
        let Some((outcome, splice)) = edit else {
            trace!(parent = block.tag(), element = name, "unchanged");
            return Outcome::Skipped;
        };
        trace!(
            parent = block.tag(),
            element = name,
            ?outcome,
            at = splice.range.start,
            "splicing"
        );
        self.source.replace_range(splice.range, &splice.text);
        outcome
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Node helpers
// ═══════════════════════════════════════════════════════════════════════════════

fn resolve<'a, 'input>(
    doc: &'a Document<'input>,
    block: &Block,
) -> Result<Node<'a, 'input>, ProjectError> {
    let mut node = block
        .selector
        .select(doc)
        .into_iter()
        .nth(block.index)
        .ok_or_else(|| ProjectError::BlockNotFound {
            selector: block.selector.to_string(),
            index: block.index,
        })?;

    for &name in &block.path {
        let parent = node;
        node = find_child(parent, name).ok_or_else(|| ProjectError::MissingElement {
            element: name.to_string(),
            parent: parent.tag_name().name().to_string(),
        })?;
    }

    Ok(node)
}

/// First MSBuild child element with the given local name.
fn find_child<'a, 'input>(parent: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    parent.children().find(|n| is_msbuild_element(n, name))
}

/// Unescaped text content of a leaf element.
fn element_text(element: Node) -> Result<String, ProjectError> {
    if element.children().any(|n| n.is_element()) {
        return Err(ProjectError::MixedContent {
            element: element.tag_name().name().to_string(),
        });
    }
    Ok(element
        .children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect())
}

fn is_blank_text(node: &Node) -> bool {
    node.is_text() && node.text().is_some_and(|t| t.trim().is_empty())
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Splicing
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct Splice {
    range: Range<usize>,
    text: String,
}

fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn newline(source: &str) -> &'static str {
    if source.contains("\r\n") { "\r\n" } else { "\n" }
}

/// Leading whitespace of the line containing `pos`.
fn indent_of(source: &str, pos: usize) -> &str {
    let line_start = source[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &source[line_start..pos];
    let end = prefix
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(prefix.len());
    &prefix[..end]
}

/// Tag name as written in the source, prefix included.
fn qualified_name<'s>(source: &'s str, node: Node) -> &'s str {
    let rest = &source[node.range().start + 1..];
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Byte offset just past the `>` closing the start tag that begins at `start`.
fn start_tag_end(source: &str, start: usize) -> usize {
    let mut quote = None;
    for (i, c) in source[start..].char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return start + i + 1,
            _ => {}
        }
    }
    source.len()
}

/// Range between the start and end tags; `None` for a self-closing element.
fn inner_range(source: &str, node: Node) -> Option<Range<usize>> {
    let range = node.range();
    let open_end = start_tag_end(source, range.start);
    if source[..open_end].ends_with("/>") {
        return None;
    }
    let close_start = source[open_end..range.end]
        .rfind("</")
        .map(|i| open_end + i)
        .unwrap_or(range.end);
    Some(open_end..close_start)
}

/// Replace everything between the tags of `node` with `body`, expanding a
/// self-closing element into a start/end pair.
fn set_body(source: &str, node: Node, body: String) -> Splice {
    if let Some(range) = inner_range(source, node) {
        return Splice { range, text: body };
    }

    let range = node.range();
    let head = source[range.start..range.end - 2].trim_end();
    let qname = qualified_name(source, node);
    Splice {
        range: range.start + head.len()..range.end,
        text: format!(">{body}</{qname}>"),
    }
}

/// `name` with the namespace prefix `parent` is written with, if any.
fn prefixed_like(source: &str, parent: Node, name: &str) -> String {
    match qualified_name(source, parent).split_once(':') {
        Some((prefix, _)) => format!("{prefix}:{name}"),
        None => name.to_string(),
    }
}

/// Append `<name>value</name>` as the last child of `parent`, on its own line.
fn append_child(source: &str, parent: Node, name: &str, value: &str) -> Splice {
    let nl = newline(source);
    let qname = prefixed_like(source, parent, name);
    let markup = format!("<{qname}>{}</{qname}>", escape_text(value));

    if let Some(last) = parent.children().filter(|n| !is_blank_text(n)).last() {
        let end = last.range().end;
        let indent = indent_of(source, last.range().start);
        return Splice {
            range: end..end,
            text: format!("{nl}{indent}{markup}"),
        };
    }

    let indent = indent_of(source, parent.range().start);
    set_body(
        source,
        parent,
        format!("{nl}{indent}{INDENT_UNIT}{markup}{nl}{indent}"),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
