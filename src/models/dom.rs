//! Rendered-document snapshot: the DOM tree as laid out by the rendering engine, with the
//! resolved style and layout box of every element and the line boxes of every text node.

use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use serde::{Deserialize, Serialize};

use crate::errors::{DeckError, Result};
use crate::models::common::Rect;
use crate::models::slide::ElementKind;
use crate::models::style::StyleSnapshot;

/// Attribute carrying an element's role, either authored or written by the classifier.
pub const RENDER_ATTR: &str = "data-ppt-render";
/// Class marking a slide root.
pub const SLIDE_CLASS: &str = "slide";

/// Inline style properties the capture protocol toggles on live nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineProperty {
    Visibility,
    Opacity,
    Background,
}

/// Inline overrides set on an element. `None` means the property is not set inline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    pub visibility: Option<String>,
    pub opacity: Option<String>,
    pub background: Option<String>,
}

impl InlineStyle {
    pub fn get(&self, property: InlineProperty) -> Option<&String> {
        match property {
            InlineProperty::Visibility => self.visibility.as_ref(),
            InlineProperty::Opacity => self.opacity.as_ref(),
            InlineProperty::Background => self.background.as_ref(),
        }
    }

    /// Sets (or clears) the property and returns the previous inline value.
    pub fn set(&mut self, property: InlineProperty, value: Option<String>) -> Option<String> {
        let slot = match property {
            InlineProperty::Visibility => &mut self.visibility,
            InlineProperty::Opacity => &mut self.opacity,
            InlineProperty::Background => &mut self.background,
        };
        std::mem::replace(slot, value)
    }
}

#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub style: StyleSnapshot,
    pub rect: Rect,
    pub inline: InlineStyle,
}

impl ElementData {
    pub fn has_class(&self, class: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// The style with inline overrides applied on top.
    pub fn effective_style(&self) -> StyleSnapshot {
        let mut style = self.style.clone();
        if let Some(visibility) = &self.inline.visibility {
            style.visibility = visibility.clone();
        }
        if let Some(opacity) = &self.inline.opacity {
            style.opacity = opacity.clone();
        }
        if let Some(background) = &self.inline.background {
            // The shorthand resets the image layer as well.
            style.background_color = if background == "transparent" || background == "none" {
                "rgba(0, 0, 0, 0)".to_string()
            } else {
                background.clone()
            };
            style.background_image = "none".to_string();
        }
        style
    }
}

#[derive(Debug, Clone)]
pub struct TextData {
    pub text: String,
    /// Line boxes of the text run, in viewport coordinates.
    pub rects: Vec<Rect>,
}

#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementData),
    Text(TextData),
}

// --- Snapshot (wire) format ---

/// A text node as dumped by the rendering engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSnapshot {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rects: Vec<Rect>,
}

/// An element node as dumped by the rendering engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
    #[serde(default)]
    pub style: StyleSnapshot,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

/// Either kind of node. Text nodes are recognized by their `text` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Text(TextSnapshot),
    Element(ElementSnapshot),
}

/// The whole dump; `root` is the document body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub root: ElementSnapshot,
}

// --- Arena document ---

/// The live document tree the pipeline classifies and the capture protocol mutates.
#[derive(Debug, Clone)]
pub struct Document {
    arena: Arena<DomNode>,
    root: NodeId,
}

impl Document {
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Self {
        let mut arena = Arena::new();
        let root = insert_element(&mut arena, snapshot.root);
        Self { arena, root }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: DocumentSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.arena.get(id).map(|node| node.get())
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.node(id)? {
            DomNode::Element(element) => Some(element),
            DomNode::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.arena.get_mut(id)?.get_mut() {
            DomNode::Element(element) => Some(element),
            DomNode::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&TextData> {
        match self.node(id)? {
            DomNode::Text(text) => Some(text),
            DomNode::Element(_) => None,
        }
    }

    pub fn style(&self, id: NodeId) -> Option<&StyleSnapshot> {
        self.element(id).map(|element| &element.style)
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.element(id).map(|element| element.rect)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.parent()
    }

    /// True when the element carries a role tag, whatever its value.
    pub fn is_tagged(&self, id: NodeId) -> bool {
        self.attr(id, RENDER_ATTR).is_some()
    }

    /// The element's role, if tagged with a recognized value.
    pub fn role(&self, id: NodeId) -> Option<ElementKind> {
        self.attr(id, RENDER_ATTR)?.parse().ok()
    }

    pub fn set_role(&mut self, id: NodeId, kind: ElementKind) {
        if let Some(element) = self.element_mut(id) {
            element
                .attributes
                .insert(RENDER_ATTR.to_string(), kind.as_str().to_string());
        }
    }

    pub fn is_slide_root(&self, id: NodeId) -> bool {
        self.element(id)
            .is_some_and(|element| element.has_class(SLIDE_CLASS))
    }

    /// Direct children (elements and text nodes) in document order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Element descendants in document order, excluding `id` itself.
    pub fn element_descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
            .skip(1)
            .filter(move |node| self.element(*node).is_some())
    }

    /// Text descendants in document order.
    pub fn text_descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
            .filter(move |node| self.text(*node).is_some())
    }

    /// Proper ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.ancestors(&self.arena).skip(1)
    }

    /// Nearest proper ancestor carrying a role tag.
    pub fn tagged_ancestor(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|ancestor| self.is_tagged(*ancestor))
    }

    /// True when `descendant` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        descendant
            .ancestors(&self.arena)
            .any(|node| node == ancestor)
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).find(|child| self.element(*child).is_some())
    }

    /// Slide roots: `section.slide` elements in document order, or the root itself when the
    /// document has none.
    pub fn slide_roots(&self) -> Vec<NodeId> {
        let sections: Vec<NodeId> = self
            .root
            .descendants(&self.arena)
            .filter(|id| {
                self.element(*id)
                    .is_some_and(|e| e.tag.eq_ignore_ascii_case("section") && e.has_class(SLIDE_CLASS))
            })
            .collect();
        if sections.is_empty() {
            vec![self.root]
        } else {
            sections
        }
    }

    /// Rendered text of an element: whitespace collapsed, line breaks at `<br>` and at
    /// block-level boundaries, `display: none` subtrees skipped.
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut raw = String::new();
        self.collect_text(id, &mut raw);
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.node(id) {
            Some(DomNode::Text(text)) => {
                let collapsed = text.text.split_whitespace().collect::<Vec<_>>().join(" ");
                if collapsed.is_empty() {
                    return;
                }
                if text.text.starts_with(char::is_whitespace) && !out.ends_with(&[' ', '\n'][..]) {
                    out.push(' ');
                }
                out.push_str(&collapsed);
                if text.text.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
            }
            Some(DomNode::Element(element)) => {
                if element.style.display == "none" {
                    return;
                }
                if element.tag.eq_ignore_ascii_case("br") {
                    out.push('\n');
                    return;
                }
                let block = element.style.is_block_level();
                if block && !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                for child in self.children(id) {
                    self.collect_text(child, out);
                }
                if block && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            None => {}
        }
    }

    /// Line boxes of every text run inside the element, in document order.
    pub fn text_line_rects(&self, id: NodeId) -> Vec<Rect> {
        self.text_descendants(id)
            .filter_map(|node| self.text(node))
            .filter(|text| !text.text.trim().is_empty())
            .flat_map(|text| text.rects.iter().copied())
            .collect()
    }

    /// The link target for an element: its own `href` when it is an anchor, otherwise the
    /// nearest enclosing anchor's.
    pub fn href(&self, id: NodeId) -> Option<String> {
        id.ancestors(&self.arena)
            .find(|node| {
                self.element(*node)
                    .is_some_and(|e| e.tag.eq_ignore_ascii_case("a"))
            })
            .and_then(|anchor| self.attr(anchor, "href"))
            .map(str::to_string)
    }

    /// Assigns an identifying attribute, e.g. the element id used by later capture steps.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<()> {
        let element = self
            .element_mut(id)
            .ok_or_else(|| DeckError::MissingData(format!("node {:?} is not an element", id)))?;
        element.attributes.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Finds the element whose attribute `name` equals `value`.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        self.root
            .descendants(&self.arena)
            .find(|node| self.attr(*node, name) == Some(value))
    }

    /// Every element in the document, in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.root
            .descendants(&self.arena)
            .filter(move |node| self.element(*node).is_some())
    }
}

fn insert_element(arena: &mut Arena<DomNode>, snapshot: ElementSnapshot) -> NodeId {
    let ElementSnapshot {
        tag,
        attributes,
        style,
        rect,
        children,
    } = snapshot;
    let id = arena.new_node(DomNode::Element(ElementData {
        tag,
        attributes,
        style,
        rect,
        inline: InlineStyle::default(),
    }));
    for child in children {
        let child_id = match child {
            SnapshotNode::Element(element) => insert_element(arena, element),
            SnapshotNode::Text(text) => arena.new_node(DomNode::Text(TextData {
                text: text.text,
                rects: text.rects,
            })),
        };
        id.append(child_id, arena);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Document {
        let snapshot = json!({
            "root": {
                "tag": "body",
                "children": [
                    {
                        "tag": "section",
                        "attributes": {"class": "slide"},
                        "children": [
                            {"tag": "a", "attributes": {"href": "https://example.com"}, "style": {"display": "inline"},
                             "children": [
                                {"tag": "span", "style": {"display": "inline"}, "children": [{"text": "  Hello \n world "}]}
                             ]},
                            {"tag": "p", "children": [{"text": "Second"}, {"tag": "br"}, {"text": "line"}]},
                            {"tag": "div", "style": {"display": "none"}, "children": [{"text": "hidden"}]}
                        ]
                    }
                ]
            }
        });
        Document::from_json(&snapshot.to_string()).unwrap()
    }

    #[test]
    fn test_slide_roots_found_by_class() {
        let doc = sample();
        let slides = doc.slide_roots();
        assert_eq!(slides.len(), 1);
        assert!(doc.is_slide_root(slides[0]));
    }

    #[test]
    fn test_body_is_slide_when_no_sections() {
        let doc = Document::from_json(r#"{"root": {"tag": "body"}}"#).unwrap();
        assert_eq!(doc.slide_roots(), vec![doc.root()]);
    }

    #[test]
    fn test_inner_text_collapses_and_breaks_blocks() {
        let doc = sample();
        let slide = doc.slide_roots()[0];
        assert_eq!(doc.inner_text(slide), "Hello world\nSecond\nline");
    }

    #[test]
    fn test_href_from_enclosing_anchor() {
        let doc = sample();
        let span = doc
            .elements()
            .find(|id| doc.element(*id).unwrap().tag == "span")
            .unwrap();
        assert_eq!(doc.href(span).as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_inline_overrides_apply_to_effective_style() {
        let mut doc = sample();
        let slide = doc.slide_roots()[0];
        let element = doc.element_mut(slide).unwrap();
        let previous = element
            .inline
            .set(InlineProperty::Visibility, Some("hidden".to_string()));
        assert_eq!(previous, None);
        assert!(!element.effective_style().is_visible());
    }
}
