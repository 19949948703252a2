//! Minimal markup traversal used by the extractors.
//!
//! Extraction code only ever asks three things of a document: find elements
//! by tag + class, list an element's element children, and read its text.
//! `MarkupNode` captures exactly that, and `ElementRef` from `scraper`
//! provides it.

use scraper::{ElementRef, Html};

/// A structural marker: a tag name plus classes that must all be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub tag: &'static str,
    pub classes: &'static [&'static str],
}

impl Marker {
    pub const fn new(tag: &'static str, classes: &'static [&'static str]) -> Self {
        Marker { tag, classes }
    }

    pub const fn tag(tag: &'static str) -> Self {
        Marker { tag, classes: &[] }
    }
}

pub trait MarkupNode: Copy {
    /// Descendants (not self) matching any of `markers`, in document order.
    fn descendants_matching(&self, markers: &[Marker]) -> Vec<Self>;

    /// Element children only, in document order.
    fn element_children(&self) -> Vec<Self>;

    /// Every descendant text node, untrimmed, in document order.
    fn text_fragments(&self) -> Vec<String>;

    /// Text nodes that are direct children of this element.
    fn own_text_fragments(&self) -> Vec<String>;

    fn is_same(&self, other: &Self) -> bool;

    fn tag_name(&self) -> String;

    fn find(&self, marker: Marker) -> Option<Self> {
        self.descendants_matching(&[marker]).into_iter().next()
    }

    fn find_all(&self, marker: Marker) -> Vec<Self> {
        self.descendants_matching(&[marker])
    }

    /// All descendant text concatenated, then trimmed.
    fn text_content(&self) -> String {
        self.text_fragments().concat().trim().to_string()
    }

    /// Each text node trimmed and joined with no separator.
    fn stripped_text(&self) -> String {
        self.text_fragments()
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// First direct text node with visible content, trimmed.
    fn own_text(&self) -> Option<String> {
        self.own_text_fragments()
            .iter()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
            .map(str::to_string)
    }
}

fn matches_marker(el: &ElementRef<'_>, marker: &Marker) -> bool {
    let value = el.value();
    value.name().eq_ignore_ascii_case(marker.tag)
        && marker
            .classes
            .iter()
            .all(|want| value.classes().any(|c| c == *want))
}

impl<'a> MarkupNode for ElementRef<'a> {
    fn descendants_matching(&self, markers: &[Marker]) -> Vec<Self> {
        self.descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|el| markers.iter().any(|m| matches_marker(el, m)))
            .collect()
    }

    fn element_children(&self) -> Vec<Self> {
        self.children().filter_map(ElementRef::wrap).collect()
    }

    fn text_fragments(&self) -> Vec<String> {
        self.text().map(str::to_string).collect()
    }

    fn own_text_fragments(&self) -> Vec<String> {
        self.children()
            .filter_map(|node| node.value().as_text().map(|t| String::from(&**t)))
            .collect()
    }

    fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    fn tag_name(&self) -> String {
        self.value().name().to_string()
    }
}

/// Parse a full HTML document. Malformed markup is repaired, never rejected.
pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<html><body>
        <div class="card list">
            <div class="name">  Argo Bromo <span>(1)</span></div>
            <div class="name extra">second</div>
            <p class="card">not a div</p>
        </div>
    </body></html>"#;

    #[test]
    fn marker_requires_all_classes() {
        let doc = parse_document(DOC);
        let root = doc.root_element();
        assert_eq!(root.find_all(Marker::new("div", &["card", "list"])).len(), 1);
        assert_eq!(root.find_all(Marker::new("div", &["name"])).len(), 2);
        assert_eq!(root.find_all(Marker::new("div", &["name", "extra"])).len(), 1);
        assert!(root.find(Marker::new("div", &["list", "missing"])).is_none());
    }

    #[test]
    fn tag_must_match() {
        let doc = parse_document(DOC);
        let root = doc.root_element();
        let cards = root.find_all(Marker::new("div", &["card"]));
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].tag_name(), "div");
    }

    #[test]
    fn own_text_skips_children() {
        let doc = parse_document(DOC);
        let name = doc.root_element().find(Marker::new("div", &["name"])).unwrap();
        assert_eq!(name.own_text().as_deref(), Some("Argo Bromo"));
        assert_eq!(name.text_content(), "Argo Bromo (1)");
        assert_eq!(name.stripped_text(), "Argo Bromo(1)");
    }

    #[test]
    fn children_are_elements_only() {
        let doc = parse_document(DOC);
        let card = doc.root_element().find(Marker::new("div", &["card"])).unwrap();
        let kids = card.element_children();
        assert_eq!(kids.len(), 3);
        assert!(kids[0].is_same(&kids[0]));
        assert!(!kids[0].is_same(&kids[1]));
    }
}
