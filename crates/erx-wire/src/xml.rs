//! Owned XML element tree.
//!
//! Replies are parsed into a tree of [`Element`]s keyed by *local* name (namespace prefixes are
//! dropped, so `soap:Body` is found as `Body` and `xsi:nil` as `nil`). Requests are built as
//! trees and rendered; names are written exactly as given so prefixed names survive rendering.
//!
//! Scalar accessors follow the remote's conventions: a missing or empty numeric element reads as
//! zero and a missing string element reads as empty.

use crate::{WireError, WireResult};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// An element holding only text.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// A wrapper element holding one leaf per item, e.g. `PrescriptionIDs>int`.
    pub fn list<I, T>(name: impl Into<String>, item_name: &str, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self::new(name).with_children(
            items
                .into_iter()
                .map(|item| Element::leaf(item_name, item.to_string())),
        )
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Required child; absence is a decode error.
    pub fn require(&self, name: &str) -> WireResult<&Element> {
        self.child(name)
            .ok_or_else(|| WireError::MissingElement(format!("{}>{}", self.name, name)))
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Items of a wrapped list such as `DisplayNames>string`. A missing wrapper is an empty list.
    pub fn list_items<'a>(
        &'a self,
        wrapper: &'a str,
        item: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.child(wrapper)
            .into_iter()
            .flat_map(move |list| list.children_named(item))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// True when the element carries `xsi:nil="true"`.
    pub fn is_nil(&self) -> bool {
        self.attribute("nil") == Some("true")
    }

    /// Text of a child element, or `""` when it is absent.
    pub fn text_of(&self, name: &str) -> &str {
        self.child(name).map(|child| child.text.as_str()).unwrap_or("")
    }

    /// Integer value of a child element. Missing, empty or nil elements read as zero.
    pub fn int_of(&self, name: &str) -> WireResult<i64> {
        Ok(self.optional_int_of(name)?.unwrap_or(0))
    }

    /// Integer value of a child element, `None` when missing, empty or nil.
    pub fn optional_int_of(&self, name: &str) -> WireResult<Option<i64>> {
        let Some(child) = self.child(name) else {
            return Ok(None);
        };
        let raw = child.text.trim();
        if child.is_nil() || raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<i64>()
            .map(Some)
            .map_err(|_| WireError::InvalidValue {
                field: name.to_owned(),
                value: raw.to_owned(),
            })
    }

    /// Boolean value of a child element (`true`/`false`/`1`/`0`). Missing or empty reads as false.
    pub fn bool_of(&self, name: &str) -> WireResult<bool> {
        match self.text_of(name).trim() {
            "" | "false" | "0" => Ok(false),
            "true" | "1" => Ok(true),
            other => Err(WireError::InvalidValue {
                field: name.to_owned(),
                value: other.to_owned(),
            }),
        }
    }

    /// Texts of a wrapped list of leaves.
    pub fn strings_in(&self, wrapper: &str, item: &str) -> Vec<String> {
        self.list_items(wrapper, item)
            .map(|element| element.text.clone())
            .collect()
    }

    /// Parse a document and return its root element.
    ///
    /// Whitespace around text is trimmed. Content after the root element closes is ignored.
    pub fn parse(xml: &str) -> WireResult<Element> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(start) => stack.push(open_element(&start)?),
                Event::Empty(start) => {
                    let element = open_element(&start)?;
                    if let Some(root) = close_element(&mut stack, element) {
                        return Ok(root);
                    }
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| WireError::Xml("unbalanced closing tag".into()))?;
                    if let Some(root) = close_element(&mut stack, element) {
                        return Ok(root);
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        let unescaped = text.unescape().map_err(xml_error)?;
                        current.text.push_str(&unescaped);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        let raw = data.into_inner();
                        current.text.push_str(utf8(&raw)?);
                    }
                }
                Event::Eof => {
                    return Err(WireError::Xml(
                        "document ended before the root element closed".into(),
                    ))
                }
                _ => {}
            }
        }
    }

    /// Render the element (without an XML declaration).
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }

        if self.children.is_empty() && self.text.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        out.push_str(&escape(self.text.as_str()));
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn open_element(start: &BytesStart<'_>) -> WireResult<Element> {
    let mut element = Element::new(utf8(start.local_name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(xml_error)?;
        let key = utf8(attribute.key.local_name().as_ref())?.to_owned();
        let value = attribute.unescape_value().map_err(xml_error)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

/// Attach a finished element to its parent; returns it when it was the root.
fn close_element(stack: &mut [Element], element: Element) -> Option<Element> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            None
        }
        None => Some(element),
    }
}

fn utf8(bytes: &[u8]) -> WireResult<&str> {
    std::str::from_utf8(bytes).map_err(xml_error)
}

fn xml_error(err: impl std::fmt::Display) -> WireError {
    WireError::Xml(err.to_string())
}
