use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use xml::name::OwnedName;
use xml::namespace::Namespace;
use xml::reader::{EventReader, XmlEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Scalar(String),
    Keyed(Vec<(String, Document)>),
    List(Vec<Document>),
}

impl Document {
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn get(&self, tag: &str) -> Option<&Document> {
        match self {
            Self::Keyed(entries) => entries
                .iter()
                .find(|(key, _)| key == tag)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    // Attribute (`@name`) first, then child element.
    pub fn field(&self, name: &str) -> Option<&Document> {
        self.get(&format!("@{name}")).or_else(|| self.get(name))
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn items(&self) -> Vec<&Document> {
        match self {
            Self::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    pub fn find<'a>(&'a self, tag: &'a str) -> Find<'a> {
        Find {
            tag,
            pending: vec![self],
        }
    }

    pub fn from_xml_str(source: &str) -> Result<Self> {
        let mut stack: Vec<ElementBuilder> = Vec::new();
        let mut root: Option<(String, Document)> = None;

        for event in EventReader::from_str(source) {
            match event.context("malformed XML")? {
                XmlEvent::StartElement {
                    name,
                    attributes,
                    namespace,
                } => {
                    let parent = stack.last().map(|element| &element.namespace);
                    let mut entries = declared_namespaces(&namespace, parent);
                    entries.extend(attributes.into_iter().map(|attribute| {
                        (
                            format!("@{}", qualified_name(&attribute.name)),
                            Document::Scalar(attribute.value),
                        )
                    }));
                    stack.push(ElementBuilder {
                        name: qualified_name(&name),
                        namespace,
                        attributes: entries,
                        children: Vec::new(),
                        text: String::new(),
                    });
                }
                XmlEvent::EndElement { .. } => {
                    let Some(element) = stack.pop() else {
                        bail!("unbalanced closing tag in XML");
                    };
                    let name = element.name.clone();
                    let value = element.finish();
                    match stack.last_mut() {
                        Some(parent) => parent.push_child(name, value),
                        None => root = Some((name, value)),
                    }
                }
                XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                    if let Some(element) = stack.last_mut() {
                        element.text.push_str(&text);
                    }
                }
                _ => {}
            }
        }

        let (name, value) = root.context("XML document has no root element")?;
        Ok(Self::Keyed(vec![(name, value)]))
    }

    pub fn from_xml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_xml_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let value: Value = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Self::from(value))
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Scalar(String::new()),
            Value::Bool(flag) => Self::Scalar(flag.to_string()),
            Value::Number(number) => Self::Scalar(number.to_string()),
            Value::String(text) => Self::Scalar(text),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Keyed(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => f.write_str(value),
            Self::Keyed(entries) => {
                f.write_str("{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// Preorder: a keyed node yields its own `tag` value before any descendant.
// Scalars and nested lists inside lists are not searched.
pub struct Find<'a> {
    tag: &'a str,
    pending: Vec<&'a Document>,
}

impl<'a> Iterator for Find<'a> {
    type Item = &'a Document;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.pending.pop() {
            let Document::Keyed(entries) = node else {
                continue;
            };

            for (_, value) in entries.iter().rev() {
                match value {
                    Document::Keyed(_) => self.pending.push(value),
                    Document::List(items) => self.pending.extend(
                        items
                            .iter()
                            .rev()
                            .filter(|item| matches!(item, Document::Keyed(_))),
                    ),
                    Document::Scalar(_) => {}
                }
            }

            if let Some(hit) = node.get(self.tag) {
                return Some(hit);
            }
        }

        None
    }
}

struct ElementBuilder {
    name: String,
    namespace: Namespace,
    attributes: Vec<(String, Document)>,
    children: Vec<(String, Vec<Document>)>,
    text: String,
}

impl ElementBuilder {
    fn push_child(&mut self, name: String, value: Document) {
        match self.children.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => values.push(value),
            None => self.children.push((name, vec![value])),
        }
    }

    fn finish(self) -> Document {
        let text = self.text.trim();
        if self.attributes.is_empty() && self.children.is_empty() {
            return Document::scalar(text);
        }

        let mut entries = self.attributes;
        for (name, mut values) in self.children {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Document::List(values)
            };
            entries.push((name, value));
        }
        if !text.is_empty() {
            entries.push(("#text".to_string(), Document::scalar(text)));
        }

        Document::Keyed(entries)
    }
}

// xml-rs reports `xmlns` declarations as namespace scope, not attributes.
// Only the bindings new at this element are kept, as `@xmlns[:prefix]`.
fn declared_namespaces(
    namespace: &Namespace,
    parent: Option<&Namespace>,
) -> Vec<(String, Document)> {
    namespace
        .0
        .iter()
        .filter(|(prefix, uri)| match parent {
            Some(parent) => parent.0.get(*prefix) != Some(*uri),
            None => !matches!(prefix.as_str(), "xml" | "xmlns") && !uri.is_empty(),
        })
        .map(|(prefix, uri)| {
            let key = if prefix.is_empty() {
                "@xmlns".to_string()
            } else {
                format!("@xmlns:{prefix}")
            };
            (key, Document::scalar(uri.clone()))
        })
        .collect()
}

fn qualified_name(name: &OwnedName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{prefix}:{}", name.local_name),
        None => name.local_name.clone(),
    }
}
