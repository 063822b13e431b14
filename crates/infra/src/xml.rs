//! quick-xml backed decoder for legacy XML responses
//!
//! Converts a document into the JSON shape the core expects:
//! - namespace prefixes are dropped from element and attribute names
//! - attributes become `@name` keys
//! - text of an element with children or attributes becomes `#text`
//! - a leaf element becomes a plain string
//! - repeated sibling elements collapse into an array

use ledgerlink_core::XmlDecoder;
use ledgerlink_domain::{LedgerError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::errors::InfraError;

/// Element under construction
struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut children = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| xml_error(e.into()))?;
            let key = attribute.key;
            if key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let value = attribute.unescape_value().map_err(xml_error)?;
            children.insert(
                format!("@{}", String::from_utf8_lossy(key.local_name().as_ref())),
                Value::String(value.into_owned()),
            );
        }
        Ok(Self { name, children, text: String::new() })
    }

    fn close(self) -> (String, Value) {
        let value = if self.children.is_empty() {
            Value::String(self.text)
        } else {
            let mut children = self.children;
            if !self.text.is_empty() {
                children.insert("#text".to_string(), Value::String(self.text));
            }
            Value::Object(children)
        };
        (self.name, value)
    }
}

/// Stateless XML to JSON decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickXmlDecoder;

impl QuickXmlDecoder {
    pub const fn new() -> Self {
        Self
    }
}

impl XmlDecoder for QuickXmlDecoder {
    fn decode(&self, document: &str) -> Result<Value> {
        let mut reader = Reader::from_str(document);
        reader.config_mut().trim_text(true);

        let mut root = Map::new();
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(start) => stack.push(Frame::open(&start)?),
                Event::Empty(start) => {
                    let (name, value) = Frame::open(&start)?.close();
                    insert_child(parent(&mut stack, &mut root), name, value);
                }
                Event::End(_) => {
                    let frame = stack.pop().ok_or_else(|| {
                        LedgerError::InvalidInput("unbalanced closing tag".to_string())
                    })?;
                    let (name, value) = frame.close();
                    insert_child(parent(&mut stack, &mut root), name, value);
                }
                Event::Text(text) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&text.unescape().map_err(xml_error)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(LedgerError::InvalidInput(format!(
                "document ended inside element {}",
                open.name
            )));
        }
        if root.is_empty() {
            return Err(LedgerError::InvalidInput("document has no root element".to_string()));
        }
        Ok(Value::Object(root))
    }
}

fn parent<'a>(stack: &'a mut [Frame], root: &'a mut Map<String, Value>) -> &'a mut Map<String, Value> {
    match stack.last_mut() {
        Some(frame) => &mut frame.children,
        None => root,
    }
}

fn insert_child(parent: &mut Map<String, Value>, name: String, value: Value) {
    match parent.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.insert(name, value);
        }
    }
}

fn xml_error(error: quick_xml::Error) -> LedgerError {
    InfraError::from(error).into()
}
