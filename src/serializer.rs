//! Deserialization of Riak Search response bodies.
//!
//! Riak Search speaks the Solr response formats. The writer type (`wt`) of a
//! query decides which one the server answers with, and therefore which
//! parser is used here:
//!
//! - `json`: a top-level object whose `response` member is the result set and
//!   whose other object members are named lists (`responseHeader`, ...).
//! - `xml`: a `<response>` element holding `<lst>` named lists and a
//!   `<result>` element with `<doc>` children.

use std::fmt::Display;
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::SerializerError;
use crate::search_api::response::{
    Document, NamedList, NamedValue, Response, SearchResult, SimpleValue,
};

/// Name of the member holding the matched documents.
const RESULT_NAME: &str = "response";

/// Turns a raw response body into a search response.
///
/// `Ok(None)` means the body carried no response at all.
pub trait Deserializer: Send + Sync {
    fn deserialize(&self, body: &str, format: &str)
        -> Result<Option<Response>, SerializerError>;
}

/// Deserializer for the Solr JSON and XML response writers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolrSerializer;

impl Deserializer for SolrSerializer {
    fn deserialize(
        &self,
        body: &str,
        format: &str,
    ) -> Result<Option<Response>, SerializerError> {
        let format = format.to_lowercase();
        if format != "json" && format != "xml" {
            return Err(SerializerError::UnsupportedFormat(format));
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        match format.as_str() {
            "json" => from_json(body),
            _ => from_xml(body),
        }
    }
}

fn from_json(body: &str) -> Result<Option<Response>, SerializerError> {
    let object = match serde_json::from_str::<Value>(body)? {
        Value::Null => return Ok(None),
        Value::Object(object) => object,
        other => {
            return Err(SerializerError::malformed(format!(
                "expected a JSON object, found {}",
                other
            )))
        }
    };

    let mut response = Response::default();
    for (name, value) in &object {
        match value {
            Value::Object(map) if name == RESULT_NAME => {
                response.result = Some(json_result(name, map)?);
            }
            Value::Object(map) => response.lists.push(json_list(name, map)),
            // Top-level scalars have no place in the response model
            _ => {}
        }
    }

    Ok(Some(response))
}

fn json_list(name: &str, map: &Map<String, Value>) -> NamedList {
    let mut list = NamedList::new(name);
    for (key, value) in map {
        match value {
            Value::Object(inner) => list.lists.push(json_list(key, inner)),
            other => {
                if let Some(value) = json_value(other) {
                    list.values.push(NamedValue::new(key, value));
                }
            }
        }
    }
    list
}

fn json_value(value: &Value) -> Option<SimpleValue> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::Bool(value) => Some(SimpleValue::Bool(*value)),
        Value::Number(number) => number
            .as_i64()
            .map(SimpleValue::Int)
            .or_else(|| number.as_f64().map(SimpleValue::Float)),
        Value::String(value) => Some(SimpleValue::Str(value.clone())),
        Value::Array(items) => Some(SimpleValue::Array(
            items.iter().filter_map(json_value).collect(),
        )),
    }
}

fn json_result(name: &str, map: &Map<String, Value>) -> Result<SearchResult, SerializerError> {
    let docs = match map.get("docs") {
        None => Vec::new(),
        Some(Value::Array(docs)) => docs
            .iter()
            .map(json_document)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(SerializerError::malformed("docs must be an array")),
    };

    Ok(SearchResult {
        name: name.to_string(),
        num_found: map.get("numFound").and_then(Value::as_u64).unwrap_or(0),
        start: map.get("start").and_then(Value::as_u64).unwrap_or(0),
        max_score: map.get("maxScore").and_then(Value::as_f64),
        docs,
    })
}

fn json_document(doc: &Value) -> Result<Document, SerializerError> {
    let Value::Object(fields) = doc else {
        return Err(SerializerError::malformed("documents must be objects"));
    };

    let fields = fields
        .iter()
        .filter_map(|(name, value)| json_value(value).map(|value| NamedValue::new(name, value)))
        .collect();

    Ok(Document { fields })
}

#[derive(Debug, Clone, Copy)]
enum ScalarKind {
    Int,
    Float,
    Bool,
    Str,
}

impl ScalarKind {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"int" | b"long" | b"short" | b"byte" => Some(ScalarKind::Int),
            b"float" | b"double" => Some(ScalarKind::Float),
            b"bool" => Some(ScalarKind::Bool),
            b"str" | b"date" => Some(ScalarKind::Str),
            _ => None,
        }
    }

    fn parse(self, name: &str, text: String) -> Result<SimpleValue, SerializerError> {
        let invalid = |err: &dyn Display| {
            SerializerError::malformed(format!("invalid value for {}: {}", name, err))
        };

        match self {
            ScalarKind::Int => text
                .trim()
                .parse::<i64>()
                .map(SimpleValue::Int)
                .map_err(|e| invalid(&e)),
            ScalarKind::Float => text
                .trim()
                .parse::<f64>()
                .map(SimpleValue::Float)
                .map_err(|e| invalid(&e)),
            ScalarKind::Bool => match text.trim() {
                "true" => Ok(SimpleValue::Bool(true)),
                "false" => Ok(SimpleValue::Bool(false)),
                other => Err(invalid(&other)),
            },
            ScalarKind::Str => Ok(SimpleValue::Str(text)),
        }
    }
}

// An element being read. Elements are pushed on start tags and turned into
// nodes on end tags, then attached to whatever encloses them.
enum Frame {
    Root,
    List(NamedList),
    Array {
        name: String,
        items: Vec<SimpleValue>,
    },
    Scalar {
        name: String,
        kind: ScalarKind,
        text: String,
    },
    Result(SearchResult),
    Doc(Document),
    Ignored,
}

enum Node {
    Value(NamedValue),
    List(NamedList),
    Result(SearchResult),
    Doc(Document),
}

fn from_xml(body: &str) -> Result<Option<Response>, SerializerError> {
    // Text is kept as sent, whitespace between elements never reaches a scalar
    let mut reader = Reader::from_str(body);

    let mut stack: Vec<Frame> = Vec::new();
    let mut response = Response::default();

    loop {
        match reader.read_event()? {
            Event::Start(element) => stack.push(open_frame(&element)?),
            Event::Empty(element) => {
                let node = close_frame(open_frame(&element)?)?;
                attach(&mut stack, &mut response, node);
            }
            Event::Text(text) => {
                if let Some(Frame::Scalar { text: value, .. }) = stack.last_mut() {
                    value.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(Frame::Scalar { text: value, .. }) = stack.last_mut() {
                    let data = std::str::from_utf8(&data)
                        .map_err(|e| SerializerError::malformed(e.to_string()))?;
                    value.push_str(data);
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| SerializerError::malformed("unbalanced closing tag"))?;
                let node = close_frame(frame)?;
                attach(&mut stack, &mut response, node);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(SerializerError::malformed("unexpected end of document"));
    }

    Ok(Some(response))
}

fn open_frame(element: &BytesStart) -> Result<Frame, SerializerError> {
    let name = attribute(element, "name")?.unwrap_or_default();

    let frame = match element.name().as_ref() {
        b"response" => Frame::Root,
        b"lst" => Frame::List(NamedList::new(name)),
        b"arr" => Frame::Array {
            name,
            items: Vec::new(),
        },
        b"result" => Frame::Result(SearchResult {
            name,
            num_found: parse_attribute(element, "numFound")?.unwrap_or(0),
            start: parse_attribute(element, "start")?.unwrap_or(0),
            max_score: parse_attribute(element, "maxScore")?,
            docs: Vec::new(),
        }),
        b"doc" => Frame::Doc(Document::default()),
        tag => match ScalarKind::from_tag(tag) {
            Some(kind) => Frame::Scalar {
                name,
                kind,
                text: String::new(),
            },
            None => Frame::Ignored,
        },
    };

    Ok(frame)
}

fn close_frame(frame: Frame) -> Result<Option<Node>, SerializerError> {
    let node = match frame {
        Frame::Root | Frame::Ignored => None,
        Frame::List(list) => Some(Node::List(list)),
        Frame::Array { name, items } => {
            Some(Node::Value(NamedValue::new(name, SimpleValue::Array(items))))
        }
        Frame::Scalar { name, kind, text } => {
            let value = kind.parse(&name, text)?;
            Some(Node::Value(NamedValue::new(name, value)))
        }
        Frame::Result(result) => Some(Node::Result(result)),
        Frame::Doc(doc) => Some(Node::Doc(doc)),
    };

    Ok(node)
}

fn attach(stack: &mut [Frame], response: &mut Response, node: Option<Node>) {
    let Some(node) = node else {
        return;
    };

    match (stack.last_mut(), node) {
        (Some(Frame::List(list)), Node::Value(value)) => list.values.push(value),
        (Some(Frame::List(list)), Node::List(inner)) => list.lists.push(inner),
        (Some(Frame::Array { items, .. }), Node::Value(value)) => items.push(value.value),
        (Some(Frame::Doc(doc)), Node::Value(value)) => doc.fields.push(value),
        (Some(Frame::Result(result)), Node::Doc(doc)) => result.docs.push(doc),
        (None | Some(Frame::Root), Node::List(list)) => response.lists.push(list),
        (None | Some(Frame::Root), Node::Result(result)) => response.result = Some(result),
        // Anything else sits where the response model has no slot for it
        _ => {}
    }
}

fn attribute(element: &BytesStart, key: &str) -> Result<Option<String>, SerializerError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| SerializerError::malformed(e.to_string()))?;
        if attr.key.as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }

    Ok(None)
}

fn parse_attribute<T>(element: &BytesStart, key: &str) -> Result<Option<T>, SerializerError>
where
    T: FromStr,
    T::Err: Display,
{
    attribute(element, key)?
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                SerializerError::malformed(format!("invalid {} \"{}\": {}", key, raw, e))
            })
        })
        .transpose()
}
