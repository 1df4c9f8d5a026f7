use std::fmt;

use serde::Serialize;

/// Name of the header value holding the server-side query time in milliseconds.
pub const QTIME: &str = "QTime";

/// A parsed Riak Search response.
///
/// Solr-compatible responses are made of named lists (the first one being the
/// response header) and an optional result set holding the matched documents.
/// The default value is the empty response, returned whenever a search could
/// not produce anything meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    /// Named lists in the order the server sent them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<NamedList>,

    /// The matched documents, if the server returned a result set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SearchResult>,
}

impl Response {
    /// Returns true if the response carries neither lists nor a result set.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty() && self.result.is_none()
    }

    /// Returns the first named list, usually the response header.
    pub fn first_list(&self) -> Option<&NamedList> {
        self.lists.first()
    }

    /// Returns the named list with the given name.
    pub fn list_by_name(&self, name: &str) -> Option<&NamedList> {
        self.lists.iter().find(|list| list.name == name)
    }

    /// Server-side query time in seconds, read from the first list.
    ///
    /// Returns `None` when there is no list, no `QTime` entry, or the entry is
    /// not numeric.
    pub fn search_time(&self) -> Option<f64> {
        self.first_list()?
            .simple_type_by_name(QTIME)?
            .as_f64()
            .map(|millis| millis / 1000.0)
    }

    /// Number of documents matching the query, as reported by the server.
    pub fn num_found(&self) -> u64 {
        self.result.as_ref().map_or(0, |result| result.num_found)
    }

    /// The documents of the result set.
    pub fn docs(&self) -> &[Document] {
        self.result
            .as_ref()
            .map(|result| result.docs.as_slice())
            .unwrap_or(&[])
    }
}

/// A named list (`<lst>` in Solr XML, a nested object in JSON).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NamedList {
    pub name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<NamedValue>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<NamedList>,
}

impl NamedList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Looks up a typed value of this list by name.
    pub fn simple_type_by_name(&self, name: &str) -> Option<&SimpleValue> {
        self.values
            .iter()
            .find(|value| value.name == name)
            .map(|value| &value.value)
    }

    /// Looks up a nested list by name.
    pub fn list_by_name(&self, name: &str) -> Option<&NamedList> {
        self.lists.iter().find(|list| list.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    pub name: String,
    pub value: SimpleValue,
}

impl NamedValue {
    pub fn new(name: impl Into<String>, value: SimpleValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A typed scalar or array value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SimpleValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Array(Vec<SimpleValue>),
}

impl SimpleValue {
    /// Numeric view of the value. Strings are not coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SimpleValue::Int(value) => Some(*value as f64),
            SimpleValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SimpleValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for SimpleValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimpleValue::Int(value) => write!(f, "{}", value),
            SimpleValue::Float(value) => write!(f, "{}", value),
            SimpleValue::Bool(value) => write!(f, "{}", value),
            SimpleValue::Str(value) => write!(f, "{}", value),
            SimpleValue::Array(values) => {
                let items = values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "[{}]", items)
            }
        }
    }
}

/// The result set of a search (`<result>` in Solr XML, `response` in JSON).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub name: String,
    pub num_found: u64,
    pub start: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    pub docs: Vec<Document>,
}

/// A single matched document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub fields: Vec<NamedValue>,
}

impl Document {
    pub fn get(&self, name: &str) -> Option<&SimpleValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }
}
