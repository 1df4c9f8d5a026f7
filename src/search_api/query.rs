use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use structopt::lazy_static::lazy_static;
use structopt::StructOpt;

/// Writer type used when a query does not ask for one.
pub const DEFAULT_WT: &str = "json";

lazy_static! {
    /// A static mapping of field names to their corresponding query parameter names.
    /// This is used where the Solr parameter is not a valid Rust identifier.
    static ref KEY_MAPPINGS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("q_op", "q.op");
        m
    };
}

/// Macro to insert a field into the parameters map if it is `Some`.
///
/// # Arguments
///
/// * `$obj` - The object containing the field
/// * `$field` - The field name to check and insert
/// * `$params` - The parameters map to insert into
macro_rules! insert_if_some {
    ($obj:expr, $field:ident, $params:expr) => {
        if let Some(value) = &$obj.$field {
            let key = KEY_MAPPINGS
                .get(stringify!($field))
                .unwrap_or(&stringify!($field))
                .to_string();
            $params.insert(key, value.to_string());
        }
    };
}

/// A Riak Search query.
///
/// Mirrors the parameters accepted by the Solr-compatible `select` endpoint.
/// Only `q` and `wt` are always sent; the other parameters are sent when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, StructOpt)]
pub struct Query {
    /// The search query string.
    #[structopt(short = "q", long = "query", help = "The search query string")]
    pub q: String,

    /// Field searched when the query does not name one.
    #[structopt(long, help = "The default field")]
    pub df: Option<String>,

    /// Default operator between terms (`and` or `or`).
    #[structopt(long = "op", help = "The default operator")]
    pub q_op: Option<String>,

    /// Index of the first result to return.
    #[structopt(long, help = "The starting index of the results")]
    pub start: Option<u32>,

    /// Maximum number of results to return.
    #[structopt(long, help = "The number of results to return")]
    pub rows: Option<u32>,

    /// Field to sort the results by.
    #[structopt(long, help = "The field to sort by")]
    pub sort: Option<String>,

    /// Response format, also used to pick the deserializer.
    #[structopt(long, default_value = "json", help = "The response format (json or xml)")]
    pub wt: String,

    /// Filter query applied on top of the main query.
    #[structopt(long, help = "The filter query")]
    pub filter: Option<String>,

    /// Sort mode applied before the result window is taken (`key` or `score`).
    #[structopt(long, help = "The presort mode")]
    pub presort: Option<String>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            q: String::new(),
            df: None,
            q_op: None,
            start: None,
            rows: None,
            sort: None,
            wt: DEFAULT_WT.to_string(),
            filter: None,
            presort: None,
        }
    }
}

impl Query {
    /// Creates a query for the given search string with default parameters.
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Default::default()
        }
    }

    /// Sets the response format.
    pub fn with_wt(mut self, wt: impl Into<String>) -> Self {
        self.wt = wt.into();
        self
    }

    /// Sets the result window.
    pub fn with_window(mut self, start: u32, rows: u32) -> Self {
        self.start = Some(start);
        self.rows = Some(rows);
        self
    }

    /// Sets the sort field.
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Sets the default field.
    pub fn with_df(mut self, df: impl Into<String>) -> Self {
        self.df = Some(df.into());
        self
    }

    /// Sets the filter query.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// The writer type, selecting how the response body is parsed.
    pub fn wt(&self) -> &str {
        &self.wt
    }

    /// Converts the query into a map of query parameters.
    ///
    /// # Returns
    /// A `HashMap` holding `q`, `wt` and every optional parameter that is set.
    pub fn config(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();

        // Required fields
        params.insert("q".to_string(), self.q.clone());
        params.insert("wt".to_string(), self.wt.clone());

        // Optional fields
        insert_if_some!(self, df, params);
        insert_if_some!(self, q_op, params);
        insert_if_some!(self, start, params);
        insert_if_some!(self, rows, params);
        insert_if_some!(self, sort, params);
        insert_if_some!(self, filter, params);
        insert_if_some!(self, presort, params);

        params
    }
}

impl From<&Query> for HashMap<String, String> {
    fn from(query: &Query) -> Self {
        query.config()
    }
}

impl FromStr for Query {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Query::new(s))
    }
}

impl From<&str> for Query {
    fn from(q: &str) -> Self {
        Query::new(q)
    }
}

impl From<String> for Query {
    fn from(q: String) -> Self {
        Query::new(q)
    }
}

// A search can be started from a bare query string or from a fully built
// query. Both are normalized into a `Query` before anything else happens, so
// the rest of the search path only ever deals with one shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    Raw(String),
    Structured(Query),
}

impl QueryInput {
    /// Resolves the input into a query, wrapping raw strings with default parameters.
    pub fn into_query(self) -> Query {
        match self {
            QueryInput::Raw(q) => Query::new(q),
            QueryInput::Structured(query) => query,
        }
    }
}

impl From<&str> for QueryInput {
    fn from(q: &str) -> Self {
        QueryInput::Raw(q.to_string())
    }
}

impl From<String> for QueryInput {
    fn from(q: String) -> Self {
        QueryInput::Raw(q)
    }
}

impl From<Query> for QueryInput {
    fn from(query: Query) -> Self {
        QueryInput::Structured(query)
    }
}

impl From<&Query> for QueryInput {
    fn from(query: &Query) -> Self {
        QueryInput::Structured(query.clone())
    }
}
