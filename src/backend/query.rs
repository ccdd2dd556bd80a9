//! Table filters in the hosted backend's (PostgREST) dialect.
//!
//! The same [`Query`] renders to URL parameters for the REST backend and is
//! evaluated directly against JSON rows by the in-memory backend.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    /// Case-insensitive SQL pattern; `%` matches any run of characters.
    ILike(String, String),
    In(String, Vec<Value>),
    /// Array column containing every listed value.
    Contains(String, Vec<Value>),
    IsNull(String),
    NotNull(String),
    /// Any of the nested filters.
    Or(Vec<Filter>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, f: Filter) -> Self {
        self.filters.push(f);
        self
    }

    pub fn eq(self, column: &str, v: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(column.to_string(), v.into()))
    }

    pub fn neq(self, column: &str, v: impl Into<Value>) -> Self {
        self.filter(Filter::Neq(column.to_string(), v.into()))
    }

    pub fn gt(self, column: &str, v: impl Into<Value>) -> Self {
        self.filter(Filter::Gt(column.to_string(), v.into()))
    }

    pub fn gte(self, column: &str, v: impl Into<Value>) -> Self {
        self.filter(Filter::Gte(column.to_string(), v.into()))
    }

    pub fn lt(self, column: &str, v: impl Into<Value>) -> Self {
        self.filter(Filter::Lt(column.to_string(), v.into()))
    }

    pub fn lte(self, column: &str, v: impl Into<Value>) -> Self {
        self.filter(Filter::Lte(column.to_string(), v.into()))
    }

    pub fn ilike(self, column: &str, pattern: impl Into<String>) -> Self {
        self.filter(Filter::ILike(column.to_string(), pattern.into()))
    }

    pub fn in_list<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filter(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn contains<V: Into<Value>>(
        self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filter(Filter::Contains(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(Filter::IsNull(column.to_string()))
    }

    pub fn not_null(self, column: &str) -> Self {
        self.filter(Filter::NotNull(column.to_string()))
    }

    pub fn or(self, filters: Vec<Filter>) -> Self {
        self.filter(Filter::Or(filters))
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }

    /// Renders `(name, value)` URL parameters, values not yet percent-encoded.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 3);
        for f in &self.filters {
            match f {
                Filter::Or(inner) => {
                    let parts: Vec<String> = inner.iter().map(render_nested).collect();
                    params.push(("or".to_string(), format!("({})", parts.join(","))));
                }
                other => {
                    let (col, expr) = render(other);
                    params.push((col, expr));
                }
            }
        }
        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        params
    }

    /// Percent-encoded query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        self.to_params()
            .into_iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(&k), urlencoding::encode(&v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Whether a row satisfies every filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Filters, orders and paginates rows in place of the database.
    pub fn apply(&self, rows: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut out: Vec<Value> = rows.into_iter().filter(|r| self.matches(r)).collect();
        if !self.order.is_empty() {
            out.sort_by(|a, b| {
                for o in &self.order {
                    let ord = compare_nullable(a.get(&o.column), b.get(&o.column));
                    let ord = if o.ascending { ord } else { ord.reverse() };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }
        let offset = self.offset.unwrap_or(0);
        let iter = out.into_iter().skip(offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

fn scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn quoted_list(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| match v {
            Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            other => scalar(other),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn render(f: &Filter) -> (String, String) {
    match f {
        Filter::Eq(c, Value::Null) => (c.clone(), "is.null".to_string()),
        Filter::Eq(c, v) => (c.clone(), format!("eq.{}", scalar(v))),
        Filter::Neq(c, v) => (c.clone(), format!("neq.{}", scalar(v))),
        Filter::Gt(c, v) => (c.clone(), format!("gt.{}", scalar(v))),
        Filter::Gte(c, v) => (c.clone(), format!("gte.{}", scalar(v))),
        Filter::Lt(c, v) => (c.clone(), format!("lt.{}", scalar(v))),
        Filter::Lte(c, v) => (c.clone(), format!("lte.{}", scalar(v))),
        Filter::ILike(c, p) => (c.clone(), format!("ilike.{}", p.replace('%', "*"))),
        Filter::In(c, vs) => (c.clone(), format!("in.({})", quoted_list(vs))),
        Filter::Contains(c, vs) => (c.clone(), format!("cs.{{{}}}", quoted_list(vs))),
        Filter::IsNull(c) => (c.clone(), "is.null".to_string()),
        Filter::NotNull(c) => (c.clone(), "not.is.null".to_string()),
        Filter::Or(inner) => {
            let parts: Vec<String> = inner.iter().map(render_nested).collect();
            ("or".to_string(), format!("({})", parts.join(",")))
        }
    }
}

// Inside `or=(...)` filters are written `column.op.value`.
fn render_nested(f: &Filter) -> String {
    match f {
        Filter::Or(inner) => {
            let parts: Vec<String> = inner.iter().map(render_nested).collect();
            format!("or({})", parts.join(","))
        }
        other => {
            let (col, expr) = render(other);
            format!("{}.{}", col, expr)
        }
    }
}

fn as_datetime(v: &Value) -> Option<DateTime<Utc>> {
    v.as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

/// Orders two JSON scalars: numbers numerically, RFC 3339 strings as instants,
/// other strings lexicographically. Mismatched types are incomparable.
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => match (as_datetime(a), as_datetime(b)) {
            (Some(dx), Some(dy)) => Some(dx.cmp(&dy)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

// Nulls sort last, as in PostgreSQL's default ascending order.
fn compare_nullable(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(Ordering::Equal) || a == b
}

fn like_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::from("(?is)^");
    for part in pattern.split(['%', '*']).enumerate() {
        if part.0 > 0 {
            re.push_str(".*");
        }
        re.push_str(&regex::escape(part.1));
    }
    re.push('$');
    Regex::new(&re).ok()
}

static NULL: Value = Value::Null;

impl Filter {
    pub fn matches(&self, row: &Value) -> bool {
        let field = |c: &str| row.get(c).unwrap_or(&NULL);
        match self {
            Filter::Eq(c, v) => loose_eq(field(c), v),
            Filter::Neq(c, v) => !field(c).is_null() && !loose_eq(field(c), v),
            Filter::Gt(c, v) => compare(field(c), v) == Some(Ordering::Greater),
            Filter::Gte(c, v) => matches!(
                compare(field(c), v),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lt(c, v) => compare(field(c), v) == Some(Ordering::Less),
            Filter::Lte(c, v) => matches!(
                compare(field(c), v),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Filter::ILike(c, p) => match (field(c).as_str(), like_regex(p)) {
                (Some(s), Some(re)) => re.is_match(s),
                _ => false,
            },
            Filter::In(c, vs) => vs.iter().any(|v| loose_eq(field(c), v)),
            Filter::Contains(c, vs) => match field(c).as_array() {
                Some(items) => vs.iter().all(|v| items.iter().any(|i| loose_eq(i, v))),
                None => false,
            },
            Filter::IsNull(c) => field(c).is_null(),
            Filter::NotNull(c) => !field(c).is_null(),
            Filter::Or(inner) => inner.iter().any(|f| f.matches(row)),
        }
    }
}
