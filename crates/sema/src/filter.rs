//! Filter-list normalization: raw caller items in, well-formed predicates out.

use serde_json::Value as JsonValue;

use crate::value::MetaValue;

/// Comparator applied to the attribute value. The operator set is closed;
/// tokens outside it invalidate the carrying filter item.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compare {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Compare {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Compare::Eq),
            "!=" => Some(Compare::Ne),
            "<" => Some(Compare::Lt),
            "<=" => Some(Compare::Lte),
            ">" => Some(Compare::Gt),
            ">=" => Some(Compare::Gte),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Compare::Eq => "=",
            Compare::Ne => "!=",
            Compare::Lt => "<",
            Compare::Lte => "<=",
            Compare::Gt => ">",
            Compare::Gte => ">=",
        }
    }
}

/// How sibling predicates combine inside one filtering call. Mixed
/// combinators within a single call are out of scope.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Relation {
    And,
    Or,
}

impl Relation {
    /// Case-sensitive: exactly `"OR"` selects Or, anything else is And.
    pub fn resolve(token: &str) -> Self {
        if token == "OR" {
            Relation::Or
        } else {
            Relation::And
        }
    }
}

/// A normalized (key, value, comparator) predicate. Transient; never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct MetaFilter {
    pub key: String,
    pub value: MetaValue,
    pub compare: Compare,
}

impl MetaFilter {
    pub fn new(key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            compare: Compare::Eq,
        }
    }

    pub fn with_compare(key: impl Into<String>, value: impl Into<MetaValue>, compare: Compare) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            compare,
        }
    }

    /// A raw item survives only as a JSON object carrying a non-empty
    /// string `key` and a scalar `value`; `comparator` defaults to `=`.
    fn from_item(item: &JsonValue) -> Option<Self> {
        let item = item.as_object()?;
        let key = item.get("key")?.as_str()?;
        if key.is_empty() {
            return None;
        }
        let value = MetaValue::from_json(item.get("value")?)?;
        let compare = match item.get("comparator") {
            None => Compare::Eq,
            Some(token) => Compare::parse(token.as_str()?)?,
        };
        Some(Self {
            key: key.to_string(),
            value,
            compare,
        })
    }
}

/// Canonicalize a caller-supplied filter list. Malformed entries are
/// dropped, relative order of the survivors is preserved, and nothing here
/// errors: callers build these lists programmatically and may include
/// placeholder entries.
pub fn normalize_filters(items: &[JsonValue]) -> Vec<MetaFilter> {
    items.iter().filter_map(MetaFilter::from_item).collect()
}
