//! Query-string construction with form-style encoding.
//!
//! Keys and values are encoded the way HTML forms encode them: unreserved
//! characters pass through, spaces become `+`, everything else is
//! percent-encoded.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except ASCII alphanumerics and `-`, `_`, `.`, `~`.
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A query parameter value: one value, or a list repeated under the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::One(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::One(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for QueryValue {
    fn from(values: Vec<S>) -> Self {
        QueryValue::Many(values.into_iter().map(Into::into).collect())
    }
}

/// Ordered query parameters.
pub type Query = Vec<(String, QueryValue)>;

/// Builds `Query` from `(key, value)` pairs, keeping their order.
///
/// ```
/// use pp_client::query::{query, to_query_string};
///
/// let params = query([("foo", vec!["bar1", "bar2"])]);
/// assert_eq!(to_query_string(&params), "?foo=bar1&foo=bar2");
/// ```
pub fn query<K, V, I>(pairs: I) -> Query
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<QueryValue>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Renders `params` as `?k=v&k2=v2`, or `""` when there are none.
pub fn to_query_string(params: &[(String, QueryValue)]) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        let key = quote_plus(key);
        match value {
            QueryValue::One(value) => pairs.push(format!("{key}={}", quote_plus(value))),
            QueryValue::Many(values) => {
                for value in values {
                    pairs.push(format!("{key}={}", quote_plus(value)));
                }
            }
        }
    }
    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

/// Form-encodes a single component, mapping spaces to `+`.
pub fn quote_plus(s: &str) -> String {
    s.split(' ')
        .map(|part| utf8_percent_encode(part, FORM_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("+")
}
