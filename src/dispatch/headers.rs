//! Header input accepted by [`RequestSpec::with_headers`](super::RequestSpec::with_headers).

use http::{HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use super::RequestError;

/// Headers to add to a request.
///
/// Two shapes are accepted:
///
/// - **Structured**: any serializable struct or map. Field names become
///   header names, so `content_type` can be rewritten to `content-type`.
/// - **Flat**: name/value pairs that are already in header form. Names are
///   used exactly as given.
///
/// # Example
///
/// ```
/// use http_sender::dispatch::HeaderInput;
///
/// #[derive(serde::Serialize)]
/// struct Auth {
///     x_api_key: &'static str,
/// }
///
/// let structured = HeaderInput::structured(&Auth { x_api_key: "secret" }).unwrap();
/// let flat = HeaderInput::flat([("X-Trace", "1")]);
/// let parsed = HeaderInput::parse("Accept: text/plain\nX-Mode=fast").unwrap();
/// # let _ = (structured, flat, parsed);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderInput {
    /// A serialized struct or map.
    Structured(Value),
    /// Name/value pairs.
    Flat(Vec<(String, String)>),
}

impl HeaderInput {
    /// Serializes `value` into structured header input.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Serialize`] if serialization fails.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self, RequestError> {
        serde_json::to_value(value)
            .map(Self::Structured)
            .map_err(|source| RequestError::Serialize {
                what: "headers",
                source,
            })
    }

    /// Wraps ready-made name/value pairs.
    pub fn flat<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Flat(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// Parses one header per line, each as `Key=Value` or `Key: Value`.
    ///
    /// Blank lines are skipped. Whichever separator appears first splits the
    /// line, so `Authorization: Basic dXNlcg==` keeps its padding.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidHeaderLine`] for a line without a
    /// separator.
    pub fn parse(text: &str) -> Result<Self, RequestError> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(parse_header_line)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Flat)
    }

    /// Flattens the input into name/value pairs.
    ///
    /// `replace_underscore_with_hyphen` only applies to structured input.
    pub(crate) fn into_pairs(
        self,
        replace_underscore_with_hyphen: bool,
    ) -> Result<Vec<(String, String)>, RequestError> {
        let fields = match self {
            Self::Flat(pairs) => return Ok(pairs),
            Self::Structured(Value::Object(fields)) => fields,
            Self::Structured(Value::Null) => return Err(RequestError::MissingHeaders),
            Self::Structured(other) => {
                return Err(RequestError::UnsupportedHeaders {
                    kind: json_kind(&other),
                });
            }
        };

        let mut pairs = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let name = if replace_underscore_with_hyphen {
                key.replace('_', "-")
            } else {
                key
            };
            push_values(&mut pairs, name, value)?;
        }
        Ok(pairs)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::flat(iter)
    }
}

/// Converts pairs into typed header names and values.
pub(crate) fn to_header_entries(
    pairs: Vec<(String, String)>,
) -> Result<Vec<(HeaderName, HeaderValue)>, RequestError> {
    pairs
        .into_iter()
        .map(|(name, value)| {
            let header_name =
                name.parse::<HeaderName>()
                    .map_err(|e| RequestError::InvalidHeaderName {
                        name: name.clone(),
                        reason: e.to_string(),
                    })?;
            let header_value =
                HeaderValue::from_str(&value).map_err(|e| RequestError::InvalidHeaderValue {
                    name,
                    reason: e.to_string(),
                })?;
            Ok((header_name, header_value))
        })
        .collect()
}

fn parse_header_line(line: &str) -> Result<(String, String), RequestError> {
    let split_at = match (line.find('='), line.find(':')) {
        (Some(eq), Some(colon)) => eq.min(colon),
        (Some(index), None) | (None, Some(index)) => index,
        (None, None) => {
            return Err(RequestError::InvalidHeaderLine {
                line: line.to_string(),
            });
        }
    };

    let (name, value) = line.split_at(split_at);
    Ok((name.trim().to_string(), value[1..].trim().to_string()))
}

/// Appends one field. Arrays become repeated headers; nulls are skipped.
fn push_values(
    pairs: &mut Vec<(String, String)>,
    name: String,
    value: Value,
) -> Result<(), RequestError> {
    match value {
        Value::Null => {}
        Value::String(text) => pairs.push((name, text)),
        Value::Bool(_) | Value::Number(_) => pairs.push((name, value.to_string())),
        Value::Array(items) => {
            for item in items {
                push_values(pairs, name.clone(), item)?;
            }
        }
        Value::Object(_) => {
            return Err(RequestError::InvalidHeaderValue {
                name,
                reason: "nested objects cannot be header values".to_string(),
            });
        }
    }
    Ok(())
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
