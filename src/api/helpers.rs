//! Request decoding and response encoding shared by every handler.
//!
//! ## JSON bodies
//!
//! [`read_json`] reads at most [`MAX_BODY_BYTES`] and decodes exactly one
//! JSON value into a typed input struct. Input structs are declared with
//! `#[serde(deny_unknown_fields)]`, so stray keys are rejected rather than
//! ignored. Every failure becomes a [`JsonError`] whose text is safe to show
//! to the client.
//!
//! [`write_json`] is the single place responses are serialized: an
//! [`Envelope`] with sorted keys, tab-indented, newline-terminated.
//!
//! ## Query strings
//!
//! The `read_*` helpers pull one typed value out of a [`QueryValues`]. Parse
//! failures are recorded on the request's [`Validator`] and the default is
//! returned, so a handler can collect every bad parameter before answering.

use crate::libs::validator::Validator;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::error::Category;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 1_048_576;

/// Client-facing reasons a request body could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonError {
    #[error("body must not be empty")]
    Empty,
    #[error("body contains badly-formed JSON (at character {0})")]
    Syntax(usize),
    #[error("body contains badly-formed JSON")]
    Truncated,
    #[error("body contains incorrect JSON type for field {0:?}")]
    IncorrectFieldType(String),
    #[error("body contains incorrect JSON type (at character {0})")]
    IncorrectType(usize),
    #[error("body contains unknown key {0:?}")]
    UnknownKey(String),
    #[error("body contains duplicate key {0:?}")]
    DuplicateKey(String),
    #[error("body must not be larger than {0} bytes")]
    TooLarge(usize),
    #[error("body must only contain a single value")]
    MultipleValues,
    #[error("unable to read body: {0}")]
    Read(String),
}

/// Reads the whole body, enforcing [`MAX_BODY_BYTES`], and decodes it.
pub async fn read_json<T: DeserializeOwned>(body: Body) -> Result<T, JsonError> {
    let bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => return Err(JsonError::TooLarge(MAX_BODY_BYTES)),
        Err(err) => return Err(JsonError::Read(err.to_string())),
    };
    decode_json(&bytes)
}

/// Decodes exactly one JSON value from `bytes` into `T`.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, JsonError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(JsonError::Empty);
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut de).map_err(|err| classify::<T>(bytes, &err))?;

    // Anything but whitespace after the first value is a second value.
    de.end().map_err(|_| JsonError::MultipleValues)?;

    Ok(value)
}

fn classify<T: DeserializeOwned>(bytes: &[u8], err: &serde_json::Error) -> JsonError {
    let offset = byte_offset(bytes, err.line(), err.column());

    match err.classify() {
        Category::Syntax => JsonError::Syntax(offset),
        Category::Eof => JsonError::Truncated,
        Category::Io => JsonError::Read(err.to_string()),
        Category::Data => {
            let message = err.to_string();
            if let Some(field) = quoted_field(&message, "unknown field `") {
                return JsonError::UnknownKey(field);
            }
            if let Some(field) = quoted_field(&message, "duplicate field `") {
                return JsonError::DuplicateKey(field);
            }
            match mistyped_field::<T>(bytes) {
                Some(field) => JsonError::IncorrectFieldType(field),
                None => JsonError::IncorrectType(offset),
            }
        }
    }
}

fn quoted_field(message: &str, prefix: &str) -> Option<String> {
    message.strip_prefix(prefix).and_then(|rest| rest.split('`').next()).map(str::to_string)
}

/// Deserializes a field where JSON `null` means "not set".
///
/// Use with `#[serde(default, deserialize_with = "null_as_default")]`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Finds the top-level key whose value `T` rejects on its own.
///
/// serde_json reports where a type mismatch happened but not which field it
/// belonged to. Input structs default every field, so decoding one key at a
/// time pinpoints the offending one.
fn mistyped_field<T: DeserializeOwned>(bytes: &[u8]) -> Option<String> {
    let object: Map<String, Value> = serde_json::from_slice(bytes).ok()?;

    object.into_iter().find_map(|(key, value)| {
        let single = Map::from_iter([(key.clone(), value)]);
        serde_json::from_value::<T>(Value::Object(single)).is_err().then_some(key)
    })
}

/// Converts serde_json's 1-based line/column into a byte offset.
fn byte_offset(bytes: &[u8], line: usize, column: usize) -> usize {
    let line_start: usize = bytes.split(|b| *b == b'\n').take(line.saturating_sub(1)).map(|l| l.len() + 1).sum();
    line_start + column
}

/// A response body wrapped in named top-level fields.
///
/// Keys serialize in sorted order so output is stable.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct Envelope(BTreeMap<&'static str, Value>);

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Envelope with a single field.
    pub fn single<T: Serialize>(key: &'static str, data: T) -> serde_json::Result<Self> {
        Self::new().with(key, data)
    }

    pub fn with<T: Serialize>(mut self, key: &'static str, data: T) -> serde_json::Result<Self> {
        self.0.insert(key, serde_json::to_value(data)?);
        Ok(self)
    }
}

/// Serializes `data` and builds the response.
///
/// Extra `headers` are applied before `Content-Type` is set.
pub fn write_json(status: StatusCode, data: &Envelope, headers: HeaderMap) -> serde_json::Result<Response> {
    let mut js = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut js, formatter);
    data.serialize(&mut ser)?;
    js.push(b'\n');

    let mut response = (status, js).into_response();
    let response_headers = response.headers_mut();
    response_headers.extend(headers);
    response_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(response)
}

/// Parsed query string. When a key repeats, the first value wins.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(transparent)]
pub struct QueryValues(Vec<(String, String)>);

impl QueryValues {
    /// Value for `key`, or `""` when absent.
    pub fn get(&self, key: &str) -> &str {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str()).unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        QueryValues(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

pub fn read_string(qs: &QueryValues, key: &str, default_value: &str) -> String {
    match qs.get(key) {
        "" => default_value.to_string(),
        value => value.to_string(),
    }
}

/// Comma-separated list. An absent or empty value yields `default_value`.
pub fn read_csv(qs: &QueryValues, key: &str, default_value: Vec<String>) -> Vec<String> {
    match qs.get(key) {
        "" => default_value,
        value => value.split(',').map(str::to_string).collect(),
    }
}

pub fn read_int(qs: &QueryValues, key: &str, default_value: i64, v: &mut Validator) -> i64 {
    let value = qs.get(key);
    if value.is_empty() {
        return default_value;
    }

    match value.parse::<i64>() {
        Ok(int_value) => int_value,
        Err(_) => {
            v.add_error(key, "must be an integer value");
            default_value
        }
    }
}

pub fn read_bool(qs: &QueryValues, key: &str, default_value: bool, v: &mut Validator) -> bool {
    let value = qs.get(key);
    if value.is_empty() {
        return default_value;
    }

    match parse_bool(value) {
        Some(bool_value) => bool_value,
        None => {
            v.add_error(key, "must be a boolean value");
            default_value
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
