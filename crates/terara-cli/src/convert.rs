//! JSON <-> codec value conversion for command-line input and output.

use anyhow::bail;
use serde_json::{Map, Number, Value as Json};
use terara_types::{Fields, Value};

/// Convert parsed JSON into a codec value.
///
/// Integers become `Int64`, other numbers `Float`, objects `Document`.
/// Integers outside the `i64` range are rejected rather than rounded.
pub fn from_json(json: &Json) -> anyhow::Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else if n.is_u64() {
                bail!("integer {n} does not fit in 64 signed bits");
            } else {
                match n.as_f64() {
                    Some(x) => Value::Float(x),
                    None => bail!("unrepresentable number {n}"),
                }
            }
        }
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => {
            Value::Array(items.iter().map(from_json).collect::<anyhow::Result<_>>()?)
        }
        Json::Object(map) => Value::Document(fields_from_json(map)?),
    })
}

pub fn fields_from_json(map: &Map<String, Json>) -> anyhow::Result<Fields> {
    map.iter()
        .map(|(k, v)| -> anyhow::Result<(String, Value)> { Ok((k.clone(), from_json(v)?)) })
        .collect()
}

/// Parse `text` as JSON and convert it.
pub fn parse(text: &str) -> anyhow::Result<Value> {
    let json: Json = serde_json::from_str(text)?;
    from_json(&json)
}

/// Convert a codec value to JSON. Non-finite floats become `null`.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Char(c) => Json::String(char::from(*c).to_string()),
        Value::Int32(i) => Json::Number((*i).into()),
        Value::Int64(i) => Json::Number((*i).into()),
        Value::Float(x) => Number::from_f64(*x).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Document(fields) => Json::Object(fields_to_json(fields)),
    }
}

pub fn fields_to_json(fields: &Fields) -> Map<String, Json> {
    fields.iter().map(|(k, v)| (k.clone(), to_json(v))).collect()
}
