use axum::http::HeaderMap;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Field name under which the form builder embeds its own JSON-encoded
/// representation of the submission.
pub const RAW_BLOB_FIELD: &str = "rawRequest";

/// A decoded inbound submission: the flat field map from the body itself,
/// plus the embedded raw-submission object when one is present.
#[derive(Debug, Default, Clone)]
pub struct ParsedSubmission {
    pub fields: Map<String, Value>,
    pub raw: Map<String, Value>,
}

impl ParsedSubmission {
    fn from_fields(fields: Map<String, Value>) -> Self {
        let raw = decode_raw_blob(fields.get(RAW_BLOB_FIELD));
        Self { fields, raw }
    }
}

/// Parse a request body based on Content-Type header. Multipart bodies go
/// through [`parse_multipart`] instead.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<ParsedSubmission, String> {
    let ct = content_type.unwrap_or("application/json");

    if ct.contains("application/json") {
        parse_json(body)
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)
    } else if ct.contains("multipart/form-data") {
        Err("multipart".to_string())
    } else {
        // Try JSON first, then form-urlencoded
        parse_json(body).or_else(|_| parse_form_urlencoded(body))
    }
}

fn parse_json(body: &[u8]) -> Result<ParsedSubmission, String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;
    let obj = value
        .as_object()
        .cloned()
        .ok_or_else(|| "Expected a JSON object".to_string())?;
    Ok(ParsedSubmission::from_fields(obj))
}

fn parse_form_urlencoded(body: &[u8]) -> Result<ParsedSubmission, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    let pairs: HashMap<String, String> = form_urlencoded::parse(body_str.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert(k, Value::String(v));
    }
    Ok(ParsedSubmission::from_fields(map))
}

/// Parse multipart form data using multer. Boundary tokens, part headers
/// and trailing CRLF variations are handled by the multipart decoder.
pub async fn parse_multipart(
    headers: &HeaderMap,
    body: bytes::Bytes,
) -> Result<ParsedSubmission, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut map = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("unknown").to_string();
        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        map.insert(name, Value::String(value));
    }

    Ok(ParsedSubmission::from_fields(map))
}

/// Decode the embedded raw-submission blob. The blob arrives either as a
/// JSON string (multipart and url-encoded bodies) or as an already-parsed
/// object (JSON bodies). Anything undecodable degrades to an empty object.
fn decode_raw_blob(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) => serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default(),
        _ => Map::new(),
    }
}
