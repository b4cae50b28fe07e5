use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

use super::answers::{self, Answer};
use super::parser::ParsedSubmission;

/// Marketing query parameters copied through to custom data when present.
const MARKETING_KEYS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
];

const EMAIL_KEYS: &[&str] = &["email", "emailAddress", "email_address"];
const FULL_NAME_KEYS: &[&str] = &["name", "fullName", "full_name"];
const FIRST_NAME_KEYS: &[&str] = &["firstName", "first_name", "fname"];
const LAST_NAME_KEYS: &[&str] = &["lastName", "last_name", "lname"];
const PHONE_KEYS: &[&str] = &["phone", "phoneNumber", "phone_number", "mobile"];
const SECONDARY_PHONE_KEYS: &[&str] = &["homePhone", "workPhone", "secondaryPhone"];
const DOB_KEYS: &[&str] = &["dob", "dateOfBirth", "date_of_birth", "birthDate", "birthdate"];
const FBP_KEYS: &[&str] = &["fbp", "_fbp"];
const FBC_KEYS: &[&str] = &["fbc", "_fbc"];
/// Hidden dedup field a browser-side snippet plants in the form.
const EVENT_ID_KEYS: &[&str] = &["event_id", "eventId"];
/// The form builder's own submission identifier. Not designed for
/// cross-system idempotency, so it only serves as a fallback.
const INTERNAL_ID_KEYS: &[&str] = &["submissionID", "submission_id"];
const PAGE_URL_KEYS: &[&str] = &[
    "pageUrl",
    "page_url",
    "parentURL",
    "parent_url",
    "referer",
    "referrer",
];

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?[\d\s().-]{7,20}$").unwrap());
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}$").unwrap());
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}][\p{L} .'\-]{1,79}$").unwrap());

/// Best-effort applicant attributes recovered from a submission. Every
/// field is optional; extraction never fails a request.
#[derive(Debug, Default, Clone)]
pub struct Extracted {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub secondary_phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub marketing: Map<String, Value>,
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub event_id: Option<String>,
    pub page_url: Option<String>,
}

pub fn extract(submission: &ParsedSubmission) -> Extracted {
    let mut out = Extracted::default();

    out.email =
        lookup_scalar(submission, EMAIL_KEYS).or_else(|| scan(submission, FieldKind::Email));

    out.first_name = lookup_scalar(submission, FIRST_NAME_KEYS);
    out.last_name = lookup_scalar(submission, LAST_NAME_KEYS);
    if out.first_name.is_none() && out.last_name.is_none() {
        let full = lookup_answer(submission, FULL_NAME_KEYS);
        match full {
            Some(Answer::Name { first, last }) => {
                out.first_name = first;
                out.last_name = last;
            }
            Some(other) => {
                let (first, last) = split_full_name(&other.into_scalar());
                out.first_name = first;
                out.last_name = last;
            }
            None => {
                if let Some(name) = scan(submission, FieldKind::Name) {
                    let (first, last) = split_full_name(&name);
                    out.first_name = first;
                    out.last_name = last;
                }
            }
        }
    }

    out.phone =
        lookup_scalar(submission, PHONE_KEYS).or_else(|| scan(submission, FieldKind::Phone));
    out.secondary_phone = lookup_scalar(submission, SECONDARY_PHONE_KEYS);

    out.date_of_birth =
        lookup_scalar(submission, DOB_KEYS).or_else(|| scan(submission, FieldKind::Date));

    for key in MARKETING_KEYS.iter().copied() {
        if let Some(v) = lookup_scalar(submission, &[key]) {
            out.marketing.insert(key.to_string(), Value::String(v));
        }
    }

    out.fbp = lookup_scalar(submission, FBP_KEYS);
    out.fbc = lookup_scalar(submission, FBC_KEYS);
    out.page_url = lookup_scalar(submission, PAGE_URL_KEYS);

    // Browser-supplied dedup field wins over the form builder's own id.
    out.event_id = lookup_scalar(submission, EVENT_ID_KEYS)
        .or_else(|| lookup_scalar(submission, INTERNAL_ID_KEYS));

    if out.fbc.is_none() {
        let click_id = out
            .marketing
            .get("fbclid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| out.page_url.as_deref().and_then(click_id_from_url));
        if let Some(id) = click_id {
            out.fbc = Some(synthesize_fbc(&id, Utc::now().timestamp_millis()));
        }
    }

    out
}

/// Rebuild a click cookie from a click id found in the parent page URL:
/// `fb.1.<millis>.<clickid>`. A compatibility shim for sessions where the
/// cookie itself never reached the form.
pub fn synthesize_fbc(click_id: &str, now_millis: i64) -> String {
    format!("fb.1.{now_millis}.{click_id}")
}

/// Pull the platform click identifier out of a referring page URL.
pub fn click_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "fbclid")
        .map(|(_, v)| v.into_owned())
}

fn split_full_name(full: &str) -> (Option<String>, Option<String>) {
    let full = full.trim();
    if full.is_empty() {
        return (None, None);
    }
    match full.split_once(char::is_whitespace) {
        Some((first, last)) => (
            Some(first.to_string()),
            Some(last.trim().to_string()).filter(|s| !s.is_empty()),
        ),
        None => (Some(full.to_string()), None),
    }
}

/// Candidate values for a logical field, in lookup priority order: exact
/// key in the flat fields, exact key in the raw blob, then `…_<key>`
/// suffix matches in either.
fn candidates<'a>(submission: &'a ParsedSubmission, keys: &[&str]) -> Vec<&'a Value> {
    let mut found = Vec::new();
    for key in keys {
        if let Some(v) = submission.fields.get(*key) {
            found.push(v);
        }
    }
    for key in keys {
        if let Some(v) = submission.raw.get(*key) {
            found.push(v);
        }
    }
    for map in [&submission.fields, &submission.raw] {
        for key in keys {
            let suffix = format!("_{key}");
            for (k, v) in map.iter() {
                if k.ends_with(&suffix) {
                    found.push(v);
                }
            }
        }
    }
    found
}

/// First candidate that decodes to a recognized answer shape wins; no
/// merging of partial matches from different sources.
fn lookup_answer(submission: &ParsedSubmission, keys: &[&str]) -> Option<Answer> {
    candidates(submission, keys)
        .into_iter()
        .find_map(Answer::decode)
}

fn lookup_scalar(submission: &ParsedSubmission, keys: &[&str]) -> Option<String> {
    lookup_answer(submission, keys).map(Answer::into_scalar)
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Email,
    Phone,
    Date,
    Name,
}

/// Last-resort scan across every submission entry, keyed on the question
/// name and the value's shape. Only reached when exact and suffix lookups
/// found nothing for the field.
fn scan(submission: &ParsedSubmission, kind: FieldKind) -> Option<String> {
    scan_map(&submission.raw, kind).or_else(|| scan_map(&submission.fields, kind))
}

fn scan_map(map: &Map<String, Value>, kind: FieldKind) -> Option<String> {
    for (key, value) in map {
        let hint = answers::question_name(value).unwrap_or(key.as_str()).to_lowercase();
        let Some(answer) = Answer::decode(value) else {
            continue;
        };

        // Structured shapes identify themselves regardless of key name.
        match (&answer, kind) {
            (Answer::Phone(_), FieldKind::Phone)
            | (Answer::Date { .. }, FieldKind::Date)
            | (Answer::Name { .. }, FieldKind::Name) => return Some(answer.into_scalar()),
            _ => {}
        }

        let Answer::Text(text) = answer else {
            continue;
        };
        let matched = match kind {
            FieldKind::Email => EMAIL_RE.is_match(&text),
            FieldKind::Phone => {
                key_hints(&hint, &["phone", "mobile", "tel"]) && PHONE_RE.is_match(&text)
            }
            FieldKind::Date => key_hints(&hint, &["birth", "dob"]) && DATE_RE.is_match(&text),
            FieldKind::Name => {
                key_hints(&hint, &["name"])
                    && !hint.contains("user")
                    && !hint.contains("file")
                    && NAME_RE.is_match(&text)
            }
        };
        if matched {
            return Some(text);
        }
    }
    None
}

fn key_hints(key: &str, hints: &[&str]) -> bool {
    hints.iter().any(|h| key.contains(h))
}
