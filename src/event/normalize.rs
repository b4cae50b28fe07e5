use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};
use url::Url;

use super::{ConversionEvent, UserData};
use crate::hooks::HookProfile;
use crate::submission::extract::Extracted;
use crate::submission::metadata::RequestMeta;

/// Hosts belonging to the form builder itself are never reported as the
/// event source.
const PLATFORM_HOST_SUFFIXES: &[&str] = &["jotform.com", "jotfor.ms"];

/// One-way digest for a PII field: trim, lowercase, SHA-256, lowercase hex.
pub fn hash_pii(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.trim().to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize a date of birth to the 8-digit `YYYYMMDD` form. Accepts
/// `YYYY-MM-DD`/`YYYY/MM/DD`, `MM/DD/YYYY`/`MM-DD-YYYY` (1- or 2-digit
/// month and day tolerated), and a few spelled-out calendar forms.
/// Unparseable input yields `None`.
pub fn normalize_dob(input: &str) -> Option<String> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    let parts: Vec<&str> = s.split(['-', '/']).collect();
    if parts.len() == 3 {
        if let (Ok(a), Ok(b), Ok(c)) = (
            parts[0].parse::<u32>(),
            parts[1].parse::<u32>(),
            parts[2].parse::<u32>(),
        ) {
            let ymd = if parts[0].len() == 4 {
                Some((a as i32, b, c))
            } else if parts[2].len() == 4 {
                Some((c as i32, a, b))
            } else {
                None
            };
            if let Some((year, month, day)) = ymd {
                return NaiveDate::from_ymd_opt(year, month, day)
                    .map(|date| date.format("%Y%m%d").to_string());
            }
        }
    }

    for fmt in ["%Y%m%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date.format("%Y%m%d").to_string());
        }
    }

    None
}

/// Assemble the outbound event from extracted values. Hashing happens
/// here; raw PII never crosses this boundary.
pub fn build_event(
    hook: &HookProfile,
    extracted: &Extracted,
    meta: &RequestMeta,
    fixed_source_url: Option<&str>,
) -> ConversionEvent {
    let user_data = UserData {
        em: extracted.email.as_deref().map(hash_pii),
        ph: [
            extracted.phone.as_deref(),
            extracted.secondary_phone.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(hash_pii)
        .collect(),
        first_name: extracted.first_name.as_deref().map(hash_pii),
        last_name: extracted.last_name.as_deref().map(hash_pii),
        date_of_birth: extracted
            .date_of_birth
            .as_deref()
            .and_then(normalize_dob)
            .map(|d| hash_pii(&d)),
        client_ip_address: meta.client_ip.clone(),
        client_user_agent: meta.user_agent.clone(),
        fbc: extracted.fbc.clone(),
        fbp: extracted.fbp.clone(),
    };

    let mut custom_data = extracted.marketing.clone();
    for (key, value) in &hook.custom_data {
        custom_data.insert(key.clone(), value.clone());
    }

    ConversionEvent {
        event_name: hook.event_name.as_str(),
        event_time: Utc::now().timestamp(),
        event_id: extracted.event_id.clone(),
        action_source: "website",
        event_source_url: resolve_source_url(fixed_source_url, meta, extracted),
        user_data,
        custom_data,
    }
}

fn resolve_source_url(
    fixed: Option<&str>,
    meta: &RequestMeta,
    extracted: &Extracted,
) -> Option<String> {
    if let Some(url) = fixed {
        return Some(url.to_string());
    }
    meta.referer
        .as_deref()
        .filter(|u| !is_platform_url(u))
        .or_else(|| {
            extracted
                .page_url
                .as_deref()
                .filter(|u| !is_platform_url(u))
        })
        .map(str::to_string)
}

fn is_platform_url(url: &str) -> bool {
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
    else {
        return false;
    };
    PLATFORM_HOST_SUFFIXES
        .iter()
        .any(|s| host == *s || host.ends_with(&format!(".{s}")))
}
