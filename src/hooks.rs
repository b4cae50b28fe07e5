use std::collections::HashMap;

use serde_json::{Map, Value};

/// Outbound event labels. The events API accepts a small fixed set of
/// standard names; each registered hook maps to exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventName {
    Lead,
    CompleteRegistration,
    SubmitApplication,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Lead => "Lead",
            EventName::CompleteRegistration => "CompleteRegistration",
            EventName::SubmitApplication => "SubmitApplication",
        }
    }
}

/// How a hook answers non-POST requests. Some form builders probe an
/// endpoint with GET/HEAD before accepting it; those hooks answer 200
/// to anything, the rest answer 405.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePolicy {
    AlwaysOk,
    MethodNotAllowed,
}

/// One inbound webhook endpoint. Hooks differ only by data, so the
/// registry holds profiles rather than trait objects; every profile runs
/// through the same parse/extract/forward pipeline.
#[derive(Debug, Clone)]
pub struct HookProfile {
    pub slug: &'static str,
    pub event_name: EventName,
    pub probe: ProbePolicy,
    /// Static low-cardinality tags merged into the outbound custom_data.
    pub custom_data: Map<String, Value>,
}

impl HookProfile {
    pub fn new(slug: &'static str, event_name: EventName, probe: ProbePolicy) -> Self {
        Self {
            slug,
            event_name,
            probe,
            custom_data: Map::new(),
        }
    }

    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.custom_data
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }
}

pub struct HookRegistry {
    hooks: HashMap<&'static str, HookProfile>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }

    pub fn register(&mut self, hook: HookProfile) {
        self.hooks.insert(hook.slug, hook);
    }

    pub fn get(&self, slug: &str) -> Option<&HookProfile> {
        self.hooks.get(slug)
    }

    pub fn list(&self) -> Vec<&HookProfile> {
        self.hooks.values().collect()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
