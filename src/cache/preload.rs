//! Predictive Preloading
//!
//! A registry of (pattern, condition, loader) rules used to warm the cache
//! ahead of anticipated reads. Triggering is single-flight: while one trigger
//! is running, further triggers are no-ops. Rule execution is concurrent and
//! failure-isolated; the trigger itself lives on `CacheStore`, which owns the
//! write path preloaded values are admitted through.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use regex::Regex;
use serde_json::Value;

use crate::error::Result;

/// Candidate keys considered per rule per trigger
pub const MAX_CANDIDATES_PER_RULE: usize = 10;

/// Tag applied to every preloaded entry
pub const PRELOAD_TAG: &str = "preloaded";

/// Provenance source recorded for preloaded entries
pub const PRELOAD_SOURCE: &str = "preload";

/// Async value producer supplied per rule
///
/// Must not call back into the same store synchronously; a loader that
/// re-enters `get` can cause unbounded recursive preloading.
pub type LoaderFn = Arc<dyn Fn(String) -> BoxFuture<'static, Result<Option<Value>>> + Send + Sync>;

/// Gate deciding whether a rule runs for a given trigger
pub type ConditionFn = Arc<dyn Fn(&PreloadContext) -> bool + Send + Sync>;

/// Caller-supplied related-key derivation for regex rules
pub type RelatedKeyFn = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Context handed to rule conditions
#[derive(Debug, Clone)]
pub struct PreloadContext {
    /// Key whose access fired the trigger, if any
    pub context_key: Option<String>,
    /// Current memory-tier item count
    pub total_items: u64,
    /// Current hit rate percentage
    pub hit_rate: f64,
}

/// Key pattern a rule applies to
#[derive(Clone)]
pub enum KeyPattern {
    /// Exactly one key
    Exact(String),
    /// Matched against live memory-tier keys
    Regex(Regex),
}

impl KeyPattern {
    /// Build a regex pattern, surfacing invalid syntax synchronously
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(KeyPattern::Regex(Regex::new(pattern)?))
    }
}

impl std::fmt::Debug for KeyPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyPattern::Exact(key) => f.debug_tuple("Exact").field(key).finish(),
            KeyPattern::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
        }
    }
}

/// One registered preload rule
#[derive(Clone)]
pub struct PreloadRule {
    pub id: String,
    pub pattern: KeyPattern,
    pub condition: ConditionFn,
    pub loader: LoaderFn,
    /// Related-key derivation for regex patterns; absent means matches only
    pub derive_related: Option<RelatedKeyFn>,
    /// Priority assigned to admitted values
    pub priority: i32,
    /// Rule ids this rule depends on, for bulk management
    pub dependencies: Vec<String>,
    pub enabled: bool,
}

impl PreloadRule {
    /// Create a rule that always fires when triggered
    pub fn new(id: impl Into<String>, pattern: KeyPattern, loader: LoaderFn) -> Self {
        Self {
            id: id.into(),
            pattern,
            condition: Arc::new(|_| true),
            loader,
            derive_related: None,
            priority: 1,
            dependencies: Vec::new(),
            enabled: true,
        }
    }

    /// Gate execution on a condition
    pub fn with_condition(mut self, condition: ConditionFn) -> Self {
        self.condition = condition;
        self
    }

    /// Set the admitted-value priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Attach a related-key derivation function
    pub fn with_related_keys(mut self, derive: RelatedKeyFn) -> Self {
        self.derive_related = Some(derive);
        self
    }

    /// Declare dependencies on other rules
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl std::fmt::Debug for PreloadRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadRule")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Rule registry with a single-flight trigger guard
#[derive(Default)]
pub struct PreloadEngine {
    rules: DashMap<String, PreloadRule>,
    in_flight: AtomicBool,
}

impl PreloadEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, replacing any rule with the same id
    pub fn add_rule(&self, rule: PreloadRule) {
        self.rules.insert(rule.id.clone(), rule);
    }

    /// Remove a rule by id
    pub fn remove_rule(&self, id: &str) -> bool {
        self.rules.remove(id).is_some()
    }

    /// Enable or disable a rule without removing it
    pub fn set_rule_enabled(&self, id: &str, enabled: bool) -> bool {
        match self.rules.get_mut(id) {
            Some(mut rule) => {
                rule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Number of registered rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Whether a trigger is currently running
    pub fn is_preloading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Clones of all enabled rules
    pub(crate) fn enabled_rules(&self) -> Vec<PreloadRule> {
        self.rules
            .iter()
            .filter(|r| r.value().enabled)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Claim the single-flight slot; `None` when a trigger is already running
    pub(crate) fn begin(&self) -> Option<FlightGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Some(FlightGuard(self))
        } else {
            None
        }
    }
}

impl std::fmt::Debug for PreloadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadEngine")
            .field("rules", &self.rules.len())
            .field("in_flight", &self.is_preloading())
            .finish()
    }
}

/// Releases the single-flight slot on every exit path
pub(crate) struct FlightGuard<'a>(&'a PreloadEngine);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::SeqCst);
    }
}

/// Related-key deriver for `namespace:kind:<id>` shaped keys
///
/// Swaps the middle segment for each variant: with variants
/// `["history", "chart"]`, `zinses:calc:42` derives `zinses:history:42` and
/// `zinses:chart:42`. Keys not matching the three-segment shape derive
/// nothing.
pub fn segment_swap_deriver(variants: &[&str]) -> RelatedKeyFn {
    let variants: Vec<String> = variants.iter().map(|v| v.to_string()).collect();
    Arc::new(move |key: &str| {
        let parts: Vec<&str> = key.split(':').collect();
        if parts.len() != 3 {
            return Vec::new();
        }
        variants
            .iter()
            .map(|v| format!("{}:{}:{}", parts[0], v, parts[2]))
            .collect()
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop_loader() -> LoaderFn {
        Arc::new(|_key| Box::pin(async { Ok(Some(json!(null))) }))
    }

    #[test]
    fn test_rule_registry() {
        let engine = PreloadEngine::new();

        engine.add_rule(PreloadRule::new(
            "r1",
            KeyPattern::Exact("k".to_string()),
            noop_loader(),
        ));
        assert_eq!(engine.rule_count(), 1);

        assert!(engine.remove_rule("r1"));
        assert!(!engine.remove_rule("r1"));
        assert_eq!(engine.rule_count(), 0);
    }

    #[test]
    fn test_rule_enable_disable() {
        let engine = PreloadEngine::new();
        engine.add_rule(PreloadRule::new(
            "r1",
            KeyPattern::Exact("k".to_string()),
            noop_loader(),
        ));

        assert!(engine.set_rule_enabled("r1", false));
        assert!(engine.enabled_rules().is_empty());

        assert!(engine.set_rule_enabled("r1", true));
        assert_eq!(engine.enabled_rules().len(), 1);

        assert!(!engine.set_rule_enabled("missing", true));
    }

    #[test]
    fn test_single_flight_guard() {
        let engine = PreloadEngine::new();

        let guard = engine.begin();
        assert!(guard.is_some());
        assert!(engine.is_preloading());

        // Second claim fails while the first is held
        assert!(engine.begin().is_none());

        drop(guard);
        assert!(!engine.is_preloading());
        assert!(engine.begin().is_some());
    }

    #[test]
    fn test_invalid_regex_pattern_is_synchronous_error() {
        assert!(KeyPattern::regex("calc:(").is_err());
        assert!(KeyPattern::regex("^zinses:calc:").is_ok());
    }

    #[test]
    fn test_segment_swap_deriver() {
        let derive = segment_swap_deriver(&["history", "chart"]);

        assert_eq!(
            derive("zinses:calc:42"),
            vec!["zinses:history:42".to_string(), "zinses:chart:42".to_string()]
        );
        // Non-conforming shapes derive nothing
        assert!(derive("plain-key").is_empty());
        assert!(derive("a:b:c:d").is_empty());
    }

    #[test]
    fn test_rule_builder() {
        let rule = PreloadRule::new("r", KeyPattern::Exact("k".to_string()), noop_loader())
            .with_priority(7)
            .with_dependencies(vec!["base".to_string()])
            .with_condition(Arc::new(|ctx| ctx.total_items > 0));

        assert_eq!(rule.priority, 7);
        assert_eq!(rule.dependencies, vec!["base".to_string()]);
        assert!(!(rule.condition)(&PreloadContext {
            context_key: None,
            total_items: 0,
            hit_rate: 0.0,
        }));
    }
}
