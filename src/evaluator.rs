//! Policy evaluation with memoized decisions
//!
//! Resolves `(role, resource, verb, names)` to a boolean. The walk is a
//! logical OR over the role's policies: the first matching policy whose verb
//! applies, and whose name-scope accepts any offered name, grants the whole
//! query. Every decision must agree with the server-side enforcement point
//! that independently re-checks privileged requests; this evaluator is the
//! UX layer, not the security boundary.

use tracing::{debug, trace};

use crate::cache::{DecisionCache, DecisionKey};
use crate::pattern::{GlobMatcher, Matcher};
use crate::role::{Policy, Role};

/// Default decision-cache capacity (entries)
pub(crate) const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Policy evaluator with a shared decision cache
///
/// The matcher is a type parameter so tests can inject a counting
/// implementation; production callers use the [`GlobMatcher`] default.
///
/// # Examples
///
/// ```
/// use rolegate::{PolicyEvaluator, Role};
///
/// let mut role = Role::new("operator");
/// role.add_policy(&["experiments"], &["*", "*/*"], &["get"]);
///
/// let authz = PolicyEvaluator::new_default();
/// assert!(authz.allowed(Some(&role), "experiments", "get", &[]));
/// assert!(authz.allowed(Some(&role), "experiments", "get", &["expA"]));
/// assert!(!authz.allowed(Some(&role), "experiments", "delete", &[]));
/// assert!(!authz.allowed(None, "experiments", "get", &[]));
/// ```
pub struct PolicyEvaluator<M: Matcher = GlobMatcher> {
    matcher: M,
    cache: DecisionCache,
}

impl PolicyEvaluator {
    /// Create an evaluator around an injected decision cache
    pub fn new(cache: DecisionCache) -> Self {
        Self::with_matcher(GlobMatcher, cache)
    }

    /// Create an evaluator with a default cache (1000 entries)
    pub fn new_default() -> Self {
        Self::new(DecisionCache::new(DEFAULT_CACHE_CAPACITY))
    }
}

impl Default for PolicyEvaluator {
    fn default() -> Self {
        Self::new_default()
    }
}

impl<M: Matcher> PolicyEvaluator<M> {
    /// Create an evaluator with a custom matcher implementation
    pub fn with_matcher(matcher: M, cache: DecisionCache) -> Self {
        PolicyEvaluator { matcher, cache }
    }

    /// Decide whether `verb` on `resource` is permitted for the role
    ///
    /// `names` offers alternative identifiers for the same logical target
    /// (e.g. a bare name and a namespaced name); any single accepted name
    /// grants the query. An empty `names` (after dropping empty entries) is
    /// a bare resource/verb check and never consults name-scopes.
    ///
    /// An absent role denies. Nothing here panics or errors: malformed
    /// patterns and empty pattern lists simply never contribute a grant.
    pub fn allowed(&self, role: Option<&Role>, resource: &str, verb: &str, names: &[&str]) -> bool {
        let Some(role) = role else {
            trace!(resource, verb, "no role, denying");
            return false;
        };

        // drop empty names before keying and matching
        let names: Vec<&str> = names.iter().copied().filter(|n| !n.is_empty()).collect();

        let key = DecisionKey::new(&role.name, resource, verb, &names);
        if let Some(decision) = self.cache.get(&key) {
            trace!(role = %role.name, resource, verb, decision, "decision cache hit");
            return decision;
        }

        let decision = self.evaluate(role, resource, verb, &names);
        self.cache.put(key, decision);
        debug!(role = %role.name, resource, verb, ?names, decision, "policy decision");

        decision
    }

    /// Walk the role's policies; first grant wins
    fn evaluate(&self, role: &Role, resource: &str, verb: &str, names: &[&str]) -> bool {
        for policy in &role.policies {
            if !policy
                .resources
                .iter()
                .any(|r| self.matcher.matches(r, resource))
            {
                continue;
            }

            for v in &policy.verbs {
                if v == "*" || v == verb {
                    if names.is_empty() {
                        return true;
                    }

                    for name in names {
                        if self.resource_name_allowed(policy, name) {
                            return true;
                        }
                    }
                }
            }
        }

        false
    }

    /// Decide whether one policy's name-scope permits a single name
    ///
    /// Patterns are scanned in order. A positive match marks the name
    /// allowed but keeps scanning; a negation match is an absolute veto for
    /// this policy, overriding any earlier positive match.
    fn resource_name_allowed(&self, policy: &Policy, name: &str) -> bool {
        let mut allowed = false;

        for rn in &policy.resource_names {
            let pattern = Self::segment_rewrite(&rn.pattern, name);

            if self.matcher.matches(&pattern, name) {
                if rn.negate {
                    return false;
                }
                allowed = true;
            }
        }

        allowed
    }

    /// Path-segment rewrite heuristic
    ///
    /// An un-namespaced pattern (`"vm1"`) also matches a namespaced name
    /// (`"expA/vm1"`) by implicitly allowing any single prefix segment.
    fn segment_rewrite<'a>(pattern: &'a str, name: &str) -> std::borrow::Cow<'a, str> {
        if name.contains('/') && !pattern.contains('/') {
            std::borrow::Cow::Owned(format!("*/{pattern}"))
        } else {
            std::borrow::Cow::Borrowed(pattern)
        }
    }

    /// Drop every cached decision
    ///
    /// Must be called when a role's policies change under an unchanged role
    /// name; cached entries are keyed by name only.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached decisions
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    fn evaluator() -> PolicyEvaluator {
        PolicyEvaluator::new_default()
    }

    #[test]
    fn test_absent_role_denies() {
        let authz = evaluator();
        assert!(!authz.allowed(None, "experiments", "get", &[]));
        assert!(!authz.allowed(None, "experiments", "get", &["expA"]));
    }

    #[test]
    fn test_empty_role_denies_everything() {
        let authz = evaluator();
        let role = Role::new("Empty");

        assert!(!authz.allowed(Some(&role), "experiments", "get", &[]));
        assert!(!authz.allowed(Some(&role), "vms", "*", &["vm1"]));
    }

    #[test]
    fn test_bare_verb_grant_skips_name_scope() {
        let authz = evaluator();
        let mut role = Role::new("Viewer");
        role.add_policy(&["experiments"], &["*", "*/*"], &["get"]);

        assert!(authz.allowed(Some(&role), "experiments", "get", &[]));
        assert!(authz.allowed(Some(&role), "experiments", "get", &["anyName"]));
        assert!(!authz.allowed(Some(&role), "experiments", "delete", &[]));
    }

    #[test]
    fn test_bare_check_ignores_restrictive_name_scope() {
        // a bare resource/verb query never consults resourceNames, even a
        // fully negated scope
        let authz = evaluator();
        let mut role = Role::new("Viewer");
        role.add_policy(&["experiments"], &["!*"], &["get"]);

        assert!(authz.allowed(Some(&role), "experiments", "get", &[]));
        assert!(!authz.allowed(Some(&role), "experiments", "get", &["exp1"]));
    }

    #[test]
    fn test_empty_name_scope_grants_no_names() {
        let authz = evaluator();
        let mut role = Role::new("Viewer");
        role.add_policy(&["experiments"], &[], &["get"]);

        // empty resourceNames is not the same as "*"
        assert!(authz.allowed(Some(&role), "experiments", "get", &[]));
        assert!(!authz.allowed(Some(&role), "experiments", "get", &["exp1"]));
    }

    #[test]
    fn test_resource_segment_exactness() {
        let authz = evaluator();
        let mut role = Role::new("Starter");
        role.add_policy(&["experiments/start"], &["*", "*/*"], &["update"]);

        assert!(authz.allowed(Some(&role), "experiments/start", "update", &[]));
        assert!(!authz.allowed(Some(&role), "experiments", "update", &[]));
        assert!(!authz.allowed(Some(&role), "experiments/stop", "update", &[]));
    }

    #[test]
    fn test_name_restriction() {
        let authz = evaluator();
        let mut role = Role::new("Deleter");
        role.add_policy(&["experiments"], &["exp1"], &["delete"]);

        assert!(authz.allowed(Some(&role), "experiments", "delete", &["exp1"]));
        assert!(!authz.allowed(Some(&role), "experiments", "delete", &["expB"]));
    }

    #[test]
    fn test_segment_rewrite_for_namespaced_names() {
        let authz = evaluator();
        let mut role = Role::new("VmAdmin");
        role.add_policy(&["vms"], &["*"], &["delete"]);

        assert!(authz.allowed(Some(&role), "vms", "delete", &["vm1"]));
        // "*" has no separator, "expA/vm1" does: rewritten to "*/..."
        assert!(authz.allowed(Some(&role), "vms", "delete", &["expA/vm1"]));
        // but never more than one prefix segment
        assert!(!authz.allowed(Some(&role), "vms", "delete", &["a/b/vm1"]));
    }

    #[test]
    fn test_namespaced_pattern_is_not_rewritten() {
        let authz = evaluator();
        let mut role = Role::new("Scoped");
        role.add_policy(&["vms"], &["expA/*"], &["delete"]);

        assert!(authz.allowed(Some(&role), "vms", "delete", &["expA/vm1"]));
        assert!(!authz.allowed(Some(&role), "vms", "delete", &["expB/vm1"]));
        assert!(!authz.allowed(Some(&role), "vms", "delete", &["vm1"]));
    }

    #[test]
    fn test_negation_vetoes_earlier_grant() {
        let authz = evaluator();
        let mut role = Role::new("Things");
        role.add_policy(&["things"], &["*", "!thing1"], &["*"]);

        assert!(authz.allowed(Some(&role), "things", "delete", &["thing"]));
        assert!(authz.allowed(Some(&role), "things", "delete", &["thing2"]));
        assert!(!authz.allowed(Some(&role), "things", "delete", &["thing1"]));
    }

    #[test]
    fn test_negation_vetoes_later_grant_too() {
        let authz = evaluator();
        let mut role = Role::new("Things");
        role.add_policy(&["things"], &["!thing1", "*"], &["*"]);

        assert!(!authz.allowed(Some(&role), "things", "delete", &["thing1"]));
        assert!(authz.allowed(Some(&role), "things", "delete", &["thing2"]));
    }

    #[test]
    fn test_veto_is_scoped_to_one_policy() {
        // a negation in one policy does not veto a grant from another
        let authz = evaluator();
        let mut role = Role::new("Split");
        role.add_policy(&["things"], &["*", "!thing1"], &["*"]);
        role.add_policy(&["things"], &["thing1"], &["delete"]);

        assert!(authz.allowed(Some(&role), "things", "delete", &["thing1"]));
    }

    #[test]
    fn test_any_offered_name_grants() {
        let authz = evaluator();
        let mut role = Role::new("Deleter");
        role.add_policy(&["experiments"], &["exp1"], &["delete"]);

        assert!(authz.allowed(Some(&role), "experiments", "delete", &["nope", "exp1"]));
        assert!(authz.allowed(Some(&role), "experiments", "delete", &["exp1", "nope"]));
        assert!(!authz.allowed(Some(&role), "experiments", "delete", &["nope", "other"]));
    }

    #[test]
    fn test_empty_names_are_filtered() {
        let authz = evaluator();
        let mut role = Role::new("Deleter");
        role.add_policy(&["experiments"], &["exp1"], &["delete"]);

        assert!(authz.allowed(Some(&role), "experiments", "delete", &["", "exp1"]));
        // all-empty collapses to a bare resource/verb check
        assert!(authz.allowed(Some(&role), "experiments", "delete", &[""]));
    }

    #[test]
    fn test_wildcard_verb() {
        let authz = evaluator();
        let mut role = Role::new("Admin");
        role.add_policy(&["vms"], &["*"], &["*"]);

        for verb in ["get", "update", "delete", "patch"] {
            assert!(authz.allowed(Some(&role), "vms", verb, &["vm1"]));
        }
    }

    #[test]
    fn test_wildcard_resource() {
        let authz = evaluator();
        let mut role = Role::new("Patcher");
        role.add_policy(&["*"], &["vm1"], &["patch"]);

        assert!(authz.allowed(Some(&role), "vms", "patch", &["vm1"]));
        // "*" is a single segment; two-segment resources do not match
        assert!(!authz.allowed(Some(&role), "vms/start", "patch", &["vm1"]));
    }

    #[test]
    fn test_mid_string_wildcard_names() {
        let authz = evaluator();
        let mut role = Role::new("Items");
        role.add_policy(&["items"], &["item*"], &["*"]);

        assert!(authz.allowed(Some(&role), "items", "delete", &["item"]));
        assert!(authz.allowed(Some(&role), "items", "delete", &["item1"]));
        assert!(!authz.allowed(Some(&role), "items", "delete", &["thing"]));
    }

    #[test]
    fn test_malformed_patterns_grant_nothing() {
        let authz = evaluator();
        let mut role = Role::new("Broken");
        role.add_policy(&["vm[0-9"], &["*"], &["get"]);
        role.add_policy(&["vms"], &["vm[0-9"], &["get"]);

        assert!(!authz.allowed(Some(&role), "vm1", "get", &[]));
        assert!(!authz.allowed(Some(&role), "vms", "get", &["vm1"]));
        // the bare check on the second policy still grants
        assert!(authz.allowed(Some(&role), "vms", "get", &[]));
    }

    #[test]
    fn test_decisions_are_cached() {
        let authz = evaluator();
        let mut role = Role::new("Viewer");
        role.add_policy(&["experiments"], &["*"], &["get"]);

        assert_eq!(authz.cache_len(), 0);
        assert!(authz.allowed(Some(&role), "experiments", "get", &[]));
        assert_eq!(authz.cache_len(), 1);

        assert!(authz.allowed(Some(&role), "experiments", "get", &[]));
        assert_eq!(authz.cache_len(), 1);

        assert!(!authz.allowed(Some(&role), "experiments", "delete", &[]));
        assert_eq!(authz.cache_len(), 2);

        authz.clear_cache();
        assert_eq!(authz.cache_len(), 0);
    }

    #[test]
    fn test_absent_role_is_not_cached() {
        let authz = evaluator();
        assert!(!authz.allowed(None, "experiments", "get", &[]));
        assert_eq!(authz.cache_len(), 0);
    }

    #[test]
    fn test_name_reorder_never_changes_decision() {
        let authz = evaluator();
        let mut role = Role::new("Deleter");
        role.add_policy(&["experiments"], &["exp1", "!exp2"], &["delete"]);

        let forward = authz.allowed(Some(&role), "experiments", "delete", &["exp1", "exp2"]);
        let reversed = authz.allowed(Some(&role), "experiments", "delete", &["exp2", "exp1"]);
        assert_eq!(forward, reversed);
        assert!(forward);
    }
}
