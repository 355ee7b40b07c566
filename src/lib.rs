//! # Rolegate - Role-Based Access Control Decisions
//!
//! `rolegate` resolves `(role, resource, verb, names)` queries to a boolean,
//! mirroring a server-side authorization implementation decision-for-decision
//! so the two sides never disagree about the same operation. Features:
//!
//! - **Segment-aware glob matching**: `*` never crosses a `/` boundary, so
//!   `"experiments/*"` covers exactly one sub-segment
//! - **Name-level negation**: a `!`-prefixed resource-name pattern vetoes an
//!   otherwise-matching grant within its policy
//! - **Path-segment rewrite**: un-namespaced name patterns implicitly match
//!   under any single namespace prefix
//! - **Memoized decisions**: a bounded, thread-safe LRU cache replays
//!   previously computed answers
//!
//! Deny is the default everywhere: absent roles, empty policies, and
//! malformed patterns all resolve to `false`, never to an error.
//!
//! ## Quick Start
//!
//! ```rust
//! use rolegate::{PolicyEvaluator, Role};
//!
//! let role = Role::from_json(r#"{
//!     "name": "Experiment Viewer",
//!     "policies": [
//!         {
//!             "resources": ["experiments", "experiments/*"],
//!             "resourceNames": ["*", "*/*"],
//!             "verbs": ["get", "list"]
//!         }
//!     ]
//! }"#).unwrap();
//!
//! let authz = PolicyEvaluator::new_default();
//!
//! assert!(authz.allowed(Some(&role), "experiments", "get", &["expA"]));
//! assert!(!authz.allowed(Some(&role), "experiments", "delete", &["expA"]));
//! assert!(!authz.allowed(None, "experiments", "get", &[]));
//! ```
//!
//! The evaluator is an optimization/UX layer for callers deciding whether to
//! render a control or permit a route; the server re-checks every privileged
//! request and remains the security boundary.

mod cache;
mod error;
mod evaluator;
mod pattern;
mod role;

pub use cache::DecisionCache;
pub use error::{RbacError, Result};
pub use evaluator::PolicyEvaluator;
pub use pattern::{GlobMatcher, Matcher};
pub use role::{Policy, ResourceName, Role};
