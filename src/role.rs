//! Role and policy data model
//!
//! A role is a named bundle of policies handed over by the identity layer at
//! login and treated as an immutable snapshot for the session. Policies grant
//! verbs on resource-kind patterns, optionally scoped to resource-name
//! patterns. The JSON shape matches the server-side enforcement point, so
//! role documents deserialize unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RbacError, Result};
use crate::pattern::GlobMatcher;

/// One resource-name pattern, with negation split out of the string encoding
///
/// The wire form prefixes negation patterns with `!` (e.g. `"!thing1"`); it
/// is parsed once at load rather than re-parsed on every match. A negation
/// match vetoes the whole name-scope of its policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ResourceName {
    /// True when a match vetoes instead of grants
    pub negate: bool,
    /// Glob pattern for the instance name
    pub pattern: String,
}

impl ResourceName {
    /// Parse the wire encoding, stripping at most one leading `!`
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('!') {
            Some(rest) => ResourceName {
                negate: true,
                pattern: rest.to_string(),
            },
            None => ResourceName {
                negate: false,
                pattern: raw.to_string(),
            },
        }
    }
}

impl From<String> for ResourceName {
    fn from(raw: String) -> Self {
        ResourceName::parse(&raw)
    }
}

impl From<&str> for ResourceName {
    fn from(raw: &str) -> Self {
        ResourceName::parse(raw)
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> String {
        name.to_string()
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            write!(f, "!{}", self.pattern)
        } else {
            f.write_str(&self.pattern)
        }
    }
}

/// A single grant rule within a role
///
/// All fields default to empty, and empty means "grants nothing" - an empty
/// `resource_names` list is not the same as `["*"]`; whether it is consulted
/// at all depends on the query (see the evaluator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Glob patterns for the resource kinds this policy covers
    #[serde(default)]
    pub resources: Vec<String>,

    /// Glob patterns for the named instances this policy covers
    #[serde(default)]
    pub resource_names: Vec<ResourceName>,

    /// Verbs this policy allows; `"*"` allows any verb
    #[serde(default)]
    pub verbs: Vec<String>,
}

impl Policy {
    /// Create a policy from pattern and verb lists
    pub fn new(resources: &[&str], resource_names: &[&str], verbs: &[&str]) -> Self {
        Policy {
            resources: resources.iter().map(|r| r.to_string()).collect(),
            resource_names: resource_names.iter().map(|n| ResourceName::parse(n)).collect(),
            verbs: verbs.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// A named bundle of policies assigned to an actor
///
/// Policies are evaluated as a logical OR, so their order never changes a
/// decision; it is kept stable for deterministic iteration in tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Display name; also part of the decision-cache key
    pub name: String,

    /// Grant rules, evaluated in order
    #[serde(default)]
    pub policies: Vec<Policy>,
}

impl Role {
    /// Create an empty role with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Role {
            name: name.into(),
            policies: Vec::new(),
        }
    }

    /// Parse a role from its JSON document
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize the role to a JSON document
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Append a grant rule
    pub fn add_policy(&mut self, resources: &[&str], resource_names: &[&str], verbs: &[&str]) {
        self.policies.push(Policy::new(resources, resource_names, verbs));
    }

    /// Check every pattern in the role for well-formedness
    ///
    /// Malformed patterns never fail a decision - they just match nothing -
    /// but loaders call this so typos are reported once up front.
    pub fn validate(&self) -> Result<()> {
        let mut invalid = Vec::new();

        for policy in &self.policies {
            for resource in &policy.resources {
                if GlobMatcher::validate(resource).is_err() {
                    invalid.push(resource.clone());
                }
            }
        }

        if !invalid.is_empty() {
            return Err(RbacError::InvalidResources(invalid.join(", ")));
        }

        for policy in &self.policies {
            for name in &policy.resource_names {
                GlobMatcher::validate(&name.pattern)
                    .map_err(|_| RbacError::InvalidPattern(name.to_string()))?;
            }
        }

        Ok(())
    }

    /// Scope every policy in the role to the given resource names
    ///
    /// No names, or a single empty name, defaults to `"*"` (allow all).
    /// Fails if any policy already carries resource names.
    pub fn set_resource_names(&mut self, names: &[&str]) -> Result<()> {
        let names: Vec<&str> = match names {
            [] | [""] => vec!["*"],
            _ => names.to_vec(),
        };

        for policy in &self.policies {
            if !policy.resource_names.is_empty() {
                return Err(RbacError::ResourceNamesExist);
            }
        }

        for name in &names {
            let parsed = ResourceName::parse(name);
            GlobMatcher::validate(&parsed.pattern)
                .map_err(|_| RbacError::InvalidPattern(name.to_string()))?;
        }

        for policy in &mut self.policies {
            policy
                .resource_names
                .extend(names.iter().map(|n| ResourceName::parse(n)));
        }

        Ok(())
    }

    /// Add one resource name to every policy in the role
    ///
    /// Fails if any policy already lists the name, or the pattern is bad.
    pub fn add_resource_name(&mut self, name: &str) -> Result<()> {
        let parsed = ResourceName::parse(name);

        for policy in &self.policies {
            if policy.resource_names.iter().any(|existing| existing == &parsed) {
                return Err(RbacError::ResourceNameExists(name.to_string()));
            }
        }

        GlobMatcher::validate(&parsed.pattern)
            .map_err(|_| RbacError::InvalidPattern(name.to_string()))?;

        for policy in &mut self.policies {
            policy.resource_names.push(parsed.clone());
        }

        Ok(())
    }
}
