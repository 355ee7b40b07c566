//! Glob matching for resource and resource-name patterns
//!
//! Supports the shell-style syntax used by the server-side enforcement point:
//! - `*` - Matches any run of characters within a single `/` segment
//! - `?` - Matches exactly one non-separator character
//! - `[...]` - Character class, with ranges and `^`/`!` negation
//!
//! Matching is case-sensitive and anchored at both ends: a lone `*` matches
//! `"vms"` but never `"vms/start"`.

use crate::error::{RbacError, Result};

/// Segment-aware glob matcher for policy patterns
///
/// Pure and stateless; safe to call from any number of threads.
pub struct GlobMatcher;

impl GlobMatcher {
    /// Check if a candidate string matches a glob pattern
    ///
    /// A malformed pattern (unterminated character class) matches nothing.
    ///
    /// # Examples
    /// ```
    /// use rolegate::GlobMatcher;
    ///
    /// assert!(GlobMatcher::matches("experiments/*", "experiments/start"));
    /// assert!(GlobMatcher::matches("item*", "item1"));
    /// assert!(!GlobMatcher::matches("*", "vms/start"));
    /// ```
    pub fn matches(pattern: &str, candidate: &str) -> bool {
        let pat: Vec<char> = pattern.chars().collect();
        let text: Vec<char> = candidate.chars().collect();

        Self::match_chars(&pat, &text).unwrap_or(false)
    }

    /// Check that a pattern is well formed
    ///
    /// The only malformed shape the syntax admits is an unterminated or empty
    /// `[...]` class. Policy loaders call this so bad patterns are reported
    /// once up front instead of silently matching nothing at decision time.
    pub fn validate(pattern: &str) -> Result<()> {
        let pat: Vec<char> = pattern.chars().collect();
        let mut rest: &[char] = &pat;

        while let Some((&c, tail)) = rest.split_first() {
            if c == '[' {
                match Self::parse_class(tail) {
                    Some((_, _, after)) => rest = after,
                    None => return Err(RbacError::InvalidPattern(pattern.to_string())),
                }
            } else {
                rest = tail;
            }
        }

        Ok(())
    }

    /// Recursively match pattern characters against candidate characters
    ///
    /// Returns `None` when the pattern is malformed so the caller can decide
    /// how to surface it; plain matching folds that into `false`.
    fn match_chars(pat: &[char], text: &[char]) -> Option<bool> {
        let Some((&p, pat_rest)) = pat.split_first() else {
            return Some(text.is_empty());
        };

        match p {
            // * matches zero or more characters, never crossing a separator
            '*' => {
                let mut rest = pat_rest;
                while rest.first() == Some(&'*') {
                    rest = &rest[1..];
                }

                for take in 0..=text.len() {
                    if take > 0 && text[take - 1] == '/' {
                        break;
                    }
                    if Self::match_chars(rest, &text[take..])? {
                        return Some(true);
                    }
                }
                Some(false)
            }
            // ? matches exactly one non-separator character
            '?' => match text.split_first() {
                Some((&c, text_rest)) if c != '/' => Self::match_chars(pat_rest, text_rest),
                _ => Some(false),
            },
            '[' => {
                let (negated, ranges, after) = Self::parse_class(pat_rest)?;
                match text.split_first() {
                    Some((&c, text_rest)) if c != '/' => {
                        let hit = ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
                        if hit != negated {
                            Self::match_chars(after, text_rest)
                        } else {
                            Some(false)
                        }
                    }
                    _ => Some(false),
                }
            }
            // Literal match
            _ => match text.split_first() {
                Some((&c, text_rest)) if c == p => Self::match_chars(pat_rest, text_rest),
                _ => Some(false),
            },
        }
    }

    /// Parse a character class body (the part after `[`)
    ///
    /// Returns `(negated, ranges, rest-of-pattern)`, or `None` when the class
    /// is unterminated, empty, or contains an inverted range.
    fn parse_class(pat: &[char]) -> Option<(bool, Vec<(char, char)>, &[char])> {
        let mut i = 0;

        let negated = matches!(pat.first(), Some('^' | '!'));
        if negated {
            i += 1;
        }

        let mut ranges = Vec::new();
        let mut first = true;

        loop {
            let &c = pat.get(i)?;
            if c == ']' && !first {
                i += 1;
                break;
            }
            first = false;

            let lo = c;
            i += 1;

            // `a-z` range; a trailing `-` before `]` is a literal dash
            let hi = if pat.get(i) == Some(&'-') && pat.get(i + 1).is_some_and(|&c| c != ']') {
                let hi = pat[i + 1];
                i += 2;
                hi
            } else {
                lo
            };

            if hi < lo {
                return None;
            }
            ranges.push((lo, hi));
        }

        Some((negated, ranges, &pat[i..]))
    }
}

/// Seam between the evaluator and the glob matcher
///
/// The evaluator only needs [`matches`](Matcher::matches); tests inject a
/// counting implementation to observe how often policies are walked.
pub trait Matcher {
    /// Match a candidate string against a glob pattern
    fn matches(&self, pattern: &str, candidate: &str) -> bool;
}

impl Matcher for GlobMatcher {
    fn matches(&self, pattern: &str, candidate: &str) -> bool {
        GlobMatcher::matches(pattern, candidate)
    }
}
