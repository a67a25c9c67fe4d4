//! Version constraint parsing and matching
//!
//! A dependency's `version` field is one expression covering three worlds:
//! semantic version ranges resolved against repository tags, symbolic
//! references (branches or tags by name), and already-concrete revision
//! identifiers. The resolver narrows competing constraints for one import
//! path down to a single revision, so constraints also know how to judge
//! whether a resolution produced elsewhere satisfies them.

use std::fmt;

use semver::{Version, VersionReq};

use crate::error::{Result, VendraError};
use crate::vcs::Resolved;

/// A parsed version constraint from a manifest entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// No constraint given: the repository's default branch head
    Default,
    /// A concrete revision identifier (e.g. a full commit hash)
    Revision(String),
    /// A symbolic reference resolved by the backend (branch or tag name)
    Reference(String),
    /// A semantic version range matched against repository tags
    Range(VersionReq),
}

impl Constraint {
    /// Parse the raw `version` field of a dependency.
    ///
    /// A bare version like `1.2.3` pins exactly that release; range syntax
    /// (`^1.2`, `>=1.0, <2.0`, `1.x`) is passed to [`VersionReq`]; a 40
    /// character hex string is taken as a concrete revision; anything else
    /// is a symbolic reference for the backend to resolve.
    pub fn parse(name: &str, raw: Option<&str>) -> Result<Self> {
        let Some(raw) = raw else {
            return Ok(Constraint::Default);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Constraint::Default);
        }

        if let Ok(version) = Version::parse(strip_v_prefix(raw)) {
            let exact = format!("={version}");
            let req = VersionReq::parse(&exact).map_err(|e| VendraError::ConstraintInvalid {
                name: name.to_string(),
                constraint: raw.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Constraint::Range(req));
        }

        if looks_like_range(raw) {
            let req =
                VersionReq::parse(strip_v_prefix(raw)).map_err(|e| VendraError::ConstraintInvalid {
                    name: name.to_string(),
                    constraint: raw.to_string(),
                    reason: e.to_string(),
                })?;
            return Ok(Constraint::Range(req));
        }

        // Partial versions like "1.2" act as ranges ("^1.2"), not references
        if strip_v_prefix(raw).starts_with(|c: char| c.is_ascii_digit()) {
            if let Ok(req) = VersionReq::parse(strip_v_prefix(raw)) {
                return Ok(Constraint::Range(req));
            }
        }

        if is_full_revision(raw) {
            return Ok(Constraint::Revision(raw.to_string()));
        }

        Ok(Constraint::Reference(raw.to_string()))
    }

    /// Whether a resolution produced for another constraint also satisfies
    /// this one.
    ///
    /// Used during narrowing: when two requirements target the same import
    /// path, the dominant requirement's resolution must still be acceptable
    /// to the other side, otherwise the pair is an irreconcilable conflict.
    pub fn accepts(&self, resolved: &Resolved) -> bool {
        match self {
            Constraint::Default => true,
            Constraint::Revision(rev) => resolved.revision.starts_with(rev.as_str()),
            Constraint::Reference(name) => resolved.reference.as_deref() == Some(name.as_str()),
            Constraint::Range(req) => resolved
                .reference
                .as_deref()
                .and_then(|r| Version::parse(strip_v_prefix(r)).ok())
                .is_some_and(|v| req.matches(&v)),
        }
    }

    /// Whether a tag version satisfies this constraint (ranges only)
    pub fn allows(&self, version: &Version) -> bool {
        match self {
            Constraint::Range(req) => req.matches(version),
            _ => false,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Default => write!(f, "(default branch)"),
            Constraint::Revision(rev) => write!(f, "{rev}"),
            Constraint::Reference(name) => write!(f, "{name}"),
            Constraint::Range(req) => write!(f, "{req}"),
        }
    }
}

/// Strip a leading `v`/`V` so tags like `v1.2.3` parse as versions
pub fn strip_v_prefix(raw: &str) -> &str {
    raw.strip_prefix(['v', 'V']).unwrap_or(raw)
}

/// Parse a tag name as a semantic version, tolerating a `v` prefix
pub fn parse_tag_version(tag: &str) -> Option<Version> {
    Version::parse(strip_v_prefix(tag)).ok()
}

fn looks_like_range(raw: &str) -> bool {
    raw.starts_with(['^', '~', '>', '<', '='])
        || raw == "*"
        || raw.contains(',')
        || raw.contains(".x")
        || raw.contains(".*")
}

fn is_full_revision(raw: &str) -> bool {
    raw.len() == 40 && raw.chars().all(|c| c.is_ascii_hexdigit())
}
