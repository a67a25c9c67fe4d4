//! Error types and handling for Vendra
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! The split between fatal errors and warnings matters here: resolution and
//! lock loading failures abort a run before any disk mutation, while
//! reference-setting, cleanup and normalization failures are collected as
//! warnings and reported at the end of the run.

use miette::Diagnostic;
use thiserror::Error;

use crate::vcs::VcsKind;

/// Main error type for Vendra operations
#[derive(Error, Diagnostic, Debug)]
pub enum VendraError {
    // Configuration errors
    #[error("No vendra.yaml found in {path} or any parent directory")]
    #[diagnostic(
        code(vendra::config::missing),
        help("Run 'vendra' from a project containing a vendra.yaml manifest")
    )]
    ConfigMissing { path: String },

    #[error("Invalid manifest: {message}")]
    #[diagnostic(code(vendra::config::invalid))]
    ManifestInvalid { message: String },

    #[error("Duplicate import path '{name}' in manifest")]
    #[diagnostic(
        code(vendra::config::duplicate_import),
        help("Each import path may be declared only once per manifest")
    )]
    DuplicateImport { name: String },

    #[error("Invalid version constraint '{constraint}' for '{name}': {reason}")]
    #[diagnostic(code(vendra::config::constraint_invalid))]
    ConstraintInvalid {
        name: String,
        constraint: String,
        reason: String,
    },

    // Lockfile errors
    #[error("Failed to read lock file: {path}: {reason}")]
    #[diagnostic(
        code(vendra::lockfile::unreadable),
        help("Delete the lock file and run 'vendra update' to regenerate it")
    )]
    LockUnreadable { path: String, reason: String },

    #[error("Failed to write lock file: {path}: {reason}")]
    #[diagnostic(code(vendra::lockfile::write_failed))]
    LockWriteFailed { path: String, reason: String },

    // Resolution errors
    #[error(
        "Conflicting constraints for '{name}': {first_requirer} requires {first_constraint}, \
         {second_requirer} requires {second_constraint}"
    )]
    #[diagnostic(
        code(vendra::resolve::conflict),
        help("Align the competing constraints so a single revision satisfies both")
    )]
    ResolutionConflict {
        name: String,
        first_constraint: String,
        first_requirer: String,
        second_constraint: String,
        second_requirer: String,
    },

    #[error("Failed to resolve reference '{reference}' for '{name}': {reason}")]
    #[diagnostic(code(vendra::vcs::ref_resolve_failed))]
    ReferenceResolveFailed {
        name: String,
        reference: String,
        reason: String,
    },

    // VCS errors
    #[error("Failed to clone repository: {url}: {reason}")]
    #[diagnostic(
        code(vendra::vcs::clone_failed),
        help("Check that the URL is correct and you have access to the repository")
    )]
    CloneFailed { url: String, reason: String },

    #[error("Failed to fetch from {url}: {reason}")]
    #[diagnostic(code(vendra::vcs::fetch_failed))]
    FetchFailed { url: String, reason: String },

    #[error("Failed to check out '{name}' at {revision}: {reason}")]
    #[diagnostic(code(vendra::vcs::checkout_failed))]
    CheckoutFailed {
        name: String,
        revision: String,
        reason: String,
    },

    #[error("Failed to read revision of checkout at '{path}': {reason}")]
    #[diagnostic(code(vendra::vcs::revision_lookup_failed))]
    RevisionLookupFailed { path: String, reason: String },

    #[error("The {kind} backend is not available: {reason}")]
    #[diagnostic(
        code(vendra::vcs::backend_unavailable),
        help("Install the version control tool for this backend and retry")
    )]
    BackendUnavailable { kind: VcsKind, reason: String },

    #[error("Git operation failed: {message}")]
    #[diagnostic(code(vendra::vcs::git_failed))]
    GitOperationFailed { message: String },

    // Cache errors
    #[error("Download cache is locked by another vendra process: {path}")]
    #[diagnostic(
        code(vendra::cache::locked),
        help("Wait for the other run to finish, or remove a stale lock file")
    )]
    CacheLocked { path: String },

    #[error("Cache operation failed: {message}")]
    #[diagnostic(code(vendra::cache::operation_failed))]
    CacheOperationFailed { message: String },

    // Installer warnings, carried in the run report
    #[error("Failed to set reference for '{name}' to {revision}: {reason}")]
    #[diagnostic(code(vendra::install::reference_set_failed))]
    ReferenceSetFailed {
        name: String,
        revision: String,
        reason: String,
    },

    #[error("Vendor tree normalization failed: {message}")]
    #[diagnostic(code(vendra::install::normalization_failed))]
    NormalizationFailed { message: String },

    #[error("Install completed with {count} warning(s)")]
    #[diagnostic(
        code(vendra::install::completed_with_warnings),
        help("The vendor tree is usable; review the warnings above")
    )]
    CompletedWithWarnings { count: usize },

    // File system errors
    #[error("IO error: {message}")]
    #[diagnostic(code(vendra::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for VendraError {
    fn from(err: std::io::Error) -> Self {
        VendraError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<git2::Error> for VendraError {
    fn from(err: git2::Error) -> Self {
        VendraError::GitOperationFailed {
            message: err.message().to_string(),
        }
    }
}

impl VendraError {
    /// Whether this error is a warning-level failure that does not abort a run
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            VendraError::ReferenceSetFailed { .. } | VendraError::NormalizationFailed { .. }
        )
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, VendraError>;
