//! Work-package reference extraction.
//!
//! Branch names, pull-request titles and issue titles may carry a
//! work-package reference in one of two syntaxes: `[op-<digits>]` or
//! `op/<digits>`, matched case-insensitively.

use std::sync::LazyLock;

use regex::Regex;

static REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[op-(\d+)\]|op/(\d+)").unwrap());

/// Extract the first work-package reference from `text`.
///
/// `None` means the text carries no reference; callers skip the dependent
/// update silently in that case.
pub fn extract_ref(text: &str) -> Option<u64> {
    let captures = REF_PATTERN.captures(text)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .and_then(|group| group.as_str().parse().ok())
}

/// Extract a reference from a push ref like `refs/heads/op/42-fix`.
pub fn extract_ref_from_push_ref(git_ref: &str) -> Option<u64> {
    let branch = git_ref.strip_prefix("refs/heads/").unwrap_or(git_ref);
    extract_ref(branch)
}
