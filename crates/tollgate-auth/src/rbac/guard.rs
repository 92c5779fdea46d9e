//! Capability guard evaluated before a request reaches the core.

use std::collections::BTreeSet;

use tollgate_core::error::AppError;
use tollgate_entity::Capability;

/// Whether `held` satisfies `required`.
///
/// Access is granted when the two sets intersect. An empty `required` set
/// places no restriction.
pub fn authorize(required: &BTreeSet<Capability>, held: &BTreeSet<Capability>) -> bool {
    required.is_empty() || !required.is_disjoint(held)
}

/// Like [`authorize`], returning `Authorization` on denial.
pub fn require_any(
    required: &BTreeSet<Capability>,
    held: &BTreeSet<Capability>,
) -> Result<(), AppError> {
    if authorize(required, held) {
        return Ok(());
    }
    let names: Vec<&str> = required.iter().map(Capability::as_str).collect();
    Err(AppError::authorization(format!(
        "One of [{}] is required",
        names.join(", ")
    )))
}
