//! Audit trail models.
//!
//! Each stage of the booking pipeline records an [`AuditStep`] describing the
//! rule it ran, what it saw, what it produced, and why.

use serde::{Deserialize, Serialize};

/// A single step in a booking's audit trail.
///
/// # Example
///
/// ```
/// use stay_engine::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "availability_check".to_string(),
///     rule_name: "Availability Check".to_string(),
///     input: serde_json::json!({"range": "[2026-03-10, 2026-03-13)"}),
///     output: serde_json::json!({"available": true}),
///     reasoning: "No conflicting reservation or blocked date".to_string(),
/// };
/// assert_eq!(step.rule_id, "availability_check");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}
