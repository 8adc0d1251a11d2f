use crate::requirements::RequirementSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Satisfied,
    Unsatisfied,
    /// Set by callers when resolution failed before comparison. [`reconcile`]
    /// never produces it.
    Indeterminate,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Satisfied => "satisfied",
            Status::Unsatisfied => "unsatisfied",
            Status::Indeterminate => "indeterminate",
        }
    }

    /// Process exit code for a pipeline ending in this status.
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Satisfied => 0,
            Status::Unsatisfied => 1,
            Status::Indeterminate => 2,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReconciliationResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub status: Status,
    pub required: RequirementSet,
    /// Flags deployed to the target environment.
    pub deployed: Vec<String>,
    /// Required but not deployed, in requirement order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl ReconciliationResult {
    /// Result for a check whose deployed state could not be determined.
    pub fn indeterminate(required: RequirementSet) -> Self {
        Self {
            status: Status::Indeterminate,
            required,
            deployed: Vec::new(),
            missing: Vec::new(),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.status == Status::Satisfied
    }
}

/// Compare required flags against the flags deployed to one environment.
///
/// Comparison is exact and case-sensitive.
pub fn reconcile(required: &RequirementSet, deployed: &[String]) -> ReconciliationResult {
    let present: HashSet<&str> = deployed.iter().map(String::as_str).collect();
    let missing: Vec<String> = required
        .iter()
        .filter(|flag| !present.contains(flag))
        .map(str::to_string)
        .collect();

    let status = if missing.is_empty() {
        Status::Satisfied
    } else {
        Status::Unsatisfied
    };

    ReconciliationResult {
        status,
        required: required.clone(),
        deployed: deployed.to_vec(),
        missing,
    }
}
