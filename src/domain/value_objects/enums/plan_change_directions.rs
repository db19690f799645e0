use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Direction of a plan transition, derived from quota rank
/// (`max_operations`), never from plan ids. Informational only:
/// any direction is permitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanChangeDirection {
    Initial,
    Upgrade,
    Downgrade,
    Lateral,
}

impl Display for PlanChangeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let direction = match self {
            PlanChangeDirection::Initial => "initial",
            PlanChangeDirection::Upgrade => "upgrade",
            PlanChangeDirection::Downgrade => "downgrade",
            PlanChangeDirection::Lateral => "lateral",
        };
        write!(f, "{}", direction)
    }
}

impl PlanChangeDirection {
    /// Ranks the target plan against the current one by operation quota.
    pub fn from_quotas(current_max_operations: Option<i32>, target_max_operations: i32) -> Self {
        match current_max_operations {
            None => PlanChangeDirection::Initial,
            Some(current) if target_max_operations > current => PlanChangeDirection::Upgrade,
            Some(current) if target_max_operations < current => PlanChangeDirection::Downgrade,
            Some(_) => PlanChangeDirection::Lateral,
        }
    }
}
