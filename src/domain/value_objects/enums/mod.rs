pub mod operation_kinds;
pub mod plan_change_directions;
