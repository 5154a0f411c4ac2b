/// Keys every cost matrix has to provide.
pub const COST_MATRIX_KEYS: [&str; 4] = ["TP", "TN", "FP", "FN"];
/// Rendering of the empty conjunction, the rule of a root-only tree.
pub const EMPTY_CONDITION: &str = "TRUE";
/// Separator between the conditions of one rule.
pub const CONDITION_SEPARATOR: &str = " AND ";
