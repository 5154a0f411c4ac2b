mod constants;

// Modules
pub mod branch;
pub mod config;
pub mod cost;
pub mod data;
pub mod errors;
pub mod node;
pub mod strategies;
pub mod strategy;
pub mod tree;

// Individual classes, and functions
pub use branch::Branch;
pub use config::{ConfigIO, Criterion, TreeConfig};
pub use cost::{cost_matrix, CostMatrix, CostModel, StandardCostModel};
pub use data::{AttributeType, ClassSupports, Column, Dataset, Frame, Value};
pub use errors::WattleError;
pub use node::{Node, Schema};
pub use split_test::{Operator, SplitTest};
pub use strategies::{CostReductionSplit, ErrorReductionPrune, InformationGainSplit, MaxDepth};
pub use strategy::{PruneStrategy, SplitStrategy};
pub use tree::{Rule, Tree, ROOT};
