//! Tree Configuration
//!
//! A serializable description of how a tree should be grown and pruned,
//! and the ready-made strategies it maps onto.
use crate::cost::CostMatrix;
use crate::data::Dataset;
use crate::errors::WattleError;
use crate::strategies::{CostReductionSplit, ErrorReductionPrune, InformationGainSplit, MaxDepth};
use crate::strategy::SplitStrategy;
use crate::tree::{Tree, ROOT};
use log::{info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// How candidate splits are scored.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub enum Criterion {
    /// Expected misclassification cost under a cost matrix.
    #[default]
    Cost,
    /// Entropy reduction of the class distribution.
    Entropy,
}

impl FromStr for Criterion {
    type Err = WattleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cost" => Ok(Criterion::Cost),
            "entropy" | "information_gain" => Ok(Criterion::Entropy),
            _ => Err(WattleError::ParseString(
                s.to_string(),
                "Criterion".to_string(),
                "cost, entropy".to_string(),
            )),
        }
    }
}

fn default_recursive() -> bool {
    true
}
fn default_build() -> bool {
    true
}
fn default_min_records() -> usize {
    1
}
fn default_leaf_penalty() -> f64 {
    0.5
}

/// Settings for growing and pruning a single tree.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct TreeConfig {
    pub class_attribute: String,
    /// Required by the cost criterion.
    #[serde(default)]
    pub positive_class: Option<String>,
    /// Required by the cost criterion.
    #[serde(default)]
    pub cost_matrix: Option<CostMatrix>,
    #[serde(default)]
    pub criterion: Criterion,
    #[serde(default = "default_recursive")]
    pub recursive: bool,
    /// Split the root when the tree is created.
    #[serde(default = "default_build")]
    pub build: bool,
    /// Prune once after building.
    #[serde(default)]
    pub prune: bool,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_records")]
    pub min_records: usize,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default = "default_leaf_penalty")]
    pub leaf_penalty: f64,
    #[serde(default)]
    pub min_gain: f64,
}

impl TreeConfig {
    pub fn new(class_attribute: impl Into<String>) -> Self {
        TreeConfig {
            class_attribute: class_attribute.into(),
            positive_class: None,
            cost_matrix: None,
            criterion: Criterion::default(),
            recursive: default_recursive(),
            build: default_build(),
            prune: false,
            max_depth: None,
            min_records: default_min_records(),
            parallel: false,
            leaf_penalty: default_leaf_penalty(),
            min_gain: 0.0,
        }
    }

    /// Cost-criterion settings.
    pub fn cost_sensitive(
        class_attribute: impl Into<String>,
        positive_class: impl Into<String>,
        cost_matrix: CostMatrix,
    ) -> Self {
        TreeConfig {
            positive_class: Some(positive_class.into()),
            cost_matrix: Some(cost_matrix),
            ..TreeConfig::new(class_attribute)
        }
    }

    fn cost_settings(&self) -> Result<(&str, &CostMatrix), WattleError> {
        match (&self.positive_class, &self.cost_matrix) {
            (Some(pc), Some(cm)) => Ok((pc.as_str(), cm)),
            _ => Err(WattleError::InvalidArgument(
                "the cost criterion needs both a positive class and a cost matrix".to_string(),
            )),
        }
    }

    /// The prune strategy these settings describe.
    pub fn prune_strategy(&self) -> Result<ErrorReductionPrune, WattleError> {
        Ok(match self.criterion {
            Criterion::Cost => {
                let (pc, cm) = self.cost_settings()?;
                ErrorReductionPrune {
                    leaf_penalty: self.leaf_penalty,
                    ..ErrorReductionPrune::cost_sensitive(pc, cm.clone())
                }
            }
            Criterion::Entropy => ErrorReductionPrune::new(self.leaf_penalty),
        })
    }

    /// Create a tree over `data`, then split and prune it as configured.
    pub fn build_tree<'a, D: Dataset + Sync>(&self, data: &'a D) -> Result<Tree<'a, D>, WattleError> {
        if self.prune && !self.build {
            warn!("prune requested without build, the tree will only hold its root");
        }
        let mut tree = Tree::new(data, &self.class_attribute)?;
        if !self.build {
            return Ok(tree);
        }

        match self.criterion {
            Criterion::Cost => {
                let (pc, cm) = self.cost_settings()?;
                let split = CostReductionSplit::new(pc, cm.clone()).with_parallel(self.parallel);
                self.grow(&mut tree, split)?;
            }
            Criterion::Entropy => {
                let split = InformationGainSplit {
                    min_gain: self.min_gain,
                    parallel: self.parallel,
                };
                self.grow(&mut tree, split)?;
            }
        }

        if self.prune {
            tree.prune(&self.prune_strategy()?)?;
        }
        info!(
            "tree on '{}' ready: {} nodes, {} leaves, depth {}",
            self.class_attribute,
            tree.num_nodes(),
            tree.num_leaves(),
            tree.depth()
        );
        Ok(tree)
    }

    fn grow<D: Dataset, S: SplitStrategy<D>>(&self, tree: &mut Tree<'_, D>, split: S) -> Result<bool, WattleError> {
        let bounded = MaxDepth::new(split, self.max_depth, self.min_records);
        tree.split(ROOT, &bounded, self.recursive)
    }
}

/// JSON persistence for tree settings, so a tuned configuration can be kept
/// next to the data it was tuned on and rebuilt later.
pub trait ConfigIO: Serialize + DeserializeOwned + Sized {
    /// Write the settings to `path` as indented JSON.
    fn save_config<P: AsRef<Path>>(&self, path: P) -> Result<(), WattleError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| WattleError::UnableToWrite(e.to_string()))?;
        fs::write(path.as_ref(), json)
            .map_err(|e| WattleError::UnableToWrite(format!("{}: {}", path.as_ref().display(), e)))
    }

    /// The settings as a single-line JSON object.
    fn json_dump(&self) -> Result<String, WattleError> {
        serde_json::to_string(self).map_err(|e| WattleError::UnableToWrite(e.to_string()))
    }

    /// Parse settings from JSON. Omitted fields take their defaults, so
    /// `{"class_attribute": "Defective"}` is a complete configuration.
    fn from_json(json_str: &str) -> Result<Self, WattleError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| WattleError::UnableToRead(e.to_string()))
    }

    /// Read settings written by `save_config`, or any JSON `from_json` accepts.
    fn load_config<P: AsRef<Path>>(path: P) -> Result<Self, WattleError> {
        let json_str = fs::read_to_string(path.as_ref())
            .map_err(|e| WattleError::UnableToRead(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&json_str)
    }
}

impl ConfigIO for TreeConfig {}
