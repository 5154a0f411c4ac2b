//! Strategies
//!
//! Ready-made split and prune strategies. None of them is special to the
//! tree, they only use the public node queries, and callers are free to
//! write their own.
use crate::cost::{CostMatrix, CostModel, StandardCostModel};
use crate::data::{ClassSupports, Dataset};
use crate::errors::WattleError;
use crate::node::Node;
use crate::split_test::SplitTest;
use crate::strategy::{PruneStrategy, SplitStrategy};
use rayon::prelude::*;

/// Entropy of a class distribution, in bits.
pub fn entropy(supports: &ClassSupports) -> f64 {
    let n_samples = supports.total() as f64;
    if n_samples == 0.0 {
        return 0.0;
    }
    supports
        .iter()
        .map(|(_, c)| c as f64 / n_samples)
        .map(|x| if x > 0.0 { -x * x.log2() } else { 0.0 })
        .sum()
}

/// Score every candidate of `node` and return the lowest scoring one.
/// Candidates scoring `None` are skipped, ties go to the earlier candidate.
fn best_candidate<D, F>(node: &Node<'_, D>, parallel: bool, score: F) -> Result<Option<(SplitTest, f64)>, WattleError>
where
    D: Dataset + Sync,
    F: Fn(&SplitTest) -> Result<Option<f64>, WattleError> + Sync,
{
    let candidates = node.possible_splits();
    let scores: Vec<Option<f64>> = if parallel {
        candidates.par_iter().map(&score).collect::<Result<_, _>>()?
    } else {
        candidates.iter().map(&score).collect::<Result<_, _>>()?
    };

    let mut best: Option<(usize, f64)> = None;
    for (i, s) in scores.iter().enumerate() {
        if let Some(s) = s {
            match best {
                Some((_, b)) if b <= *s => {}
                _ => best = Some((i, *s)),
            }
        }
    }
    Ok(best.map(|(i, s)| (candidates[i].clone(), s)))
}

/// Split on the candidate with the lowest expected cost after the split,
/// provided it is strictly cheaper than leaving the node as it is.
pub struct CostReductionSplit<M = StandardCostModel> {
    pub positive_class: String,
    pub cost_matrix: CostMatrix,
    pub cost_model: M,
    /// Evaluate candidates on the rayon thread pool.
    pub parallel: bool,
}

impl CostReductionSplit<StandardCostModel> {
    pub fn new(positive_class: impl Into<String>, cost_matrix: CostMatrix) -> Self {
        CostReductionSplit {
            positive_class: positive_class.into(),
            cost_matrix,
            cost_model: StandardCostModel,
            parallel: false,
        }
    }
}

impl<M> CostReductionSplit<M> {
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

impl<D, M> SplitStrategy<D> for CostReductionSplit<M>
where
    D: Dataset + Sync,
    M: CostModel + Sync,
{
    fn find_split(&self, node: &Node<'_, D>) -> Result<Option<SplitTest>, WattleError> {
        let pc = self.positive_class.as_str();
        let parent_cost =
            self.cost_model
                .expected_cost(node.num_positive(pc), node.num_negative(pc), &self.cost_matrix)?;

        let best = best_candidate(node, self.parallel, |test| {
            let child_supports = node.split_supports_posneg(test, pc)?;
            if child_supports.len() < 2 {
                return Ok(None);
            }
            self.cost_model
                .expected_cost_after_split(&child_supports, &self.cost_matrix)
                .map(Some)
        })?;

        Ok(best.filter(|(_, cost)| *cost < parent_cost).map(|(test, _)| test))
    }
}

/// Split on the candidate with the largest entropy reduction, provided the
/// reduction exceeds `min_gain`.
pub struct InformationGainSplit {
    pub min_gain: f64,
    pub parallel: bool,
}

impl Default for InformationGainSplit {
    fn default() -> Self {
        InformationGainSplit {
            min_gain: 0.0,
            parallel: false,
        }
    }
}

impl<D: Dataset + Sync> SplitStrategy<D> for InformationGainSplit {
    fn find_split(&self, node: &Node<'_, D>) -> Result<Option<SplitTest>, WattleError> {
        let n = node.num_records() as f64;
        let parent_entropy = entropy(&node.class_supports);
        if n == 0.0 || parent_entropy == 0.0 {
            return Ok(None);
        }

        // Lowest weighted child entropy is the largest gain.
        let best = best_candidate(node, self.parallel, |test| {
            let children = node.split_supports(test)?;
            if children.len() < 2 {
                return Ok(None);
            }
            Ok(Some(
                children.iter().map(|s| s.total() as f64 / n * entropy(s)).sum::<f64>(),
            ))
        })?;

        Ok(best
            .filter(|(_, child_entropy)| parent_entropy - child_entropy > self.min_gain)
            .map(|(test, _)| test))
    }
}

/// Stops `inner` from splitting nodes at `max_depth` or holding fewer than
/// `min_records` records.
pub struct MaxDepth<S> {
    pub inner: S,
    pub max_depth: Option<usize>,
    pub min_records: usize,
}

impl<S> MaxDepth<S> {
    pub fn new(inner: S, max_depth: Option<usize>, min_records: usize) -> Self {
        MaxDepth {
            inner,
            max_depth,
            min_records,
        }
    }
}

impl<D: Dataset, S: SplitStrategy<D>> SplitStrategy<D> for MaxDepth<S> {
    fn find_split(&self, node: &Node<'_, D>) -> Result<Option<SplitTest>, WattleError> {
        if self.max_depth.map_or(false, |d| node.depth >= d) || node.num_records() < self.min_records {
            return Ok(None);
        }
        self.inner.find_split(node)
    }
}

/// Collapse a node when its own resubstitution errors, plus `leaf_penalty`,
/// are no worse than the summed errors of its children, each child also
/// charged `leaf_penalty`.
pub struct ErrorReductionPrune {
    pub cost_sensitive: bool,
    pub cost_matrix: Option<CostMatrix>,
    pub positive_class: Option<String>,
    pub leaf_penalty: f64,
}

impl ErrorReductionPrune {
    /// Majority-label errors.
    pub fn new(leaf_penalty: f64) -> Self {
        ErrorReductionPrune {
            cost_sensitive: false,
            cost_matrix: None,
            positive_class: None,
            leaf_penalty,
        }
    }

    /// Cost-sensitive errors with the usual half-record leaf penalty.
    pub fn cost_sensitive(positive_class: impl Into<String>, cost_matrix: CostMatrix) -> Self {
        ErrorReductionPrune {
            cost_sensitive: true,
            cost_matrix: Some(cost_matrix),
            positive_class: Some(positive_class.into()),
            leaf_penalty: 0.5,
        }
    }

    fn errors<D: Dataset>(&self, node: &Node<'_, D>) -> Result<f64, WattleError> {
        let errors = node.num_errors(
            self.cost_sensitive,
            self.cost_matrix.as_ref(),
            self.positive_class.as_deref(),
        )?;
        Ok(errors as f64 + self.leaf_penalty)
    }
}

impl<D: Dataset> PruneStrategy<D> for ErrorReductionPrune {
    fn should_prune(&self, node: &Node<'_, D>, children: &[&Node<'_, D>]) -> Result<bool, WattleError> {
        let as_leaf = self.errors(node)?;
        let mut as_subtree = 0.0;
        for child in children {
            as_subtree += self.errors(child)?;
        }
        Ok(as_leaf <= as_subtree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::cost_matrix;
    use crate::data::{Column, Frame};
    use crate::tree::{Tree, ROOT};

    fn loc_frame() -> Frame {
        Frame::from_csv_path("resources/LOC_SDP.csv").unwrap()
    }

    fn noisy_frame() -> Frame {
        // One mislabelled record on each side of LOC = 45.
        Frame::new(vec![
            ("LOC", Column::Numerical(vec![10., 20., 30., 40., 50., 60., 70., 80.])),
            (
                "Colour",
                Column::Categorical(
                    ["red", "red", "blue", "red", "blue", "blue", "red", "blue"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                ),
            ),
            ("Defective", Column::Numerical(vec![0., 0., 1., 0., 1., 0., 1., 1.])),
        ])
        .unwrap()
    }

    #[test]
    fn test_entropy() {
        let s: ClassSupports = vec![("0".to_string(), 6), ("1".to_string(), 2)].into_iter().collect();
        assert!((entropy(&s) - 0.811278).abs() < 1e-5);
        let pure: ClassSupports = vec![("0".to_string(), 8)].into_iter().collect();
        assert_eq!(entropy(&pure), 0.0);
        assert_eq!(entropy(&ClassSupports::new()), 0.0);
    }

    #[test]
    fn test_cost_reduction_split() {
        let f = loc_frame();
        let tree = Tree::new(&f, "Defective").unwrap();
        let split = CostReductionSplit::new("1", cost_matrix(1., 0., 1., 5.));
        let test = split.find_split(tree.root()).unwrap().unwrap();
        assert_eq!(test, SplitTest::numerical("LOC", 73.5));
    }

    #[test]
    fn test_cost_reduction_split_parallel_agrees() {
        let f = loc_frame();
        let tree = Tree::new(&f, "Defective").unwrap();
        let cm = cost_matrix(1., 0., 1., 5.);
        let serial = CostReductionSplit::new("1", cm.clone());
        let parallel = CostReductionSplit::new("1", cm).with_parallel(true);
        assert_eq!(
            serial.find_split(tree.root()).unwrap(),
            parallel.find_split(tree.root()).unwrap()
        );
    }

    #[test]
    fn test_cost_reduction_split_pure_node() {
        let f = Frame::new(vec![
            ("LOC", Column::Numerical(vec![1., 2., 3.])),
            ("Defective", Column::Numerical(vec![1., 1., 1.])),
        ])
        .unwrap();
        let tree = Tree::new(&f, "Defective").unwrap();
        let split = CostReductionSplit::new("1", cost_matrix(1., 0., 1., 5.));
        assert_eq!(split.find_split(tree.root()).unwrap(), None);
    }

    #[test]
    fn test_cost_reduction_split_incomplete_matrix() {
        let f = loc_frame();
        let tree = Tree::new(&f, "Defective").unwrap();
        let mut cm = cost_matrix(1., 0., 1., 5.);
        cm.remove("TP");
        let split = CostReductionSplit::new("1", cm);
        assert!(matches!(
            split.find_split(tree.root()),
            Err(WattleError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_information_gain_split() {
        let f = loc_frame();
        let tree = Tree::new(&f, "Defective").unwrap();
        let test = InformationGainSplit::default().find_split(tree.root()).unwrap().unwrap();
        assert_eq!(test, SplitTest::numerical("LOC", 73.5));

        let strict = InformationGainSplit {
            min_gain: 1.0,
            parallel: true,
        };
        assert_eq!(strict.find_split(tree.root()).unwrap(), None);
    }

    #[test]
    fn test_information_gain_categorical() {
        let f = Frame::new(vec![
            (
                "Colour",
                Column::Categorical(["red", "blue", "red", "blue"].iter().map(|s| s.to_string()).collect()),
            ),
            ("Class", Column::Categorical(["a", "b", "a", "b"].iter().map(|s| s.to_string()).collect())),
        ])
        .unwrap();
        let tree = Tree::build(&f, "Class", &InformationGainSplit::default(), true).unwrap();
        assert_eq!(tree.num_nodes(), 3);
        let tests: Vec<String> = tree.root().child_branches.iter().map(|b| b.to_string()).collect();
        assert_eq!(tests, vec!["Colour = blue", "Colour = red"]);
    }

    #[test]
    fn test_max_depth() {
        let f = noisy_frame();
        let unbounded = Tree::build(&f, "Defective", &InformationGainSplit::default(), true).unwrap();
        assert!(unbounded.depth() > 1);

        let bounded = MaxDepth::new(InformationGainSplit::default(), Some(1), 1);
        let tree = Tree::build(&f, "Defective", &bounded, true).unwrap();
        assert_eq!(tree.depth(), 1);

        let min_records = MaxDepth::new(InformationGainSplit::default(), None, 100);
        let tree = Tree::build(&f, "Defective", &min_records, true).unwrap();
        assert_eq!(tree.num_nodes(), 1);
    }

    #[test]
    fn test_error_reduction_prune() {
        let f = noisy_frame();
        let mut tree = Tree::build(&f, "Defective", &InformationGainSplit::default(), true).unwrap();
        let before = tree.num_nodes();
        let pruned = tree.prune(&ErrorReductionPrune::new(1.0)).unwrap();
        assert!(pruned > 0);
        assert!(tree.num_nodes() < before);
        for leaf in tree.leaves() {
            assert!(leaf.is_leaf);
        }
    }

    #[test]
    fn test_error_reduction_prune_declines_useful_split() {
        let f = loc_frame();
        let mut tree = Tree::new(&f, "Defective").unwrap();
        tree.split(ROOT, &InformationGainSplit::default(), false).unwrap();
        let prune = ErrorReductionPrune::new(0.5);
        let children = tree.children(ROOT);
        assert!(!prune.should_prune(tree.root(), &children).unwrap());
    }
}
