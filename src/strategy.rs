//! Strategy
//!
//! The two seams a tree is grown and pruned through. The tree never decides
//! on its own whether to split or collapse a node, it asks one of these.
use crate::data::Dataset;
use crate::errors::WattleError;
use crate::node::Node;
use crate::split_test::SplitTest;

/// Chooses how a leaf should be split.
pub trait SplitStrategy<D: Dataset> {
    /// The test to split `node` on, or `None` if it should stay a leaf.
    fn find_split(&self, node: &Node<'_, D>) -> Result<Option<SplitTest>, WattleError>;
}

/// Decides whether a node's children should be collapsed back into it.
pub trait PruneStrategy<D: Dataset> {
    /// `children` are the node's children, all of them leaves.
    fn should_prune(&self, node: &Node<'_, D>, children: &[&Node<'_, D>]) -> Result<bool, WattleError>;
}

impl<D: Dataset, S: SplitStrategy<D> + ?Sized> SplitStrategy<D> for &S {
    fn find_split(&self, node: &Node<'_, D>) -> Result<Option<SplitTest>, WattleError> {
        (**self).find_split(node)
    }
}

impl<D: Dataset, S: SplitStrategy<D> + ?Sized> SplitStrategy<D> for Box<S> {
    fn find_split(&self, node: &Node<'_, D>) -> Result<Option<SplitTest>, WattleError> {
        (**self).find_split(node)
    }
}

impl<D: Dataset, P: PruneStrategy<D> + ?Sized> PruneStrategy<D> for &P {
    fn should_prune(&self, node: &Node<'_, D>, children: &[&Node<'_, D>]) -> Result<bool, WattleError> {
        (**self).should_prune(node, children)
    }
}

impl<D: Dataset, P: PruneStrategy<D> + ?Sized> PruneStrategy<D> for Box<P> {
    fn should_prune(&self, node: &Node<'_, D>, children: &[&Node<'_, D>]) -> Result<bool, WattleError> {
        (**self).should_prune(node, children)
    }
}
