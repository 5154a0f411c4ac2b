use crate::branch::Branch;
use crate::constants::{CONDITION_SEPARATOR, EMPTY_CONDITION};
use crate::data::{ClassSupports, Dataset};
use crate::errors::WattleError;
use crate::node::{Node, Schema};
use crate::split_test::SplitTest;
use crate::strategy::{PruneStrategy, SplitStrategy};
use hashbrown::HashMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::sync::Arc;

/// Number of the root node of every tree.
pub const ROOT: usize = 0;

/// The conjunction of branch tests leading from the root to one leaf,
/// paired with that leaf's class supports.
#[derive(Deserialize, Serialize, Clone, PartialEq, Debug)]
pub struct Rule {
    pub leaf: usize,
    pub conditions: Vec<SplitTest>,
    pub class_supports: ClassSupports,
}

impl Rule {
    /// The conditions joined with `AND`, `TRUE` for the root.
    pub fn antecedent(&self) -> String {
        if self.conditions.is_empty() {
            EMPTY_CONDITION.to_string()
        } else {
            self.conditions
                .iter()
                .map(SplitTest::condition)
                .collect::<Vec<_>>()
                .join(CONDITION_SEPARATOR)
        }
    }

    /// `(attribute, comparison)` pairs accepted by `Tree::find_node`.
    pub fn lookup(&self) -> Vec<(String, String)> {
        self.conditions
            .iter()
            .map(|t| (t.attribute_name.clone(), t.comparison()))
            .collect()
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IF {} THEN {}", self.antecedent(), self.class_supports)
    }
}

/// A decision tree over a borrowed dataset.
///
/// Nodes live in an arena keyed by their number; links between them are
/// numbers, never pointers. Collapsing a subtree removes its nodes from the
/// arena, and numbers are never handed out twice.
pub struct Tree<'a, D: Dataset> {
    data: &'a D,
    schema: Arc<Schema>,
    pub nodes: HashMap<usize, Node<'a, D>>,
    next_num: usize,
}

impl<'a, D: Dataset> Tree<'a, D> {
    /// A tree holding only a root leaf with every record of `data`.
    pub fn new(data: &'a D, class_attribute: &str) -> Result<Self, WattleError> {
        let schema = Arc::new(Schema::from_dataset(data, class_attribute)?);
        let root = Node::new(data, Arc::clone(&schema), ROOT, 0, (0..data.n_rows()).collect(), None);
        let mut nodes = HashMap::new();
        nodes.insert(ROOT, root);
        Ok(Tree {
            data,
            schema,
            nodes,
            next_num: ROOT + 1,
        })
    }

    /// Create a tree and split its root straight away.
    pub fn build<S: SplitStrategy<D> + ?Sized>(
        data: &'a D,
        class_attribute: &str,
        strategy: &S,
        recursive: bool,
    ) -> Result<Self, WattleError> {
        let mut tree = Tree::new(data, class_attribute)?;
        tree.split(ROOT, strategy, recursive)?;
        info!(
            "built tree on {} records: {} nodes, {} leaves, depth {}",
            data.n_rows(),
            tree.num_nodes(),
            tree.num_leaves(),
            tree.depth()
        );
        Ok(tree)
    }

    pub fn data(&self) -> &'a D {
        self.data
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn root(&self) -> &Node<'a, D> {
        &self.nodes[&ROOT]
    }

    pub fn node(&self, num: usize) -> Option<&Node<'a, D>> {
        self.nodes.get(&num)
    }

    fn get_node(&self, num: usize) -> Result<&Node<'a, D>, WattleError> {
        self.nodes
            .get(&num)
            .ok_or_else(|| WattleError::InvalidArgument(format!("node {} is not part of the tree", num)))
    }

    /// Children of a node, in split order.
    pub fn children(&self, num: usize) -> Vec<&Node<'a, D>> {
        self.nodes
            .get(&num)
            .map(|n| n.children.iter().filter_map(|c| self.nodes.get(c)).collect())
            .unwrap_or_default()
    }

    /// Split leaf `num` with `strategy`. With `recursive`, every child is
    /// then split the same way, depth first, each child fully expanded before
    /// its next sibling.
    ///
    /// Returns whether `num` itself was split. A strategy declining, or a
    /// test that leaves fewer than two non-empty partitions, is not a split.
    pub fn split<S: SplitStrategy<D> + ?Sized>(
        &mut self,
        num: usize,
        strategy: &S,
        recursive: bool,
    ) -> Result<bool, WattleError> {
        if !self.get_node(num)?.is_leaf {
            return Err(WattleError::InvalidState(format!("cannot split a non-leaf node ({})", num)));
        }
        let split = self.split_leaf(num, strategy)?;
        if split && recursive {
            let mut stack: Vec<usize> = self.nodes[&num].children.iter().rev().copied().collect();
            while let Some(n) = stack.pop() {
                if self.split_leaf(n, strategy)? {
                    stack.extend(self.nodes[&n].children.iter().rev());
                }
            }
        }
        Ok(split)
    }

    fn split_leaf<S: SplitStrategy<D> + ?Sized>(&mut self, num: usize, strategy: &S) -> Result<bool, WattleError> {
        let node = self.get_node(num)?;
        let test = match strategy.find_split(node)? {
            Some(test) => test,
            None => return Ok(false),
        };
        let partitions = node.partition(&test)?;
        if partitions.len() < 2 {
            debug!("split of node {} on {} is degenerate, keeping it a leaf", num, test);
            return Ok(false);
        }
        let depth = node.depth + 1;

        let mut children = Vec::with_capacity(partitions.len());
        let mut child_branches = Vec::with_capacity(partitions.len());
        for (bound_test, rows) in partitions {
            let child_num = self.next_num;
            self.next_num += 1;
            let branch = Branch::new(num, child_num, bound_test);
            let child = Node::new(
                self.data,
                Arc::clone(&self.schema),
                child_num,
                depth,
                rows,
                Some(branch.clone()),
            );
            self.nodes.insert(child_num, child);
            children.push(child_num);
            child_branches.push(branch);
        }

        debug!("split node {} on {} into {:?}", num, test, children);
        if let Some(node) = self.nodes.get_mut(&num) {
            node.children = children;
            node.child_branches = child_branches;
            node.is_leaf = false;
        }
        Ok(true)
    }

    /// Ask `strategy` whether the children of `num` should be collapsed into
    /// it. Every child must be a leaf. Pruning a leaf does nothing.
    pub fn prune_node<P: PruneStrategy<D> + ?Sized>(&mut self, num: usize, strategy: &P) -> Result<bool, WattleError> {
        let node = self.get_node(num)?;
        let children = self.children(num);
        if children.iter().any(|c| !c.is_leaf) {
            return Err(WattleError::InvalidState(format!(
                "cannot prune a node with a non-leaf child ({})",
                num
            )));
        }
        if node.is_leaf || !strategy.should_prune(node, &children)? {
            return Ok(false);
        }

        let removed = node.children.clone();
        for child in removed.iter() {
            self.nodes.remove(child);
        }
        if let Some(node) = self.nodes.get_mut(&num) {
            node.children.clear();
            node.child_branches.clear();
            node.is_leaf = true;
        }
        debug!("pruned node {}, removed {:?}", num, removed);
        Ok(true)
    }

    /// Prune the whole tree bottom up. A node is offered to `strategy` once
    /// all of its children are leaves, so a declined child shields every
    /// ancestor. Returns the number of nodes that were collapsed.
    pub fn prune<P: PruneStrategy<D> + ?Sized>(&mut self, strategy: &P) -> Result<usize, WattleError> {
        let before = self.num_nodes();
        let mut pruned = 0;
        for num in self.postorder() {
            let offered = match self.nodes.get(&num) {
                Some(node) => !node.is_leaf && node.children.iter().all(|c| self.nodes[c].is_leaf),
                None => false,
            };
            if offered && self.prune_node(num, strategy)? {
                pruned += 1;
            }
        }
        info!(
            "pruning: collapsed {} nodes, n_nodes: {} -> {}",
            pruned,
            before,
            self.num_nodes()
        );
        Ok(pruned)
    }

    /// Node numbers reachable from the root, parents before children and
    /// siblings in split order.
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(num) = stack.pop() {
            if let Some(node) = self.nodes.get(&num) {
                order.push(num);
                stack.extend(node.children.iter().rev());
            }
        }
        order
    }

    /// Node numbers reachable from the root, children before parents.
    pub fn postorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(num) = stack.pop() {
            if let Some(node) = self.nodes.get(&num) {
                order.push(num);
                stack.extend(node.children.iter());
            }
        }
        order.reverse();
        order
    }

    pub fn num_nodes(&self) -> usize {
        self.preorder().len()
    }

    pub fn num_leaves(&self) -> usize {
        self.leaves().len()
    }

    pub fn depth(&self) -> usize {
        self.preorder().iter().map(|n| self.nodes[n].depth).max().unwrap_or(0)
    }

    /// Leaves in pre-order.
    pub fn leaves(&self) -> Vec<&Node<'a, D>> {
        self.preorder()
            .iter()
            .map(|n| &self.nodes[n])
            .filter(|n| n.is_leaf)
            .collect()
    }

    /// Branches from the root down to `num`.
    pub fn path(&self, num: usize) -> Vec<&Branch> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(&num);
        while let Some(node) = current {
            match &node.parent_branch {
                Some(branch) => {
                    path.push(branch);
                    current = self.nodes.get(&branch.parent);
                }
                None => current = None,
            }
        }
        path.reverse();
        path
    }

    /// One rule per leaf, in pre-order.
    pub fn rules(&self) -> Vec<Rule> {
        self.leaves()
            .into_iter()
            .map(|leaf| Rule {
                leaf: leaf.num,
                conditions: self.path(leaf.num).into_iter().map(|b| b.split_test.clone()).collect(),
                class_supports: leaf.class_supports.clone(),
            })
            .collect()
    }

    /// Rendered rules, `IF c1 AND c2 THEN {supports}`.
    pub fn get_rules(&self) -> BTreeSet<String> {
        self.rules().iter().map(Rule::to_string).collect()
    }

    /// Follow `rule`, pairs of attribute name and comparison such as
    /// `("LOC", "<= 73.5")`, from the root. At each node the first child
    /// whose branch test matches a not yet used pair is entered. Returns the
    /// node where no child matches, provided every pair was used.
    pub fn find_node<I, K, V>(&self, rule: I) -> Option<&Node<'a, D>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let entries: Vec<(K, V)> = rule.into_iter().collect();
        let mut used = vec![false; entries.len()];
        let mut current = self.root();
        loop {
            let next = current.child_branches.iter().find_map(|branch| {
                let test = &branch.split_test;
                entries
                    .iter()
                    .enumerate()
                    .position(|(i, (attribute, comparison))| {
                        !used[i]
                            && attribute.as_ref() == test.attribute_name
                            && test.matches_comparison(comparison.as_ref())
                    })
                    .map(|i| (i, branch.child))
            });
            match next {
                Some((i, child)) => {
                    used[i] = true;
                    current = self.nodes.get(&child)?;
                }
                None => break,
            }
        }
        if used.iter().all(|u| *u) {
            Some(current)
        } else {
            None
        }
    }
}

impl<D: Dataset> Display for Tree<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let lines: Vec<String> = self
            .rules()
            .iter()
            .map(|r| format!("{} : {}", r.antecedent(), r.class_supports))
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}
