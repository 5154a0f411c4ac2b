use crate::split_test::SplitTest;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Edge between a parent node and one of its children, labelled with the
/// test a record must pass to travel it. Nodes are referred to by their
/// number in the tree.
#[derive(Deserialize, Serialize, Clone, PartialEq, Debug)]
pub struct Branch {
    pub parent: usize,
    pub child: usize,
    pub split_test: SplitTest,
}

impl Branch {
    pub fn new(parent: usize, child: usize, split_test: SplitTest) -> Self {
        Branch {
            parent,
            child,
            split_test,
        }
    }
}

impl Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.split_test)
    }
}
