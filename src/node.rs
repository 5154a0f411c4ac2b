use crate::branch::Branch;
use crate::cost::{CostMatrix, CostModel, StandardCostModel};
use crate::data::{AttributeType, ClassSupports, Dataset, Value};
use crate::errors::WattleError;
use crate::split_test::{Operator, SplitTest};
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

/// Columns of a dataset as seen by a tree, derived once when the tree is
/// created and shared by every node.
#[derive(Clone, PartialEq, Debug)]
pub struct Schema {
    pub class_attribute: String,
    /// Every column except the class attribute, in dataset order.
    pub attributes: Vec<(String, AttributeType)>,
}

impl Schema {
    pub fn from_dataset<D: Dataset>(data: &D, class_attribute: &str) -> Result<Self, WattleError> {
        if data.attribute_type(class_attribute).is_none() {
            return Err(WattleError::InvalidArgument(format!(
                "class attribute '{}' is not a column of the data",
                class_attribute
            )));
        }
        let attributes = data
            .column_names()
            .into_iter()
            .filter(|name| name != class_attribute)
            .filter_map(|name| data.attribute_type(&name).map(|t| (name, t)))
            .collect();
        Ok(Schema {
            class_attribute: class_attribute.to_string(),
            attributes,
        })
    }

    pub fn attribute_type(&self, name: &str) -> Option<AttributeType> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }
}

/// A vertex of a tree.
///
/// A node owns a partition of the dataset as row indices. Structural links
/// are node numbers into the owning `Tree`, so a node can only be changed
/// through the tree.
pub struct Node<'a, D: Dataset> {
    data: &'a D,
    schema: Arc<Schema>,
    pub num: usize,
    pub depth: usize,
    pub data_points: Vec<usize>,
    pub class_supports: ClassSupports,
    pub is_leaf: bool,
    pub is_root: bool,
    pub parent: Option<usize>,
    pub parent_branch: Option<Branch>,
    pub children: Vec<usize>,
    pub child_branches: Vec<Branch>,
}

impl<'a, D: Dataset> Node<'a, D> {
    pub(crate) fn new(
        data: &'a D,
        schema: Arc<Schema>,
        num: usize,
        depth: usize,
        data_points: Vec<usize>,
        parent_branch: Option<Branch>,
    ) -> Self {
        let class_supports = data.value_counts(&data_points, &schema.class_attribute);
        let parent = parent_branch.as_ref().map(|b| b.parent);
        Node {
            data,
            schema,
            num,
            depth,
            data_points,
            class_supports,
            is_leaf: true,
            is_root: parent_branch.is_none(),
            parent,
            parent_branch,
            children: Vec::new(),
            child_branches: Vec::new(),
        }
    }

    /// The dataset this node partitions.
    pub fn data(&self) -> &'a D {
        self.data
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn class_attribute(&self) -> &str {
        &self.schema.class_attribute
    }

    pub fn attribute_types(&self) -> &[(String, AttributeType)] {
        &self.schema.attributes
    }

    /// Every test worth evaluating on this node: one per categorical column,
    /// and for numerical columns one per midpoint between consecutive
    /// distinct values observed here.
    pub fn possible_splits(&self) -> Vec<SplitTest> {
        let mut splits = Vec::new();
        for (name, attribute_type) in self.attribute_types() {
            match attribute_type {
                AttributeType::Categorical => splits.push(SplitTest::categorical(name.as_str())),
                AttributeType::Numerical => {
                    let values: Vec<f64> = self
                        .data
                        .unique_values(&self.data_points, name)
                        .iter()
                        .filter_map(Value::as_f64)
                        .collect();
                    splits.extend(
                        values
                            .windows(2)
                            .map(|w| SplitTest::numerical(name.as_str(), (w[0] + w[1]) / 2.0)),
                    );
                }
            }
        }
        splits
    }

    /// The non-empty partitions `test` would produce on this node, with the
    /// test bound for each child. Numerical tests give `<=` then `>`;
    /// categorical tests give one partition per observed value, sorted, with
    /// records missing the value in a trailing partition.
    pub(crate) fn partition(&self, test: &SplitTest) -> Result<Vec<(SplitTest, Vec<usize>)>, WattleError> {
        let name = test.attribute_name.as_str();
        match self.schema.attribute_type(name) {
            Some(t) if t == test.attribute_type => {}
            Some(t) => {
                return Err(WattleError::InvalidArgument(format!(
                    "attribute '{}' is {}, the split test is {}",
                    name, t, test.attribute_type
                )))
            }
            None => {
                return Err(WattleError::InvalidArgument(format!(
                    "'{}' is not a splittable attribute",
                    name
                )))
            }
        }

        let mut partitions = match test.attribute_type {
            AttributeType::Numerical => {
                let threshold = test.threshold().ok_or_else(|| {
                    WattleError::InvalidArgument(format!("numerical test on '{}' has no threshold", name))
                })?;
                let goes_left = |v: Option<&Value>| {
                    v.and_then(Value::as_f64)
                        .map_or(false, |x| Operator::LessOrEqual.evaluate(x, threshold))
                };
                // Everything that is not `<=`, including missing values, goes right.
                let left = self.data.filter_rows(&self.data_points, name, goes_left);
                let right = self.data.filter_rows(&self.data_points, name, |v| !goes_left(v));
                vec![
                    (test.bind_operator(Operator::LessOrEqual), left),
                    (test.bind_operator(Operator::Greater), right),
                ]
            }
            AttributeType::Categorical => {
                let mut groups: Vec<(SplitTest, Vec<usize>)> = self
                    .data
                    .unique_values(&self.data_points, name)
                    .into_iter()
                    .map(|value| {
                        let rows = self.data.filter_rows(&self.data_points, name, |v| v == Some(&value));
                        (test.bind_value(value), rows)
                    })
                    .collect();
                let missing = self.data.filter_rows(&self.data_points, name, |v| v.is_none());
                groups.push((
                    SplitTest {
                        split_value: None,
                        ..test.clone()
                    },
                    missing,
                ));
                groups
            }
        };
        partitions.retain(|(_, rows)| !rows.is_empty());
        Ok(partitions)
    }

    /// Class supports each child would have if `test` were applied, in the
    /// order a split would create the children. Leaves this node untouched.
    pub fn split_supports(&self, test: &SplitTest) -> Result<Vec<ClassSupports>, WattleError> {
        Ok(self
            .partition(test)?
            .iter()
            .map(|(_, rows)| self.data.value_counts(rows, self.class_attribute()))
            .collect())
    }

    /// Like `split_supports`, reduced to `(positive, negative)` counts.
    pub fn split_supports_posneg(
        &self,
        test: &SplitTest,
        positive_class: &str,
    ) -> Result<Vec<(usize, usize)>, WattleError> {
        Ok(self
            .split_supports(test)?
            .iter()
            .map(|s| {
                let positive = s.get(positive_class);
                (positive, s.total() - positive)
            })
            .collect())
    }

    pub fn num_records(&self) -> usize {
        self.data_points.len()
    }

    pub fn num_positive(&self, positive_class: &str) -> usize {
        self.class_supports.get(positive_class)
    }

    pub fn num_negative(&self, positive_class: &str) -> usize {
        self.class_supports.total() - self.num_positive(positive_class)
    }

    /// Resubstitution errors if this node were labelled as a leaf now.
    ///
    /// Without costs the label is the majority class (ties go to the smallest
    /// class value). With costs the cheaper of labelling everything positive
    /// or negative wins, ties favour positive, and the errors are the records
    /// of the other class.
    pub fn num_errors(
        &self,
        cost_sensitive: bool,
        cost_matrix: Option<&CostMatrix>,
        positive_class: Option<&str>,
    ) -> Result<usize, WattleError> {
        self.num_errors_with(&StandardCostModel, cost_sensitive, cost_matrix, positive_class)
    }

    /// `num_errors` with an explicit cost model.
    pub fn num_errors_with<M: CostModel + ?Sized>(
        &self,
        model: &M,
        cost_sensitive: bool,
        cost_matrix: Option<&CostMatrix>,
        positive_class: Option<&str>,
    ) -> Result<usize, WattleError> {
        if !cost_sensitive {
            let label_support = self.class_supports.majority().map_or(0, |(_, c)| c);
            return Ok(self.class_supports.total() - label_support);
        }
        let (positive, negative, positive_cheaper) = self.cost_labeling(model, cost_matrix, positive_class)?;
        Ok(if positive_cheaper { negative } else { positive })
    }

    /// The class this node predicts as a leaf, under the same rules as
    /// `num_errors`. Cost-sensitive labelling of a node whose records are all
    /// positive-or-other returns `None` for the negative label, since there is
    /// no single negative class value to name.
    pub fn label(
        &self,
        cost_sensitive: bool,
        cost_matrix: Option<&CostMatrix>,
        positive_class: Option<&str>,
    ) -> Result<Option<String>, WattleError> {
        if !cost_sensitive {
            return Ok(self.class_supports.majority().map(|(c, _)| c.to_string()));
        }
        let (_, _, positive_cheaper) = self.cost_labeling(&StandardCostModel, cost_matrix, positive_class)?;
        if positive_cheaper {
            return Ok(positive_class.map(str::to_string));
        }
        let pc = positive_class.unwrap_or_default();
        let negatives: Vec<&str> = self.class_supports.iter().map(|(c, _)| c).filter(|c| *c != pc).collect();
        Ok(match negatives.as_slice() {
            [only] => Some(only.to_string()),
            _ => None,
        })
    }

    fn cost_labeling<M: CostModel + ?Sized>(
        &self,
        model: &M,
        cost_matrix: Option<&CostMatrix>,
        positive_class: Option<&str>,
    ) -> Result<(usize, usize, bool), WattleError> {
        let cost_matrix = cost_matrix
            .ok_or_else(|| WattleError::InvalidArgument("cost-sensitive errors need a cost matrix".to_string()))?;
        let positive_class = positive_class
            .ok_or_else(|| WattleError::InvalidArgument("cost-sensitive errors need a positive class".to_string()))?;
        let positive = self.num_positive(positive_class);
        let negative = self.num_negative(positive_class);
        let cost_positive = model.cost_of_labeling_positive(positive, negative, cost_matrix)?;
        let cost_negative = model.cost_of_labeling_negative(positive, negative, cost_matrix)?;
        Ok((positive, negative, cost_positive <= cost_negative))
    }
}

impl<D: Dataset> Debug for Node<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Node")
            .field("num", &self.num)
            .field("depth", &self.depth)
            .field("records", &self.data_points.len())
            .field("class_supports", &self.class_supports)
            .field("is_leaf", &self.is_leaf)
            .field("is_root", &self.is_root)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}

impl<D: Dataset> Display for Node<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.class_supports)
    }
}
