//! Cost
//!
//! Expected-cost arithmetic for binary, cost-sensitive labelling. A cost
//! matrix maps the confusion-matrix cells `TP`, `TN`, `FP` and `FN` to the
//! cost of one record landing in that cell.
use crate::constants::COST_MATRIX_KEYS;
use crate::errors::WattleError;
use hashbrown::HashMap;

/// Cost of one record per confusion-matrix cell, keyed `TP`, `TN`, `FP`, `FN`.
pub type CostMatrix = HashMap<String, f64>;

/// Build a cost matrix from its four cells.
pub fn cost_matrix(tp: f64, tn: f64, fp: f64, fn_: f64) -> CostMatrix {
    COST_MATRIX_KEYS
        .iter()
        .zip([tp, tn, fp, fn_])
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// The four cells of a validated cost matrix.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Costs {
    pub tp: f64,
    pub tn: f64,
    pub fp: f64,
    pub fn_: f64,
}

impl Costs {
    /// Fails with `InvalidArgument` naming the first missing cell.
    pub fn from_matrix(cost_matrix: &CostMatrix) -> Result<Self, WattleError> {
        let cell = |key: &str| {
            cost_matrix
                .get(key)
                .copied()
                .ok_or_else(|| WattleError::InvalidArgument(format!("cost matrix is missing the '{}' entry", key)))
        };
        Ok(Costs {
            tp: cell("TP")?,
            tn: cell("TN")?,
            fp: cell("FP")?,
            fn_: cell("FN")?,
        })
    }
}

/// Cost arithmetic consumed by error accounting and cost-sensitive splitting.
pub trait CostModel {
    /// Total cost of labelling every record positive.
    fn cost_of_labeling_positive(
        &self,
        num_positive: usize,
        num_negative: usize,
        cost_matrix: &CostMatrix,
    ) -> Result<f64, WattleError>;

    /// Total cost of labelling every record negative.
    fn cost_of_labeling_negative(
        &self,
        num_positive: usize,
        num_negative: usize,
        cost_matrix: &CostMatrix,
    ) -> Result<f64, WattleError>;

    /// Cost of the cheaper labelling.
    fn expected_cost(&self, num_positive: usize, num_negative: usize, cost_matrix: &CostMatrix) -> Result<f64, WattleError> {
        let positive = self.cost_of_labeling_positive(num_positive, num_negative, cost_matrix)?;
        let negative = self.cost_of_labeling_negative(num_positive, num_negative, cost_matrix)?;
        Ok(positive.min(negative))
    }

    /// Summed expected cost of each child, given `(positive, negative)` counts.
    fn expected_cost_after_split(
        &self,
        child_supports: &[(usize, usize)],
        cost_matrix: &CostMatrix,
    ) -> Result<f64, WattleError> {
        child_supports
            .iter()
            .map(|(p, n)| self.expected_cost(*p, *n, cost_matrix))
            .sum()
    }
}

/// Linear confusion-matrix costs: labelling positive costs `p*TP + n*FP`,
/// labelling negative costs `p*FN + n*TN`.
#[derive(Clone, Copy, Default, Debug)]
pub struct StandardCostModel;

impl CostModel for StandardCostModel {
    fn cost_of_labeling_positive(
        &self,
        num_positive: usize,
        num_negative: usize,
        cost_matrix: &CostMatrix,
    ) -> Result<f64, WattleError> {
        let c = Costs::from_matrix(cost_matrix)?;
        Ok(num_positive as f64 * c.tp + num_negative as f64 * c.fp)
    }

    fn cost_of_labeling_negative(
        &self,
        num_positive: usize,
        num_negative: usize,
        cost_matrix: &CostMatrix,
    ) -> Result<f64, WattleError> {
        let c = Costs::from_matrix(cost_matrix)?;
        Ok(num_positive as f64 * c.fn_ + num_negative as f64 * c.tn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeling_costs() {
        let cm = cost_matrix(1., 0., 1., 5.);
        let model = StandardCostModel;
        assert_eq!(model.cost_of_labeling_positive(6, 14, &cm).unwrap(), 20.);
        assert_eq!(model.cost_of_labeling_negative(6, 14, &cm).unwrap(), 30.);
        assert_eq!(model.expected_cost(6, 14, &cm).unwrap(), 20.);
    }

    #[test]
    fn test_expected_cost_after_split() {
        let cm = cost_matrix(1., 0., 1., 5.);
        let model = StandardCostModel;
        let cost = model.expected_cost_after_split(&[(0, 14), (6, 0)], &cm).unwrap();
        assert_eq!(cost, 6.);
        assert_eq!(model.expected_cost_after_split(&[], &cm).unwrap(), 0.);
    }

    #[test]
    fn test_missing_key() {
        let mut cm = cost_matrix(1., 0., 1., 5.);
        cm.remove("FN");
        let err = StandardCostModel.expected_cost(1, 1, &cm).unwrap_err();
        match err {
            WattleError::InvalidArgument(msg) => assert!(msg.contains("FN")),
            e => panic!("unexpected error {:?}", e),
        }
    }
}
