//! Bootstrap-aggregated random forest regressor
//!
//! Every tree is grown on its own bootstrap sample drawn from an RNG seeded
//! with `seed + tree_index`, so a fitted forest depends only on the data and
//! the parameters, never on how rayon schedules the trees.

use crate::tree::{RegressionTree, TreeParams};
use crate::{validate_matrix, ForestError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    n_trees: usize,
    seed: u64,
    tree: TreeParams,
}

/// A fitted random forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
    params: RandomForestRegressor,
}

impl RandomForestRegressor {
    /// Create a forest of `n_trees` trees seeded with `seed`
    pub fn new(n_trees: usize, seed: u64) -> Result<Self> {
        if n_trees == 0 {
            return Err(ForestError::InvalidParameter(
                "Forest needs at least one tree".to_string(),
            ));
        }

        Ok(Self {
            n_trees,
            seed,
            tree: TreeParams::default(),
        })
    }

    /// Replace the per-tree stopping rules
    pub fn with_tree_params(mut self, tree: TreeParams) -> Result<Self> {
        tree.validate()?;
        self.tree = tree;
        Ok(self)
    }

    /// Number of trees in the ensemble
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Base seed for bootstrap sampling
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Per-tree stopping rules
    pub fn tree_params(&self) -> &TreeParams {
        &self.tree
    }

    /// Fit the forest on a dense feature matrix
    pub fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<FittedForest> {
        let n_features = validate_matrix(x, y)?;
        let n_rows = x.len();

        let trees = (0..self.n_trees)
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(tree_index as u64));
                let sample: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                RegressionTree::fit_indices(x, y, &sample, &self.tree)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FittedForest {
            trees,
            n_features,
            params: *self,
        })
    }
}

impl FittedForest {
    /// Average prediction of all trees for one row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(ForestError::DimensionMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }

        if self.trees.is_empty() {
            return Err(ForestError::CorruptModel("forest has no trees".to_string()));
        }

        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict_row(row)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    /// Predict every row of a feature matrix
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Check a forest that did not come from `fit`, e.g. one read from disk
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(ForestError::CorruptModel("forest has no trees".to_string()));
        }

        for (index, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features {
                return Err(ForestError::CorruptModel(format!(
                    "tree {} expects {} features, forest expects {}",
                    index,
                    tree.n_features(),
                    self.n_features
                )));
            }
            tree.validate()?;
        }
        Ok(())
    }

    /// Number of features the forest expects
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Fitted trees
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Parameters the forest was fitted with
    pub fn params(&self) -> &RandomForestRegressor {
        &self.params
    }
}
