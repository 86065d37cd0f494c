//! CART regression tree
//!
//! Trees are grown greedily with the squared-error criterion. Candidate
//! thresholds sit halfway between consecutive distinct feature values and a
//! row goes left when `value <= threshold`. Nodes live in a flat vector with
//! the root at index 0.

use crate::{validate_matrix, ForestError, Result};
use serde::{Deserialize, Serialize};

/// Stopping rules for tree growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth of the tree, unlimited when `None`
    pub max_depth: Option<usize>,
    /// Minimum number of samples required to split an internal node
    pub min_samples_split: usize,
    /// Minimum number of samples required in each leaf
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl TreeParams {
    /// Validate the stopping rules
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == Some(0) {
            return Err(ForestError::InvalidParameter(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ForestError::InvalidParameter(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForestError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Internal node routing rows by one feature
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal node holding the mean target of its samples
    Leaf { value: f64, samples: usize },
}

/// A fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

/// Best split found for a node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Fit a tree on every row of `x`
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &TreeParams) -> Result<Self> {
        validate_matrix(x, y)?;
        let indices: Vec<usize> = (0..x.len()).collect();
        Self::fit_indices(x, y, &indices, params)
    }

    /// Fit a tree on the rows selected by `indices`.
    ///
    /// Indices may repeat, which is how bootstrap samples are expressed.
    /// The matrix is assumed to be validated by the caller.
    pub(crate) fn fit_indices(
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        params: &TreeParams,
    ) -> Result<Self> {
        params.validate()?;
        if indices.is_empty() {
            return Err(ForestError::InsufficientData(
                "Cannot grow a tree from zero samples".to_string(),
            ));
        }

        let n_features = x[indices[0]].len();
        let mut tree = Self {
            nodes: Vec::new(),
            n_features,
        };
        tree.grow(x, y, indices.to_vec(), 0, params);
        Ok(tree)
    }

    /// Grow the subtree for `indices` and return the index of its root node
    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: Vec<usize>,
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let node_id = self.nodes.len();
        let n = indices.len();
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let mean = sum / n as f64;
        self.nodes.push(Node::Leaf {
            value: mean,
            samples: n,
        });

        let depth_reached = params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || n < params.min_samples_split {
            return node_id;
        }

        // Pure node
        if indices.iter().all(|&i| y[i] == y[indices[0]]) {
            return node_id;
        }

        let parent_score = sum * sum / n as f64;
        let Some(split) = self.best_split(x, y, &indices, params) else {
            return node_id;
        };
        if split.score <= parent_score + 1e-12 * parent_score.abs().max(1.0) {
            return node_id;
        }

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let left = self.grow(x, y, left_rows, depth + 1, params);
        let right = self.grow(x, y, right_rows, depth + 1, params);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    /// Search every feature for the split maximising `S_l²/n_l + S_r²/n_r`,
    /// which is equivalent to minimising the children's squared error.
    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        params: &TreeParams,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let total: f64 = indices.iter().map(|&i| y[i]).sum();
        let min_leaf = params.min_samples_leaf;
        let mut best: Option<SplitCandidate> = None;

        let mut column: Vec<(f64, f64)> = Vec::with_capacity(n);
        for feature in 0..self.n_features {
            column.clear();
            column.extend(indices.iter().map(|&i| (x[i][feature], y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            if column[0].0 == column[n - 1].0 {
                continue;
            }

            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += column[pos].1;
                let left_n = pos + 1;
                let right_n = n - left_n;

                if left_n < min_leaf {
                    continue;
                }
                if right_n < min_leaf {
                    break;
                }
                // Only split between distinct values
                if column[pos].0 == column[pos + 1].0 {
                    continue;
                }

                let right_sum = total - left_sum;
                let score =
                    left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64;

                if best.as_ref().map_or(true, |b| score > b.score) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: midpoint(column[pos].0, column[pos + 1].0),
                        score,
                    });
                }
            }
        }

        best
    }

    /// Predict the target for a single feature row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(ForestError::DimensionMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }

        let mut current = 0;
        loop {
            let node = self.nodes.get(current).ok_or_else(|| {
                ForestError::CorruptModel(format!("node {} does not exist", current))
            })?;
            match node {
                Node::Leaf { value, .. } => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    current = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Check the structure of a tree that did not come from `fit`.
    ///
    /// Children always follow their parent in the node vector, which rules
    /// out cycles and dangling indices in one pass.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ForestError::CorruptModel("tree has no nodes".to_string()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value, .. } => {
                    if !value.is_finite() {
                        return Err(ForestError::CorruptModel(format!(
                            "leaf {} holds a non-finite value",
                            index
                        )));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= self.n_features {
                        return Err(ForestError::CorruptModel(format!(
                            "node {} splits on feature {} of {}",
                            index, feature, self.n_features
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(ForestError::CorruptModel(format!(
                            "node {} has a NaN threshold",
                            index
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(ForestError::CorruptModel(format!(
                                "node {} points to invalid child {}",
                                index, child
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of features the tree was fitted on
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// All nodes, root first
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf (a lone root has depth 0)
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Threshold halfway between two adjacent values that still separates them
fn midpoint(low: f64, high: f64) -> f64 {
    let mid = low + (high - low) / 2.0;
    if mid >= high {
        low
    } else {
        mid
    }
}
