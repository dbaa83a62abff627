//! Tree ensembles (gradient-boosted trees and random forests)
//!
//! Trees are stored as flat node arrays with the root at index 0. A split
//! sends `x < threshold` left and everything else right; a non-finite input
//! follows `default_left`.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::TrainedModel;
use crate::codec::FeatureVector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default)]
        default_left: bool,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Children must come after their parent, which rules out cycles.
    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            bail!("tree has no nodes");
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        bail!(
                            "node {} splits on feature {} but the model has {} features",
                            idx,
                            feature,
                            n_features
                        );
                    }
                    if !threshold.is_finite() {
                        bail!("node {} has a non-finite threshold", idx);
                    }
                    for child in [left, right] {
                        if *child <= idx || *child >= self.nodes.len() {
                            bail!("node {} has invalid child index {}", idx, child);
                        }
                    }
                }
                Node::Leaf { leaf } => {
                    if !leaf.is_finite() {
                        bail!("node {} has a non-finite leaf value", idx);
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, values: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { leaf } => return *leaf,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = values[*feature];
                    idx = if !x.is_finite() {
                        if *default_left {
                            *left
                        } else {
                            *right
                        }
                    } else if x < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// How tree outputs combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Boosting: `base_score + sum(trees)`
    Sum,
    /// Forest: `base_score + mean(trees)`
    Mean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    n_features: usize,
    #[serde(default)]
    base_score: f64,
    aggregation: Aggregation,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn new(
        n_features: usize,
        base_score: f64,
        aggregation: Aggregation,
        trees: Vec<Tree>,
    ) -> Result<Self> {
        let model = Self {
            n_features,
            base_score,
            aggregation,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            bail!("tree ensemble has no trees");
        }
        if !self.base_score.is_finite() {
            bail!("tree ensemble base_score is not finite");
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| e.context(format!("tree {}", i)))?;
        }
        Ok(())
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl TrainedModel for TreeEnsemble {
    fn kind(&self) -> &'static str {
        match self.aggregation {
            Aggregation::Sum => "gradient_boosted_trees",
            Aggregation::Mean => "random_forest",
        }
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        if features.len() != self.n_features {
            bail!(
                "tree ensemble expects {} features, got {}",
                self.n_features,
                features.len()
            );
        }
        let values = features.values();
        let total: f64 = self.trees.iter().map(|t| t.evaluate(values)).sum();
        let combined = match self.aggregation {
            Aggregation::Sum => total,
            Aggregation::Mean => total / self.trees.len() as f64,
        };
        Ok(self.base_score + combined)
    }
}
