//! Regression forest evaluation for house price prediction.
//!
//! The model artifact is a JSON export of a trained random forest together
//! with the input encoding it was trained on: numeric features pass through,
//! categorical features expand into one-hot blocks. Each tree is a flat node
//! array in which children always follow their parent, so traversal is a
//! forward walk that cannot loop.

use std::collections::HashMap;

use housecast_core::{FEATURE_NAMES, FeatureKind, FeatureRecord, FeatureValue};
use serde::Deserialize;

use crate::{ModelError, PredictError, Predictor};

/// Input column as declared by the artifact, in canonical feature order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnSpec {
    Numeric {
        name: String,
    },
    Categorical {
        name: String,
        categories: Vec<String>,
    },
}

impl ColumnSpec {
    fn name(&self) -> &str {
        match self {
            Self::Numeric { name } | Self::Categorical { name, .. } => name,
        }
    }

    fn kind(&self) -> FeatureKind {
        match self {
            Self::Numeric { .. } => FeatureKind::Numeric,
            Self::Categorical { .. } => FeatureKind::Categorical,
        }
    }
}

/// Transform applied to the training target; predictions are mapped back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTransform {
    #[default]
    Identity,
    /// Trained on `ln(1 + price)`; predictions are passed through `exp(x) - 1`.
    Log1p,
}

impl TargetTransform {
    fn invert(self, y: f64) -> f64 {
        match self {
            Self::Identity => y,
            Self::Log1p => y.exp_m1(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

#[derive(Deserialize)]
struct Artifact {
    columns: Vec<ColumnSpec>,
    #[serde(default)]
    target: TargetTransform,
    trees: Vec<Tree>,
}

enum Encoding {
    Numeric,
    OneHot(HashMap<String, usize>),
}

struct Column {
    offset: usize,
    encoding: Encoding,
}

/// A validated regression forest, ready for concurrent read-only use.
pub struct ForestModel {
    columns: Vec<Column>,
    width: usize,
    target: TargetTransform,
    trees: Vec<Tree>,
}

impl ForestModel {
    /// Parse and validate a serialized artifact.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let artifact: Artifact = serde_json::from_slice(bytes)?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: Artifact) -> Result<Self, ModelError> {
        if artifact.columns.len() != FEATURE_NAMES.len() {
            return Err(ModelError::Artifact(format!(
                "expected {} columns, found {}",
                FEATURE_NAMES.len(),
                artifact.columns.len()
            )));
        }

        let mut columns = Vec::with_capacity(artifact.columns.len());
        let mut width = 0usize;
        for (index, declared) in artifact.columns.iter().enumerate() {
            let expected = FEATURE_NAMES[index];
            if declared.name() != expected {
                return Err(ModelError::Artifact(format!(
                    "column {index} is '{}', expected '{expected}'",
                    declared.name()
                )));
            }
            if declared.kind() != FeatureKind::of_index(index) {
                return Err(ModelError::Artifact(format!(
                    "column '{expected}' has the wrong kind ({:?})",
                    declared.kind()
                )));
            }

            let encoding = match declared {
                ColumnSpec::Numeric { .. } => Encoding::Numeric,
                ColumnSpec::Categorical { categories, .. } => {
                    let mut slots = HashMap::with_capacity(categories.len());
                    for (slot, category) in categories.iter().enumerate() {
                        if slots.insert(category.clone(), slot).is_some() {
                            return Err(ModelError::Artifact(format!(
                                "column '{expected}' repeats category '{category}'"
                            )));
                        }
                    }
                    Encoding::OneHot(slots)
                }
            };

            let span = match &encoding {
                Encoding::Numeric => 1,
                Encoding::OneHot(slots) => slots.len(),
            };
            columns.push(Column {
                offset: width,
                encoding,
            });
            width += span;
        }

        if artifact.trees.is_empty() {
            return Err(ModelError::Artifact("forest has no trees".into()));
        }
        for (t, tree) in artifact.trees.iter().enumerate() {
            validate_tree(tree, width).map_err(|e| ModelError::Artifact(format!("tree {t}: {e}")))?;
        }

        Ok(Self {
            columns,
            width,
            target: artifact.target,
            trees: artifact.trees,
        })
    }

    /// Width of the encoded design row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of trees in the forest.
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn target(&self) -> TargetTransform {
        self.target
    }

    /// Encode a record into the design row the trees split on.
    ///
    /// Categories the model never saw encode as an all-zero block.
    pub fn encode(&self, record: &FeatureRecord) -> Result<Vec<f64>, PredictError> {
        let mut row = vec![0.0; self.width];
        for (column, (name, value)) in self.columns.iter().zip(record.values()) {
            match (&column.encoding, value) {
                (Encoding::Numeric, FeatureValue::Number(x)) => row[column.offset] = x,
                (Encoding::OneHot(slots), FeatureValue::Category(c)) => {
                    if let Some(&slot) = slots.get(c) {
                        row[column.offset + slot] = 1.0;
                    }
                }
                _ => {
                    return Err(PredictError::Schema(format!(
                        "feature '{name}' has the wrong type for its column"
                    )));
                }
            }
        }
        Ok(row)
    }

    /// Predict from an already-encoded design row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| leaf_value(tree, row)).sum();
        self.target.invert(sum / self.trees.len() as f64)
    }
}

impl Predictor for ForestModel {
    fn predict(&self, rows: &[FeatureRecord]) -> Result<Vec<f64>, PredictError> {
        rows.iter()
            .map(|record| self.encode(record).map(|row| self.predict_row(&row)))
            .collect()
    }
}

// ── Tree helpers ──

fn validate_tree(tree: &Tree, width: usize) -> Result<(), String> {
    if tree.nodes.is_empty() {
        return Err("no nodes".into());
    }
    let len = tree.nodes.len();
    for (i, node) in tree.nodes.iter().enumerate() {
        match *node {
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if feature >= width {
                    return Err(format!("node {i} splits on column {feature} of {width}"));
                }
                if threshold.is_nan() {
                    return Err(format!("node {i} has a NaN threshold"));
                }
                for child in [left, right] {
                    if child <= i || child >= len {
                        return Err(format!("node {i} has invalid child {child}"));
                    }
                }
            }
            Node::Leaf { value } => {
                if !value.is_finite() {
                    return Err(format!("leaf {i} has non-finite value"));
                }
            }
        }
    }
    Ok(())
}

/// Walk from the root to a leaf. Children always have larger indices, so
/// this terminates for any validated tree.
fn leaf_value(tree: &Tree, row: &[f64]) -> f64 {
    let mut i = 0;
    loop {
        match tree.nodes[i] {
            Node::Leaf { value } => return value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                i = if row[feature] <= threshold { left } else { right };
            }
        }
    }
}
