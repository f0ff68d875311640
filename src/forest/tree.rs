//! CART classification tree with weighted Gini impurity.
//!
//! Nodes live in a flat arena; children are referenced by index. Samples are
//! passed as indices into the caller's rows so bootstrap duplicates cost
//! nothing extra.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        probabilities: [f64; 2],
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

/// Weighted class totals of a node.
#[derive(Debug, Clone, Copy, Default)]
struct Counts([f64; 2]);

impl Counts {
    fn add(&mut self, label: usize, weight: f64) {
        self.0[label] += weight;
    }

    fn total(&self) -> f64 {
        self.0[0] + self.0[1]
    }

    fn gini(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let p0 = self.0[0] / total;
        let p1 = self.0[1] / total;
        1.0 - p0 * p0 - p1 * p1
    }

    fn probabilities(&self) -> [f64; 2] {
        let total = self.total();
        if total <= 0.0 {
            [0.5, 0.5]
        } else {
            [self.0[0] / total, self.0[1] / total]
        }
    }

    fn is_pure(&self) -> bool {
        self.0[0] <= 0.0 || self.0[1] <= 0.0
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [usize],
    class_weight: [f64; 2],
    params: TreeParams,
    n_features: usize,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl<'a> Builder<'a> {
    fn counts(&self, samples: &[usize]) -> Counts {
        let mut c = Counts::default();
        for &s in samples {
            let label = self.labels[s];
            c.add(label, self.class_weight[label]);
        }
        c
    }

    fn best_split_on(&self, samples: &[usize], feature: usize, parent: &Counts) -> Option<SplitCandidate> {
        let mut sorted: Vec<(f64, usize)> = samples
            .iter()
            .map(|&s| (self.rows[s][feature], self.labels[s]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
        if sorted.first()?.0 == sorted.last()?.0 {
            return None;
        }

        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_impurity = parent.gini() * parent.total();
        let mut left = Counts::default();
        let mut best: Option<SplitCandidate> = None;
        for i in 0..sorted.len() - 1 {
            let (value, label) = sorted[i];
            left.add(label, self.class_weight[label]);
            let next = sorted[i + 1].0;
            if value == next {
                continue;
            }
            let n_left = i + 1;
            if n_left < min_leaf || sorted.len() - n_left < min_leaf {
                continue;
            }
            let right = Counts([parent.0[0] - left.0[0], parent.0[1] - left.0[1]]);
            let gain = parent_impurity - left.gini() * left.total() - right.gini() * right.total();
            if best.as_ref().map_or(true, |b| gain > b.gain) {
                let mid = value + (next - value) / 2.0;
                let threshold = if mid < next { mid } else { value };
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
        best
    }

    fn find_split(&self, samples: &[usize], parent: &Counts, rng: &mut StdRng) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);

        let mut visited = 0;
        let mut best: Option<SplitCandidate> = None;
        for feature in features {
            if visited >= self.params.max_features {
                break;
            }
            // constant features do not count towards max_features
            let Some(candidate) = self.best_split_on(samples, feature, parent) else {
                continue;
            };
            visited += 1;
            if best.as_ref().map_or(true, |b| candidate.gain > b.gain) {
                best = Some(candidate);
            }
        }
        best.filter(|b| b.gain > f64::EPSILON)
    }

    fn build(&mut self, samples: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let idx = self.nodes.len();
        let counts = self.counts(&samples);
        self.nodes.push(Node::Leaf {
            probabilities: counts.probabilities(),
        });

        let depth_reached = self.params.max_depth.map_or(false, |d| depth >= d);
        if counts.is_pure() || depth_reached || samples.len() < self.params.min_samples_split.max(2) {
            return idx;
        }
        let Some(split) = self.find_split(&samples, &counts, rng) else {
            return idx;
        };

        self.importances[split.feature] += split.gain;
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| self.rows[s][split.feature] <= split.threshold);
        let left = self.build(left, depth + 1, rng);
        let right = self.build(right, depth + 1, rng);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }
}

impl DecisionTree {
    /// Grow a tree over `samples` (indices into `rows`, duplicates allowed).
    /// Returns the tree and the weighted impurity decrease credited to each feature.
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        samples: Vec<usize>,
        class_weight: [f64; 2],
        params: TreeParams,
        rng: &mut StdRng,
    ) -> (DecisionTree, Vec<f64>) {
        let n_features = rows.first().map_or(0, Vec::len);
        let mut builder = Builder {
            rows,
            labels,
            class_weight,
            params,
            n_features,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        };
        builder.build(samples, 0, rng);
        (
            DecisionTree {
                nodes: builder.nodes,
            },
            builder.importances,
        )
    }

    pub fn predict_probabilities(&self, features: &[f64]) -> [f64; 2] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { probabilities } => return *probabilities,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}
