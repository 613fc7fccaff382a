//! # Recursive Bisection
//!
//! $$
//! \alpha = 1 - \frac{V_L}{V_L + V_R}, \qquad
//! V_C = \tilde{\mathbf w}_C^\top \Sigma_C \tilde{\mathbf w}_C,\ \ \tilde w_i \propto \Sigma_{ii}^{-1}
//! $$
//!
//! Top-down split of capital between the two halves of the quasi-diagonal
//! order, in inverse proportion to each half's inverse-variance risk.

use std::fmt::Display;
use std::str::FromStr;

use ndarray::Array1;
use ndarray::Array2;

use crate::error::HrpError;
use crate::error::Result;
use super::linkage::LinkageTree;
use super::quasi_diag::AssetOrdering;
use super::types::CovarianceMatrix;
use super::types::WeightVector;

/// Slices shorter than this are bisected on the calling thread.
const PARALLEL_MIN_LEN: usize = 64;

/// Where each slice is cut in two.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BisectionSplit {
  /// Left half is the first `ceil(len / 2)` assets of the slice.
  #[default]
  Positional,
  /// Cut at the linkage tree's own children (possibly unbalanced).
  Topological,
}

impl FromStr for BisectionSplit {
  type Err = HrpError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_lowercase().as_str() {
      "positional" | "half" => Ok(Self::Positional),
      "topological" | "tree" => Ok(Self::Topological),
      other => Err(HrpError::validation(format!("unknown bisection split `{other}`"))),
    }
  }
}

impl Display for BisectionSplit {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      BisectionSplit::Positional => write!(f, "positional"),
      BisectionSplit::Topological => write!(f, "topological"),
    }
  }
}

/// Fails with [`HrpError::DataQuality`] on any non-positive variance.
pub fn ensure_positive_variances(cov: &CovarianceMatrix) -> Result<()> {
  match (0..cov.len()).find(|&i| !(cov.variance(i) > 0.0)) {
    Some(i) => Err(HrpError::data_quality(format!(
      "asset `{}` has non-positive variance {}",
      cov.assets()[i],
      cov.variance(i)
    ))),
    None => Ok(()),
  }
}

/// Variance of the inverse-variance portfolio over `members`.
pub fn cluster_variance(cov: &Array2<f64>, members: &[usize]) -> f64 {
  match members {
    [] => 0.0,
    [i] => cov[[*i, *i]],
    _ => {
      let inv: Array1<f64> = members.iter().map(|&i| 1.0 / cov[[i, i]]).collect();
      let ivp = &inv / inv.sum();

      let mut var = 0.0;
      for (a, &i) in members.iter().enumerate() {
        for (b, &j) in members.iter().enumerate() {
          var += ivp[a] * ivp[b] * cov[[i, j]];
        }
      }
      var
    }
  }
}

fn split_factor(var_left: f64, var_right: f64) -> f64 {
  let denom = var_left + var_right;
  if denom > 1e-30 {
    1.0 - var_left / denom
  } else {
    0.5
  }
}

fn scale_halves(
  cov: &Array2<f64>,
  left: &[usize],
  right: &[usize],
  w_left: &mut [f64],
  w_right: &mut [f64],
) {
  let alpha = split_factor(cluster_variance(cov, left), cluster_variance(cov, right));
  w_left.iter_mut().for_each(|w| *w *= alpha);
  w_right.iter_mut().for_each(|w| *w *= 1.0 - alpha);
}

fn bisect_positional(order: &[usize], weights: &mut [f64], cov: &Array2<f64>, parallel: bool) {
  if order.len() <= 1 {
    return;
  }

  let mid = order.len().div_ceil(2);
  let (left, right) = order.split_at(mid);
  let (w_left, w_right) = weights.split_at_mut(mid);
  scale_halves(cov, left, right, w_left, w_right);

  if parallel && order.len() >= PARALLEL_MIN_LEN {
    rayon::join(
      || bisect_positional(left, w_left, cov, parallel),
      || bisect_positional(right, w_right, cov, parallel),
    );
  } else {
    bisect_positional(left, w_left, cov, parallel);
    bisect_positional(right, w_right, cov, parallel);
  }
}

fn bisect_topological(
  tree: &LinkageTree,
  node: usize,
  order: &[usize],
  weights: &mut [f64],
  cov: &Array2<f64>,
  parallel: bool,
) {
  let Some((l, r)) = tree.children(node) else {
    return;
  };

  // The left child's leaves are a prefix of this node's leaf order.
  let mid = tree.size(l);
  let (left, right) = order.split_at(mid);
  let (w_left, w_right) = weights.split_at_mut(mid);
  scale_halves(cov, left, right, w_left, w_right);

  if parallel && order.len() >= PARALLEL_MIN_LEN {
    rayon::join(
      || bisect_topological(tree, l, left, w_left, cov, parallel),
      || bisect_topological(tree, r, right, w_right, cov, parallel),
    );
  } else {
    bisect_topological(tree, l, left, w_left, cov, parallel);
    bisect_topological(tree, r, right, w_right, cov, parallel);
  }
}

/// HRP weights for `cov` given the quasi-diagonal `ordering` of `tree`.
///
/// Weights are returned in the covariance matrix's asset order and
/// renormalized to sum to one.
pub fn recursive_bisection(
  tree: &LinkageTree,
  ordering: &AssetOrdering,
  cov: &CovarianceMatrix,
  split: BisectionSplit,
  parallel: bool,
) -> Result<WeightVector> {
  let n = cov.len();
  if ordering.len() != n || tree.n_leaves() != n {
    return Err(HrpError::validation(format!(
      "ordering covers {} assets and tree {}, covariance has {n}",
      ordering.len(),
      tree.n_leaves()
    )));
  }
  ensure_positive_variances(cov)?;

  let order = ordering.indices();
  let mut by_position = vec![1.0; n];
  match split {
    BisectionSplit::Positional => {
      bisect_positional(order, &mut by_position, cov.values(), parallel)
    }
    BisectionSplit::Topological if order != tree.leaf_order().as_slice() => {
      return Err(HrpError::validation(
        "topological split needs the tree's own leaf order",
      ));
    }
    BisectionSplit::Topological => bisect_topological(
      tree,
      tree.root(),
      order,
      &mut by_position,
      cov.values(),
      parallel,
    ),
  }

  let mut weights = Array1::zeros(n);
  for (&asset, &w) in order.iter().zip(by_position.iter()) {
    weights[asset] = w;
  }

  let total = weights.sum();
  if !(total > 1e-15) {
    return Err(HrpError::data_quality("recursive bisection produced zero total weight"));
  }
  weights /= total;

  WeightVector::new(cov.assets().to_vec(), weights)
}
