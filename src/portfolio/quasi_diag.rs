//! # Quasi-Diagonalization
//!
//! $$
//! \Sigma^{\pi} = P_\pi\,\Sigma\,P_\pi^\top
//! $$
//!
//! Leaf order of the linkage tree; permuting the covariance by it pushes
//! large covariances towards the diagonal.

use ndarray::Array2;
use ndarray::Axis;

use super::linkage::LinkageTree;

/// Permutation of asset indices in dendrogram leaf order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetOrdering(Vec<usize>);

impl AssetOrdering {
  pub fn indices(&self) -> &[usize] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Asset labels in this order. Indices past the end of `assets` are skipped.
  pub fn labels<'a>(&self, assets: &'a [String]) -> Vec<&'a str> {
    self
      .0
      .iter()
      .filter_map(|&i| assets.get(i).map(String::as_str))
      .collect()
  }
}

/// Leaf-order traversal, left child before right child at every merge.
pub fn quasi_diagonalize(tree: &LinkageTree) -> AssetOrdering {
  AssetOrdering(tree.leaf_order())
}

/// Rows and columns of `matrix` permuted by `ordering`.
pub fn seriate(matrix: &Array2<f64>, ordering: &AssetOrdering) -> Array2<f64> {
  matrix
    .select(Axis(0), ordering.indices())
    .select(Axis(1), ordering.indices())
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use crate::portfolio::distance::DistanceMatrix;
  use crate::portfolio::linkage::LinkageMethod;
  use crate::portfolio::linkage::cluster;
  use super::*;

  #[test]
  fn ordering_places_correlated_assets_together() {
    // 0 and 2 move together, 1 and 3 move together.
    let corr = array![
      [1.0, 0.1, 0.9, 0.0],
      [0.1, 1.0, 0.2, 0.8],
      [0.9, 0.2, 1.0, 0.1],
      [0.0, 0.8, 0.1, 1.0],
    ];
    let d = DistanceMatrix::from_correlation(&corr).unwrap();
    let ordering = quasi_diagonalize(&cluster(&d, LinkageMethod::Single).unwrap());

    assert_eq!(ordering.indices(), &[0, 2, 1, 3]);

    let s = seriate(&corr, &ordering);
    assert_eq!(s[[0, 1]], 0.9);
    assert_eq!(s[[2, 3]], 0.8);

    let names: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
    assert_eq!(ordering.labels(&names), vec!["A", "C", "B", "D"]);
  }

  #[test]
  fn labels_skip_indices_without_a_name() {
    let ordering = AssetOrdering(vec![2, 0, 1]);
    let names = vec!["A".to_string(), "B".to_string()];

    assert_eq!(ordering.labels(&names), vec!["A", "B"]);
    assert!(ordering.labels(&[]).is_empty());
  }
}
