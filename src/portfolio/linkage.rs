//! # Hierarchical Clustering
//!
//! $$
//! d(A \cup B, K) = \min\{d(A,K),\, d(B,K)\} \quad \text{(single linkage)}
//! $$
//!
//! Agglomerative clustering into a binary linkage tree. Node ids follow the
//! usual dendrogram convention: leaves are `0..n`, the `k`-th merge is `n + k`.

use std::fmt::Display;
use std::str::FromStr;

use tracing::debug;

use crate::error::HrpError;
use crate::error::Result;
use super::distance::DistanceMatrix;

/// Inter-cluster distance rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkageMethod {
  /// Nearest pair of members.
  #[default]
  Single,
  /// Farthest pair of members.
  Complete,
  /// Mean pairwise distance (UPGMA).
  Average,
}

impl LinkageMethod {
  /// Lance-Williams update for the distance from the merged cluster to `k`.
  fn update(self, d_ik: f64, d_jk: f64, size_i: usize, size_j: usize) -> f64 {
    match self {
      Self::Single => d_ik.min(d_jk),
      Self::Complete => d_ik.max(d_jk),
      Self::Average => {
        (size_i as f64 * d_ik + size_j as f64 * d_jk) / (size_i + size_j) as f64
      }
    }
  }
}

impl FromStr for LinkageMethod {
  type Err = HrpError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_lowercase().as_str() {
      "single" => Ok(Self::Single),
      "complete" => Ok(Self::Complete),
      "average" | "upgma" => Ok(Self::Average),
      other => Err(HrpError::validation(format!("unknown linkage method `{other}`"))),
    }
  }
}

impl Display for LinkageMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      LinkageMethod::Single => write!(f, "single"),
      LinkageMethod::Complete => write!(f, "complete"),
      LinkageMethod::Average => write!(f, "average"),
    }
  }
}

/// One agglomeration step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Merge {
  /// Node id recorded first; its leaves come first in leaf order.
  pub left: usize,
  /// Node id of the other child.
  pub right: usize,
  /// Linkage distance at which the two children were joined.
  pub distance: f64,
  /// Number of leaves under the new node.
  pub size: usize,
}

/// Immutable binary dendrogram over `n_leaves` assets.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkageTree {
  n_leaves: usize,
  merges: Vec<Merge>,
}

impl LinkageTree {
  pub fn n_leaves(&self) -> usize {
    self.n_leaves
  }

  pub fn merges(&self) -> &[Merge] {
    &self.merges
  }

  /// Id of the root node; the lone leaf for a single-asset tree.
  pub fn root(&self) -> usize {
    if self.merges.is_empty() {
      0
    } else {
      self.n_leaves + self.merges.len() - 1
    }
  }

  pub fn is_leaf(&self, node: usize) -> bool {
    node < self.n_leaves
  }

  /// `(left, right)` children of an internal node.
  pub fn children(&self, node: usize) -> Option<(usize, usize)> {
    node
      .checked_sub(self.n_leaves)
      .and_then(|k| self.merges.get(k))
      .map(|m| (m.left, m.right))
  }

  /// Number of leaves under `node`.
  pub fn size(&self, node: usize) -> usize {
    match node.checked_sub(self.n_leaves) {
      None => 1,
      Some(k) => self.merges.get(k).map_or(0, |m| m.size),
    }
  }

  /// Leaves under `node`, left subtree first.
  pub fn leaves_of(&self, node: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(self.size(node));
    self.collect_leaves(node, &mut out);
    out
  }

  /// Leaf order of the whole tree.
  pub fn leaf_order(&self) -> Vec<usize> {
    if self.n_leaves == 0 {
      return Vec::new();
    }
    self.leaves_of(self.root())
  }

  fn collect_leaves(&self, node: usize, out: &mut Vec<usize>) {
    match self.children(node) {
      None => {
        if self.is_leaf(node) {
          out.push(node);
        }
      }
      Some((left, right)) => {
        self.collect_leaves(left, out);
        self.collect_leaves(right, out);
      }
    }
  }
}

/// Agglomerative clustering over a distance matrix.
///
/// Ties go to the pair whose lowest member indices are lexicographically
/// smallest, so identical inputs always produce identical trees.
pub fn cluster(dist: &DistanceMatrix, method: LinkageMethod) -> Result<LinkageTree> {
  let n = dist.len();
  if n == 0 {
    return Err(HrpError::validation("cannot cluster an empty distance matrix"));
  }

  let mut merges = Vec::with_capacity(n - 1);
  let mut active = vec![true; n];
  let mut d = dist.values().clone();
  // Slot `i` always holds the cluster whose smallest leaf is `i`.
  let mut node_id: Vec<usize> = (0..n).collect();
  let mut size = vec![1usize; n];

  for step in 0..(n - 1) {
    let mut min_d = f64::INFINITY;
    let mut mi = usize::MAX;
    let mut mj = usize::MAX;

    for i in 0..n {
      if !active[i] {
        continue;
      }
      for j in (i + 1)..n {
        if active[j] && d[[i, j]] < min_d {
          min_d = d[[i, j]];
          mi = i;
          mj = j;
        }
      }
    }

    if mi == usize::MAX {
      return Err(HrpError::validation("no finite distance left to merge"));
    }

    merges.push(Merge {
      left: node_id[mi],
      right: node_id[mj],
      distance: min_d,
      size: size[mi] + size[mj],
    });

    for k in 0..n {
      if !active[k] || k == mi || k == mj {
        continue;
      }
      let updated = method.update(d[[mi, k]], d[[mj, k]], size[mi], size[mj]);
      d[[mi, k]] = updated;
      d[[k, mi]] = updated;
    }

    node_id[mi] = n + step;
    size[mi] += size[mj];
    active[mj] = false;
  }

  debug!(leaves = n, merges = merges.len(), %method, "built linkage tree");

  Ok(LinkageTree { n_leaves: n, merges })
}
