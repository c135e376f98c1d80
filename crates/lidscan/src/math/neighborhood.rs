//! KD-tree k-nearest-neighbor search.
//!
//! ## Purpose
//!
//! This module provides the default [`NeighborSearch`] collaborator: a
//! KD-tree over the full point set that answers, for every point, the
//! indices and distances of its k nearest neighbors (the point itself
//! excluded).
//!
//! ## Design notes
//!
//! * **Eytzinger Layout**: Cache-optimal array layout (left-complete binary tree).
//! * **Median Splitting**: Balanced tree construction via `select_nth_unstable`.
//! * **Recursive Parallelism**: Uses `rayon::join` at the top levels of the build.
//! * **Unsafe Access**: Uses raw pointers for concurrent writes to disjoint array indices.
//! * **Query Fan-out**: All-points search parallelizes across queries with `rayon`.
//!
//! ## Key concepts
//!
//! * **NeighborTable**: Flat per-point neighbor indices and distances for one pass.
//! * **Bounded Heap**: Max-heap of size k with split-plane pruning on squared distance.
//!
//! ## Invariants
//!
//! * Parallel construction produces an identical tree to sequential construction.
//! * Neighbor lists are sorted closest-first and never contain the query index.
//! * Thread safety during the build is guaranteed by disjoint index access patterns.
//!
//! ## Non-goals
//!
//! * This module does not support dynamic updates; the tree is rebuilt per pass.
//! * This module does not implement alternative metrics; distance is Euclidean.

// Feature-gated imports
#[cfg(feature = "cpu")]
use rayon::join;
#[cfg(feature = "cpu")]
use rayon::prelude::*;

// External dependencies
use num_traits::Float;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

// Internal dependencies
use crate::primitives::errors::ScanError;

// ============================================================================
// Collaborator Contract
// ============================================================================

/// Contract for the k-nearest-neighbor collaborator.
///
/// Given N points and a neighborhood size k with `1 <= k <= N-1`, an
/// implementation returns for every point an ordered list of k neighbor
/// indices (closest first) and their distances, or [`ScanError::InvalidK`]
/// when k is out of range.
pub trait NeighborSearch<T: Float>: Send + Sync {
    /// Find the k nearest neighbors of every point in the set.
    fn search(&self, points: &[T], dims: usize, k: usize) -> Result<NeighborTable<T>, ScanError>;
}

/// Per-point neighbor indices and distances for a single pass.
///
/// Stored flat (N rows of k entries); rebuilt every pass and never retained
/// across passes.
#[derive(Debug, Clone)]
pub struct NeighborTable<T> {
    k: usize,
    indices: Vec<usize>,
    distances: Vec<T>,
}

impl<T: Float> NeighborTable<T> {
    /// Assemble a table from flat row-major buffers of N x k entries.
    pub fn from_flat(k: usize, indices: Vec<usize>, distances: Vec<T>) -> Self {
        debug_assert_eq!(indices.len(), distances.len());
        debug_assert!(k > 0 && indices.len() % k == 0);
        Self {
            k,
            indices,
            distances,
        }
    }

    /// Number of points covered by the table.
    pub fn n(&self) -> usize {
        self.indices.len() / self.k
    }

    /// Neighborhood size of the table.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Neighbor indices of point `i`, closest first.
    pub fn indices_of(&self, i: usize) -> &[usize] {
        &self.indices[i * self.k..(i + 1) * self.k]
    }

    /// Neighbor distances of point `i`, closest first.
    pub fn distances_of(&self, i: usize) -> &[T] {
        &self.distances[i * self.k..(i + 1) * self.k]
    }
}

// ============================================================================
// KD-Tree
// ============================================================================

/// One tree node: the original index of the point stored at this slot.
#[derive(Debug, Clone, Copy, Default)]
struct KdNode {
    index: usize,
}

/// KD-tree with Eytzinger (left-complete) array layout.
///
/// Node v (1-based) has children 2v and 2v+1; point coordinates are copied
/// into a permuted buffer so the search walks memory in layout order.
#[derive(Debug)]
pub struct KdTree<T> {
    nodes: Vec<KdNode>,
    permuted: Vec<T>,
    dims: usize,
}

/// Subtree sizes above this trigger a parallel `rayon::join` build step.
#[cfg(feature = "cpu")]
const PARALLEL_BUILD_THRESHOLD: usize = 1024;

impl<T: Float + Send + Sync> KdTree<T> {
    /// Build a tree over `points` (flat row-major, `dims` coordinates each).
    pub fn build(points: &[T], dims: usize) -> Self {
        let n = points.len() / dims;
        let mut nodes = vec![KdNode::default(); n];
        let mut permuted = vec![T::zero(); points.len()];
        let mut order: Vec<usize> = (0..n).collect();

        if n > 0 {
            // SAFETY: raw pointers allow concurrent writes to the node and
            // permuted-point arrays. The Eytzinger layout assigns slots 2v
            // and 2v+1 to disjoint recursion paths, so no two branches ever
            // write the same index.
            let nodes_ptr = nodes.as_mut_ptr() as usize;
            let permuted_ptr = permuted.as_mut_ptr() as usize;
            build_recursive(points, &mut order, dims, nodes_ptr, permuted_ptr, 0, 1);
        }

        Self {
            nodes,
            permuted,
            dims,
        }
    }

    /// Number of points in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Size of the left subtree of a left-complete binary tree with n nodes.
    fn left_subtree_size(n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        // Full levels hold m - 1 nodes; the remainder spills left-to-right
        // into the last level, whose left half has capacity m / 2.
        let m = 1usize << (usize::BITS - 1 - n.leading_zeros());
        let last = n - (m - 1);
        (m / 2 - 1) + last.min(m / 2)
    }

    /// Find the k nearest neighbors of `query`, excluding `exclude` itself.
    ///
    /// Results are written closest-first into `out_indices`/`out_distances`
    /// (cleared first). Distances are Euclidean.
    pub fn k_nearest(
        &self,
        query: &[T],
        exclude: usize,
        k: usize,
        out_indices: &mut Vec<usize>,
        out_distances: &mut Vec<T>,
    ) {
        out_indices.clear();
        out_distances.clear();
        if self.nodes.is_empty() || k == 0 {
            return;
        }

        let mut heap: BinaryHeap<HeapEntry<T>> = BinaryHeap::with_capacity(k + 1);
        self.search_recursive(query, exclude, k, 1, 0, &mut heap);

        // Max-heap drains into ascending distance order.
        for entry in heap.into_sorted_vec() {
            out_indices.push(entry.index);
            out_distances.push(entry.dist_sq.sqrt());
        }
    }

    fn search_recursive(
        &self,
        query: &[T],
        exclude: usize,
        k: usize,
        v: usize,
        depth: usize,
        heap: &mut BinaryHeap<HeapEntry<T>>,
    ) {
        if v > self.nodes.len() {
            return;
        }

        let offset = (v - 1) * self.dims;
        let node_point = &self.permuted[offset..offset + self.dims];
        let node_index = self.nodes[v - 1].index;

        if node_index != exclude {
            let dist_sq = squared_euclidean(query, node_point);
            if heap.len() < k {
                heap.push(HeapEntry {
                    dist_sq,
                    index: node_index,
                });
            } else if let Some(worst) = heap.peek() {
                if dist_sq < worst.dist_sq {
                    heap.pop();
                    heap.push(HeapEntry {
                        dist_sq,
                        index: node_index,
                    });
                }
            }
        }

        let axis = depth % self.dims;
        let diff = query[axis] - node_point[axis];
        let (near, far) = if diff < T::zero() {
            (2 * v, 2 * v + 1)
        } else {
            (2 * v + 1, 2 * v)
        };

        self.search_recursive(query, exclude, k, near, depth + 1, heap);

        // Only cross the split plane when the far side could still improve
        // the current worst distance.
        let plane_sq = diff * diff;
        let must_cross = match heap.peek() {
            Some(worst) => heap.len() < k || plane_sq < worst.dist_sq,
            None => true,
        };
        if must_cross {
            self.search_recursive(query, exclude, k, far, depth + 1, heap);
        }
    }
}

/// Candidate neighbor ordered by squared distance (max-heap).
struct HeapEntry<T> {
    dist_sq: T,
    index: usize,
}

impl<T: Float> PartialEq for HeapEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dist_sq == other.dist_sq && self.index == other.index
    }
}

impl<T: Float> Eq for HeapEntry<T> {}

impl<T: Float> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Float> Ord for HeapEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .partial_cmp(&other.dist_sq)
            .unwrap_or(Ordering::Equal)
            // Deterministic order for equal distances.
            .then_with(|| self.index.cmp(&other.index))
    }
}

fn squared_euclidean<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + (x - y) * (x - y))
}

// ============================================================================
// Recursive Build
// ============================================================================

fn build_recursive<T: Float + Send + Sync>(
    points: &[T],
    order: &mut [usize],
    dims: usize,
    nodes_ptr: usize,
    permuted_ptr: usize,
    depth: usize,
    v: usize,
) {
    let n = order.len();
    if n == 0 {
        return;
    }

    let axis = depth % dims;
    let mid = KdTree::<T>::left_subtree_size(n);

    // Partition around the median for this axis
    order.select_nth_unstable_by(mid, |&a, &b| {
        let val_a = points[a * dims + axis];
        let val_b = points[b * dims + axis];
        val_a.partial_cmp(&val_b).unwrap_or(Ordering::Equal)
    });

    // SAFETY: v is unique for each recursive call path.
    unsafe {
        let node_ref = &mut *(nodes_ptr as *mut KdNode).add(v - 1);
        node_ref.index = order[mid];

        // Copy point data to the permuted buffer for cache locality
        let dest = (permuted_ptr as *mut T).add((v - 1) * dims);
        let src = points.as_ptr().add(order[mid] * dims);
        std::ptr::copy_nonoverlapping(src, dest, dims);
    }

    let (left, right_with_mid) = order.split_at_mut(mid);
    let right = &mut right_with_mid[1..];

    #[cfg(feature = "cpu")]
    if n > PARALLEL_BUILD_THRESHOLD {
        join(
            || build_recursive(points, left, dims, nodes_ptr, permuted_ptr, depth + 1, 2 * v),
            || {
                build_recursive(
                    points,
                    right,
                    dims,
                    nodes_ptr,
                    permuted_ptr,
                    depth + 1,
                    2 * v + 1,
                )
            },
        );
        return;
    }

    build_recursive(points, left, dims, nodes_ptr, permuted_ptr, depth + 1, 2 * v);
    build_recursive(
        points,
        right,
        dims,
        nodes_ptr,
        permuted_ptr,
        depth + 1,
        2 * v + 1,
    );
}

// ============================================================================
// Default NeighborSearch Implementation
// ============================================================================

/// KD-tree backed all-points neighbor search.
#[derive(Debug, Clone, Copy, Default)]
pub struct KdTreeSearch;

impl KdTreeSearch {
    /// Create the default KD-tree search.
    pub fn new() -> Self {
        Self
    }
}

impl<T: Float + Send + Sync> NeighborSearch<T> for KdTreeSearch {
    fn search(&self, points: &[T], dims: usize, k: usize) -> Result<NeighborTable<T>, ScanError> {
        let n = points.len() / dims;
        if k < 1 || k >= n {
            return Err(ScanError::InvalidK { k, n });
        }

        let tree = KdTree::build(points, dims);

        #[cfg(feature = "cpu")]
        let rows: Vec<(Vec<usize>, Vec<T>)> = (0..n)
            .into_par_iter()
            .map_init(
                || (Vec::with_capacity(k), Vec::with_capacity(k)),
                |(idx_buf, dist_buf), i| {
                    let query = &points[i * dims..(i + 1) * dims];
                    tree.k_nearest(query, i, k, idx_buf, dist_buf);
                    (idx_buf.clone(), dist_buf.clone())
                },
            )
            .collect();

        #[cfg(not(feature = "cpu"))]
        let rows: Vec<(Vec<usize>, Vec<T>)> = {
            let mut idx_buf = Vec::with_capacity(k);
            let mut dist_buf = Vec::with_capacity(k);
            (0..n)
                .map(|i| {
                    let query = &points[i * dims..(i + 1) * dims];
                    tree.k_nearest(query, i, k, &mut idx_buf, &mut dist_buf);
                    (idx_buf.clone(), dist_buf.clone())
                })
                .collect()
        };

        // Flatten sequentially to preserve point order
        let mut indices = Vec::with_capacity(n * k);
        let mut distances = Vec::with_capacity(n * k);
        for (row_idx, row_dist) in rows {
            indices.extend_from_slice(&row_idx);
            distances.extend_from_slice(&row_dist);
        }

        Ok(NeighborTable::from_flat(k, indices, distances))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points() -> Vec<f64> {
        // 1D line embedded in 2D: x = 0..8, y = 0
        (0..8).flat_map(|i| [i as f64, 0.0]).collect()
    }

    #[test]
    fn left_subtree_sizes_are_left_complete() {
        assert_eq!(KdTree::<f64>::left_subtree_size(1), 0);
        assert_eq!(KdTree::<f64>::left_subtree_size(2), 1);
        assert_eq!(KdTree::<f64>::left_subtree_size(3), 1);
        assert_eq!(KdTree::<f64>::left_subtree_size(4), 2);
        assert_eq!(KdTree::<f64>::left_subtree_size(5), 3);
        assert_eq!(KdTree::<f64>::left_subtree_size(6), 3);
        assert_eq!(KdTree::<f64>::left_subtree_size(7), 3);
    }

    #[test]
    fn k_nearest_excludes_query_and_sorts() {
        let points = grid_points();
        let tree = KdTree::build(&points, 2);
        let mut idx = Vec::new();
        let mut dist = Vec::new();

        // Point 3 at x=3: nearest are 2 and 4 at distance 1, then 1 and 5.
        tree.k_nearest(&points[6..8], 3, 4, &mut idx, &mut dist);
        assert_eq!(idx.len(), 4);
        assert!(!idx.contains(&3));
        assert_eq!(dist[0], 1.0);
        assert_eq!(dist[1], 1.0);
        assert_eq!(dist[2], 2.0);
        assert_eq!(dist[3], 2.0);
        assert!(idx[..2].contains(&2) && idx[..2].contains(&4));
    }

    #[test]
    fn table_rows_match_brute_force() {
        let points: Vec<f64> = (0..20)
            .flat_map(|i| {
                let t = i as f64 * 0.37;
                [t.sin(), t.cos(), (t * 0.5).sin()]
            })
            .collect();
        let n = 20;
        let k = 5;

        let table = KdTreeSearch::new().search(&points, 3, k).unwrap();
        assert_eq!(table.n(), n);
        assert_eq!(table.k(), k);

        for i in 0..n {
            let mut brute: Vec<(f64, usize)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| {
                    let d = squared_euclidean(
                        &points[i * 3..i * 3 + 3],
                        &points[j * 3..j * 3 + 3],
                    );
                    (d.sqrt(), j)
                })
                .collect();
            brute.sort_by(|a, b| a.partial_cmp(b).unwrap());

            let dists = table.distances_of(i);
            for (rank, &(d, _)) in brute.iter().take(k).enumerate() {
                assert!((dists[rank] - d).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn rejects_out_of_range_k() {
        let points = grid_points();
        let err = NeighborSearch::<f64>::search(&KdTreeSearch, &points, 2, 0).unwrap_err();
        assert_eq!(err, ScanError::InvalidK { k: 0, n: 8 });
        let err = NeighborSearch::<f64>::search(&KdTreeSearch, &points, 2, 8).unwrap_err();
        assert_eq!(err, ScanError::InvalidK { k: 8, n: 8 });
    }
}
