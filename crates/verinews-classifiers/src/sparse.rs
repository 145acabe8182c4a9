//! Sparse feature vectors and matrices
//!
//! TF-IDF rows are overwhelmingly zero, so features are stored as sorted
//! `(index, value)` pairs. Rows of a training set are packed into a CSR
//! matrix.

use serde::{Deserialize, Serialize};

/// Borrowed view of one sparse row
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    pub indices: &'a [usize],
    pub values: &'a [f64],
}

impl<'a> SparseRow<'a> {
    /// Iterate over the non-zero entries
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Dot product with a dense vector; indices past its end contribute zero
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.iter()
            .filter_map(|(i, v)| dense.get(i).map(|w| w * v))
            .sum()
    }

    /// Value at a feature index
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Largest stored index plus one, or zero for an empty row
    pub fn min_dim(&self) -> usize {
        self.indices.last().map_or(0, |i| i + 1)
    }
}

/// Owned sparse vector with a fixed dimensionality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// The zero vector
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs.
    ///
    /// Pairs are sorted by index, duplicates are summed, explicit zeros and
    /// out-of-range indices are dropped.
    pub fn from_pairs(dim: usize, mut pairs: Vec<(usize, f64)>) -> Self {
        pairs.sort_by_key(|(i, _)| *i);

        let mut indices: Vec<usize> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (i, v) in pairs {
            if i >= dim {
                continue;
            }
            if indices.last() == Some(&i) {
                if let Some(last) = values.last_mut() {
                    *last += v;
                }
            } else {
                indices.push(i);
                values.push(v);
            }
        }

        let mut vector = Self {
            dim,
            indices,
            values,
        };
        vector.drop_zeros();
        vector
    }

    fn drop_zeros(&mut self) {
        if self.values.iter().all(|v| *v != 0.0) {
            return;
        }
        let (indices, values): (Vec<usize>, Vec<f64>) = self
            .indices
            .iter()
            .zip(&self.values)
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, v)| (*i, *v))
            .unzip();
        self.indices = indices;
        self.values = values;
    }

    /// Dimensionality, which equals the vocabulary size it was built against
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn as_row(&self) -> SparseRow<'_> {
        SparseRow {
            indices: &self.indices,
            values: &self.values,
        }
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Divide by the Euclidean norm; the zero vector is left as is
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    /// Expand to a dense vector
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (i, v) in self.as_row().iter() {
            dense[i] = v;
        }
        dense
    }
}

/// Compressed sparse row matrix
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// An empty matrix with a fixed column count
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            indptr: vec![0],
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Stack sparse vectors as rows
    pub fn from_rows(n_cols: usize, rows: &[SparseVector]) -> Self {
        let mut matrix = Self::new(n_cols);
        for row in rows {
            matrix.push_row(row.as_row());
        }
        matrix
    }

    /// Append a row; entries at or past `n_cols` are ignored
    pub fn push_row(&mut self, row: SparseRow<'_>) {
        for (i, v) in row.iter() {
            if i < self.n_cols {
                self.indices.push(i);
                self.values.push(v);
            }
        }
        self.indptr.push(self.indices.len());
    }

    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Borrow a row
    pub fn row(&self, i: usize) -> SparseRow<'_> {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        SparseRow {
            indices: &self.indices[start..end],
            values: &self.values[start..end],
        }
    }

    /// Iterate over all rows in order
    pub fn rows(&self) -> impl Iterator<Item = SparseRow<'_>> {
        (0..self.n_rows()).map(move |i| self.row(i))
    }

    /// Copy out a subset of rows in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut matrix = Self::new(self.n_cols);
        for &i in rows {
            matrix.push_row(self.row(i));
        }
        matrix
    }

    /// Owned copy of a row
    pub fn row_vector(&self, i: usize) -> SparseVector {
        let row = self.row(i);
        SparseVector {
            dim: self.n_cols,
            indices: row.indices.to_vec(),
            values: row.values.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_sorts_and_merges() {
        let v = SparseVector::from_pairs(5, vec![(3, 1.0), (1, 2.0), (3, 0.5), (9, 4.0), (2, 0.0)]);
        assert_eq!(v.dim(), 5);
        assert_eq!(v.indices(), &[1, 3]);
        assert_eq!(v.values(), &[2.0, 1.5]);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = SparseVector::from_pairs(4, vec![(0, 3.0), (2, 4.0)]);
        v.l2_normalize();
        assert!((v.norm() - 1.0).abs() < 1e-12);
        assert_eq!(v.to_dense(), vec![0.6, 0.0, 0.8, 0.0]);

        let mut zero = SparseVector::zeros(4);
        zero.l2_normalize();
        assert_eq!(zero.nnz(), 0);
    }

    #[test]
    fn test_row_dot_and_get() {
        let v = SparseVector::from_pairs(4, vec![(1, 2.0), (3, -1.0)]);
        let row = v.as_row();
        assert_eq!(row.dot(&[1.0, 1.0, 1.0, 1.0]), 1.0);
        assert_eq!(row.get(1), 2.0);
        assert_eq!(row.get(2), 0.0);
        assert_eq!(row.min_dim(), 4);
    }

    #[test]
    fn test_csr_select_rows() {
        let rows = vec![
            SparseVector::from_pairs(3, vec![(0, 1.0), (2, 2.0)]),
            SparseVector::zeros(3),
            SparseVector::from_pairs(3, vec![(2, 3.0)]),
        ];
        let m = CsrMatrix::from_rows(3, &rows);
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.row_vector(2), rows[2]);

        let subset = m.select_rows(&[2, 0]);
        assert_eq!(subset.row_vector(0), rows[2]);
        assert_eq!(subset.row_vector(1), rows[0]);
        assert_eq!(m.rows().map(|r| r.nnz()).collect::<Vec<_>>(), vec![2, 0, 1]);
    }
}
