use std::ops::Index;

use num_complex::Complex64;
use serde::Serialize;

use crate::error::{MjlogError, Result};

/// Dense row-major matrix. Built once, read many times: there is no mutable
/// access to the cells after construction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// N×K complex MJLOG matrix.
pub type CouplingMatrix = Matrix<Complex64>;

/// N×K phase angles in radians.
pub type PhaseMatrix = Matrix<f64>;

impl<T> Matrix<T> {
    /// Build from a generator called once per cell in row-major order.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Build from nested rows. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let n = rows.len();
        let k = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n * k);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != k {
                return Err(MjlogError::invalid_at(
                    "rows",
                    i,
                    format!("length must equal the first row's ({} != {k})", row.len()),
                ));
            }
            data.extend(row);
        }
        Ok(Self { rows: n, cols: k, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        if i < self.rows && j < self.cols {
            self.data.get(i * self.cols + j)
        } else {
            None
        }
    }

    /// Row `i` as a contiguous slice.
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterate over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// All cells in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Cell-wise transform into a new matrix of the same shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Nested-row copy, for callers that want plain vectors.
    pub fn to_rows(&self) -> Vec<Vec<T>>
    where
        T: Clone,
    {
        self.iter_rows().map(<[T]>::to_vec).collect()
    }
}

impl PhaseMatrix {
    /// All-zero phase of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |_, _| 0.0)
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[i * self.cols + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_row_major() {
        let m = Matrix::from_fn(2, 3, |i, j| i * 10 + j);
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(m[(1, 2)], 12);
        assert_eq!(m.row(1), &[10, 11, 12]);
    }

    #[test]
    fn test_from_rows_ragged_rejected() {
        let err = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(err.to_string().contains("rows[1]"), "{err}");
    }

    #[test]
    fn test_from_rows_empty() {
        let m: Matrix<f64> = Matrix::from_rows(Vec::new()).unwrap();
        assert_eq!(m.shape(), (0, 0));
        assert!(m.is_empty());
    }

    #[test]
    fn test_get_out_of_bounds() {
        let m = PhaseMatrix::zeros(2, 2);
        assert_eq!(m.get(1, 1), Some(&0.0));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.get(0, 2), None);
    }

    #[test]
    fn test_map_and_to_rows() {
        let m = Matrix::from_fn(2, 2, |i, j| (i + j) as f64);
        let doubled = m.map(|v| v * 2.0);
        assert_eq!(doubled.to_rows(), vec![vec![0.0, 2.0], vec![2.0, 4.0]]);
    }

    #[test]
    fn test_serialize_complex_as_pairs() {
        let m = Matrix::from_fn(1, 2, |_, j| Complex64::new(j as f64, -1.0));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["rows"], 1);
        assert_eq!(json["cols"], 2);
        assert_eq!(json["data"][1], serde_json::json!([1.0, -1.0]));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_index_panics_out_of_bounds() {
        let m = PhaseMatrix::zeros(1, 1);
        let _ = m[(0, 1)];
    }
}
