//! Column-major storage for batches of spectra.
//!
//! [`SpectrumMatrix`] holds one spectrum per row and one frequency bin per
//! column in a flat column-major `Vec<f64>`: element `(row, col)` lives at
//! `row + col * nrows`. The layout matches nalgebra's, so conversion is a
//! straight copy. The `DMatrix` conversions are public API for batches that
//! arrive from, or go on to, linear-algebra code; `SpectralBatch` builds on
//! them for its nalgebra constructor and its mean spectrum.

use crate::error::{Result, SpectrumError};
use nalgebra::DMatrix;

/// Column-major matrix of spectral densities (rows = spectra, columns = bins).
///
/// ```
/// use wavepeak::matrix::SpectrumMatrix;
///
/// let mat = SpectrumMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
/// assert_eq!(mat.shape(), (2, 3));
/// assert_eq!(mat[(1, 0)], 4.0);
/// assert_eq!(mat.column(2), &[3.0, 6.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumMatrix {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

impl SpectrumMatrix {
    /// Create from flat column-major data.
    ///
    /// Fails with `InvalidDomain` if `data.len() != nrows * ncols`.
    pub fn from_column_major(data: Vec<f64>, nrows: usize, ncols: usize) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(SpectrumError::domain(format!(
                "matrix data has {} elements, expected {}x{}",
                data.len(),
                nrows,
                ncols
            )));
        }
        Ok(Self { data, nrows, ncols })
    }

    /// Create from one `Vec` per spectrum. All rows must have equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != ncols) {
            return Err(SpectrumError::domain(format!(
                "row {} has {} bins, expected {}",
                bad,
                rows[bad].len(),
                ncols
            )));
        }

        let mut data = vec![0.0; nrows * ncols];
        for (i, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                data[i + j * nrows] = v;
            }
        }
        Ok(Self { data, nrows, ncols })
    }

    /// Create a zero-filled matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![0.0; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Number of spectra.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of frequency bins.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Dimensions as `(nrows, ncols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Whether the matrix has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All spectra at one frequency bin (zero-copy).
    ///
    /// # Panics
    /// Panics if `col >= ncols`.
    #[inline]
    pub fn column(&self, col: usize) -> &[f64] {
        let start = col * self.nrows;
        &self.data[start..start + self.nrows]
    }

    /// Copy out one spectrum. O(ncols), rows are strided in column-major.
    pub fn row(&self, row: usize) -> Vec<f64> {
        (0..self.ncols)
            .map(|j| self.data[row + j * self.nrows])
            .collect()
    }

    /// Flat column-major data (zero-copy).
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Convert to a nalgebra `DMatrix<f64>`.
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_column_slice(self.nrows, self.ncols, &self.data)
    }

    /// Create from a nalgebra `DMatrix<f64>`.
    pub fn from_dmatrix(mat: &DMatrix<f64>) -> Self {
        let (nrows, ncols) = mat.shape();
        Self {
            data: mat.as_slice().to_vec(),
            nrows,
            ncols,
        }
    }
}

impl std::ops::Index<(usize, usize)> for SpectrumMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        debug_assert!(
            row < self.nrows && col < self.ncols,
            "SpectrumMatrix index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols
        );
        &self.data[row + col * self.nrows]
    }
}

impl std::ops::IndexMut<(usize, usize)> for SpectrumMatrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        debug_assert!(
            row < self.nrows && col < self.ncols,
            "SpectrumMatrix index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols
        );
        &mut self.data[row + col * self.nrows]
    }
}

impl std::fmt::Display for SpectrumMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SpectrumMatrix({} spectra x {} bins)", self.nrows, self.ncols)
    }
}
