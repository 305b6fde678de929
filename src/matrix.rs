use std::{
    fmt::{Display, Write},
    ops::{Index, IndexMut},
    slice::Chunks,
};

use smallvec::SmallVec;
use tracing::debug;

use crate::domains::integer::Integer;

/// A dense, row-major integer matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matrix {
    pub shape: (u32, u32),
    pub data: SmallVec<[Integer; 16]>,
}

impl Matrix {
    pub fn new(rows: u32, cols: u32) -> Matrix {
        Matrix {
            shape: (rows, cols),
            data: (0..rows as usize * cols as usize)
                .map(|_| Integer::zero())
                .collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.shape.0 as usize
    }

    pub fn cols(&self) -> usize {
        self.shape.1 as usize
    }

    pub fn row_iter(&self) -> Chunks<'_, Integer> {
        self.data.chunks(self.shape.1 as usize)
    }

    fn swap_rows(&mut self, r1: u32, r2: u32) {
        let cols = self.shape.1 as usize;
        for c in 0..cols {
            self.data
                .swap(r1 as usize * cols + c, r2 as usize * cols + c);
        }
    }

    /// Bring the matrix into row echelon form without leaving the integers.
    ///
    /// Instead of dividing by the pivot, the pivot row and the target row are
    /// both rescaled by the least common multiple of their pivot-column
    /// entries so that adding them cancels the column exactly. A pivot column
    /// with no usable entry is skipped; it is the caller's job to decide
    /// whether the resulting shape is solvable.
    pub fn row_reduce(&mut self) {
        let (nrows, ncols) = self.shape;

        let mut i = 0;
        while i + 1 < ncols && i + 1 < nrows {
            let Some(pivot) = (i..nrows).find(|&r| !self[(r, i)].is_zero()) else {
                debug!(column = i, "no pivot, leaving column free");
                i += 1;
                continue;
            };
            if pivot != i {
                self.swap_rows(i, pivot);
            }

            for r in i + 1..nrows {
                if self[(r, i)].is_zero() {
                    continue;
                }

                let a = self[(r, i)].clone();
                let b = self[(i, i)].clone();
                let factor = a.lcm(&b);

                let mut row_scale = &factor / &a.abs();
                if a.is_negative() == b.is_negative() {
                    row_scale = -row_scale;
                }
                let pivot_scale = &factor / &b.abs();

                for c in 0..ncols {
                    let cancel = &self[(i, c)] * &pivot_scale;
                    self[(r, c)] = &(&self[(r, c)] * &row_scale) + &cancel;
                }
            }

            i += 1;
        }
    }
}

impl Index<(u32, u32)> for Matrix {
    type Output = Integer;

    #[inline]
    fn index(&self, index: (u32, u32)) -> &Self::Output {
        &self.data[(index.0 * self.shape.1 + index.1) as usize]
    }
}

impl IndexMut<(u32, u32)> for Matrix {
    #[inline]
    fn index_mut(&mut self, index: (u32, u32)) -> &mut Integer {
        &mut self.data[(index.0 * self.shape.1 + index.1) as usize]
    }
}

impl Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char('{')?;
        for (ri, r) in self.row_iter().enumerate() {
            f.write_char('{')?;
            for (ci, c) in r.iter().enumerate() {
                Display::fmt(c, f)?;
                if ci + 1 < self.shape.1 as usize {
                    f.write_char(',')?;
                }
            }
            f.write_char('}')?;
            if ri + 1 < self.shape.0 as usize {
                f.write_char(',')?;
            }
        }
        f.write_char('}')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: u32, cols: u32, entries: &[i64]) -> Matrix {
        let mut m = Matrix::new(rows, cols);
        for (i, e) in entries.iter().enumerate() {
            m.data[i] = Integer::from(*e);
        }
        m
    }

    #[test]
    fn reduce_zeroes_below_pivots() {
        let mut m = matrix(2, 3, &[2, 0, -2, 2, 2, -1]);
        m.row_reduce();

        assert_eq!(m[(1, 0)], Integer::zero());
        assert!(!m[(0, 0)].is_zero());
        assert!(!m[(1, 1)].is_zero());
    }

    #[test]
    fn reduce_handles_sign_combinations() {
        for (a, b) in [(2, 3), (-2, 3), (2, -3), (-2, -3)] {
            let mut m = matrix(2, 2, &[b, 1, a, 1]);
            m.row_reduce();
            assert_eq!(m[(1, 0)], Integer::zero(), "a={} b={}", a, b);
        }
    }

    #[test]
    fn reduce_skips_empty_columns() {
        let mut m = matrix(2, 3, &[0, 1, 2, 0, 3, 4]);
        m.row_reduce();

        // first column has no pivot and is left as-is
        assert_eq!(m[(0, 0)], Integer::zero());
        assert_eq!(m[(1, 0)], Integer::zero());
        assert_eq!(m[(1, 1)], Integer::from(3i64));
    }

    #[test]
    fn reduce_stays_integral() {
        let mut m = matrix(3, 4, &[3, 0, -1, 0, 8, 0, 0, -2, 0, 2, -2, -1]);
        m.row_reduce();

        assert_eq!(m[(1, 0)], Integer::zero());
        assert_eq!(m[(2, 0)], Integer::zero());
        assert_eq!(m[(2, 1)], Integer::zero());
    }

    #[test]
    fn display_uses_nested_braces() {
        let m = matrix(2, 2, &[1, 2, 3, 4]);
        assert_eq!(m.to_string(), "{{1,2},{3,4}}");
    }
}
