//! A two dimensional table with ordered, keyed rows and columns.
//!
//! Used for the trip (template x section), transport (route x date) and
//! external bus (route x section) grids.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

/// Values that can be "empty" for the purpose of [`OrderedMatrix::truncate`].
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl<T> Blank for Option<T> {
    fn is_blank(&self) -> bool {
        self.is_none()
    }
}

impl Blank for u32 {
    fn is_blank(&self) -> bool {
        *self == 0
    }
}

impl Blank for usize {
    fn is_blank(&self) -> bool {
        *self == 0
    }
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderedMatrix<R, C, V>
where
    R: Eq + Hash,
    C: Eq + Hash,
{
    rows: Vec<R>,
    cols: Vec<C>,
    cells: Vec<Vec<V>>,
    #[serde(skip)]
    row_index: HashMap<R, usize>,
    #[serde(skip)]
    col_index: HashMap<C, usize>,
}

impl<R, C, V> OrderedMatrix<R, C, V>
where
    R: Eq + Hash + Clone,
    C: Eq + Hash + Clone,
{
    /// Builds a matrix with every cell set by `fill`.
    pub fn new(rows: Vec<R>, cols: Vec<C>, fill: impl Fn() -> V) -> Self {
        let cells = rows
            .iter()
            .map(|_| cols.iter().map(|_| fill()).collect())
            .collect();
        let row_index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.clone(), i))
            .collect();
        let col_index = cols
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        Self {
            rows,
            cols,
            cells,
            row_index,
            col_index,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn cols(&self) -> &[C] {
        &self.cols
    }

    pub fn get(&self, row: &R, col: &C) -> Option<&V> {
        let r = *self.row_index.get(row)?;
        let c = *self.col_index.get(col)?;
        Some(&self.cells[r][c])
    }

    pub fn get_mut(&mut self, row: &R, col: &C) -> Option<&mut V> {
        let r = *self.row_index.get(row)?;
        let c = *self.col_index.get(col)?;
        Some(&mut self.cells[r][c])
    }

    /// Sets a cell. Returns false if the row or column is unknown.
    pub fn set(&mut self, row: &R, col: &C, value: V) -> bool {
        match self.get_mut(row, col) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Iterates over `(row, cells)` pairs in row order.
    pub fn iter_rows(&self) -> impl Iterator<Item = (&R, &[V])> {
        self.rows
            .iter()
            .zip(self.cells.iter().map(|cells| cells.as_slice()))
    }

    /// Builds a matrix with the same keys and every cell transformed by `f`.
    pub fn map<W>(&self, f: impl Fn(&V) -> W) -> OrderedMatrix<R, C, W> {
        OrderedMatrix {
            rows: self.rows.clone(),
            cols: self.cols.clone(),
            cells: self
                .cells
                .iter()
                .map(|row| row.iter().map(&f).collect())
                .collect(),
            row_index: self.row_index.clone(),
            col_index: self.col_index.clone(),
        }
    }
}

impl<R, C, V> OrderedMatrix<R, C, V>
where
    R: Eq + Hash + Clone,
    C: Eq + Hash + Clone,
    V: Blank,
{
    /// Drops every row whose cells are all blank.
    pub fn truncate(self) -> Self {
        let (rows, cells): (Vec<R>, Vec<Vec<V>>) = self
            .rows
            .into_iter()
            .zip(self.cells)
            .filter(|(_, cells)| cells.iter().any(|v| !v.is_blank()))
            .unzip();
        let row_index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.clone(), i))
            .collect();

        Self {
            rows,
            cols: self.cols,
            cells,
            row_index,
            col_index: self.col_index,
        }
    }
}
