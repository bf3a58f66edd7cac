//! Minimum-cost bipartite assignment (Hungarian method with potentials).
//!
//! A rectangular matrix is solved on its short side: each row of the shorter
//! dimension is inserted by a shortest augmenting path over reduced costs
//! `cost - u[row] - v[col]`. Leaving the surplus rows or columns unmatched
//! is the same as padding to a square with zero-cost dummy cells.
//!
//! Inserting one row runs as an explicit state machine over [`Step`]:
//!
//! ```text
//! InsertRow --> Grow --> Relabel --(reached a free column)--> Augment --> InsertRow (next)
//!                ^          |
//!                +----------+ (reached a matched column)
//! ```
//!
//! `Grow` keeps, per column, the smallest reduced cost seen from the tree
//! (`min_slack`) and the tree column it was reached through (`way`). Each
//! `Grow`/`Relabel` pair is O(cols) and adds one column to the tree, so a
//! row costs O(cols^2) and the whole solve O(rows^2 * cols).

use rayon::prelude::*;

/// Cost marking a pairing that is not a real option.
pub const INFEASIBLE: f64 = 1e9;

/// Dense row-major cost matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    #[cfg(test)]
    pub(crate) fn from_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        let data: Vec<f64> = rows.iter().flat_map(|row| row.iter().copied()).collect();
        assert_eq!(data.len(), rows.len() * cols, "ragged cost matrix");
        Self {
            rows: rows.len(),
            cols,
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Fill rows in parallel. `fill(row_index, row)` writes one full row.
    pub fn par_fill_rows<F>(&mut self, fill: F)
    where
        F: Fn(usize, &mut [f64]) + Sync + Send,
    {
        if self.cols == 0 {
            return;
        }
        self.data
            .par_chunks_mut(self.cols)
            .enumerate()
            .for_each(|(row, chunk)| fill(row, chunk));
    }

    fn transposed(&self) -> Self {
        let mut out = Self::filled(self.cols, self.rows, 0.0);
        for row in 0..self.rows {
            for col in 0..self.cols {
                out.set(col, row, self.get(row, col));
            }
        }
        out
    }
}

/// Solve the assignment problem for `matrix`.
///
/// Returns `(row, col)` pairs in row order, `min(rows, cols)` of them with no
/// row or column repeated. The pairs minimise the total cost over all such
/// matchings.
pub fn linear_sum_assignment(matrix: &CostMatrix) -> Vec<(usize, usize)> {
    if matrix.is_empty() {
        return Vec::new();
    }
    if matrix.rows <= matrix.cols {
        return Potentials::new(matrix).solve().into_iter().enumerate().collect();
    }

    let transposed = matrix.transposed();
    let mut pairs: Vec<(usize, usize)> = Potentials::new(&transposed)
        .solve()
        .into_iter()
        .enumerate()
        .map(|(col, row)| (row, col))
        .collect();
    pairs.sort_unstable();
    pairs
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    /// Start a shortest-path tree rooted at `row`.
    InsertRow { row: usize },
    /// Add the tree column `col` and refresh slack through its row.
    Grow { row: usize, col: usize },
    /// Shift potentials by `delta`, then move to `next`.
    Relabel { row: usize, delta: f64, next: usize },
    /// Flip matches back along `way` from the free column `col`.
    Augment { row: usize, col: usize },
    Done,
}

/// Solver state for `rows <= cols`.
///
/// Columns are numbered from 1; column 0 is a virtual root whose match is
/// the row being inserted. Rows are stored 1-based in `row_of_col` so that 0
/// means free.
struct Potentials<'a> {
    matrix: &'a CostMatrix,
    row_potential: Vec<f64>,
    col_potential: Vec<f64>,
    row_of_col: Vec<usize>,
    way: Vec<usize>,
    min_slack: Vec<f64>,
    in_tree: Vec<bool>,
}

impl<'a> Potentials<'a> {
    fn new(matrix: &'a CostMatrix) -> Self {
        let cols = matrix.cols + 1;
        Self {
            matrix,
            row_potential: vec![0.0; matrix.rows + 1],
            col_potential: vec![0.0; cols],
            row_of_col: vec![0; cols],
            way: vec![0; cols],
            min_slack: vec![f64::INFINITY; cols],
            in_tree: vec![false; cols],
        }
    }

    /// Column assigned to each row.
    fn solve(mut self) -> Vec<usize> {
        let mut step = Step::InsertRow { row: 1 };
        while step != Step::Done {
            step = match step {
                Step::InsertRow { row } => self.insert_row(row),
                Step::Grow { row, col } => self.grow(row, col),
                Step::Relabel { row, delta, next } => self.relabel(row, delta, next),
                Step::Augment { row, col } => self.augment(row, col),
                Step::Done => Step::Done,
            };
        }

        let mut column_of_row = vec![0; self.matrix.rows];
        for (col, &row) in self.row_of_col.iter().enumerate().skip(1) {
            if row != 0 {
                column_of_row[row - 1] = col - 1;
            }
        }
        column_of_row
    }

    fn insert_row(&mut self, row: usize) -> Step {
        if row > self.matrix.rows {
            return Step::Done;
        }
        self.row_of_col[0] = row;
        self.min_slack.iter_mut().for_each(|s| *s = f64::INFINITY);
        self.in_tree.iter_mut().for_each(|t| *t = false);
        Step::Grow { row, col: 0 }
    }

    fn grow(&mut self, row: usize, col: usize) -> Step {
        self.in_tree[col] = true;
        let matrix = self.matrix;
        let tree_row = self.row_of_col[col];
        let base = self.row_potential[tree_row];
        let costs = matrix.row(tree_row - 1);

        let mut delta = f64::INFINITY;
        let mut next = 0;
        for j in 1..self.col_potential.len() {
            if self.in_tree[j] {
                continue;
            }
            let reduced = costs[j - 1] - base - self.col_potential[j];
            if reduced < self.min_slack[j] {
                self.min_slack[j] = reduced;
                self.way[j] = col;
            }
            if self.min_slack[j] < delta {
                delta = self.min_slack[j];
                next = j;
            }
        }
        // rows <= cols leaves a free column outside the tree.
        debug_assert!(next != 0, "no column left to grow into");
        Step::Relabel { row, delta, next }
    }

    /// Keep every tree edge tight while closing the gap to `next`.
    fn relabel(&mut self, row: usize, delta: f64, next: usize) -> Step {
        for j in 0..self.col_potential.len() {
            if self.in_tree[j] {
                self.row_potential[self.row_of_col[j]] += delta;
                self.col_potential[j] -= delta;
            } else {
                self.min_slack[j] -= delta;
            }
        }
        if self.row_of_col[next] == 0 {
            Step::Augment { row, col: next }
        } else {
            Step::Grow { row, col: next }
        }
    }

    fn augment(&mut self, row: usize, mut col: usize) -> Step {
        while col != 0 {
            let prev = self.way[col];
            self.row_of_col[col] = self.row_of_col[prev];
            col = prev;
        }
        Step::InsertRow { row: row + 1 }
    }
}
