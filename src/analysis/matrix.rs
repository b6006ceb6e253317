//! Rectangular count matrix with labeled axes.

use std::collections::HashMap;
use std::hash::Hash;

/// Count matrix indexed by row and column labels.
///
/// Labels are fixed at construction; cells start at zero.
#[derive(Debug, Clone)]
pub struct LabeledMatrix<R, C> {
    rows: Vec<R>,
    columns: Vec<C>,
    row_index: HashMap<R, usize>,
    column_index: HashMap<C, usize>,
    cells: Vec<usize>,
}

// The indexes are derived from the label axes, so equality ignores them.
impl<R: PartialEq, C: PartialEq> PartialEq for LabeledMatrix<R, C> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.columns == other.columns && self.cells == other.cells
    }
}

impl<R: Eq, C: Eq> Eq for LabeledMatrix<R, C> {}

impl<R, C> LabeledMatrix<R, C>
where
    R: Clone + Eq + Hash,
    C: Clone + Eq + Hash,
{
    /// Creates a zero matrix. Repeated labels keep their first position.
    #[must_use]
    pub fn zeros(rows: Vec<R>, columns: Vec<C>) -> Self {
        let mut row_index = HashMap::with_capacity(rows.len());
        for (index, label) in rows.iter().enumerate() {
            row_index.entry(label.clone()).or_insert(index);
        }
        let mut column_index = HashMap::with_capacity(columns.len());
        for (index, label) in columns.iter().enumerate() {
            column_index.entry(label.clone()).or_insert(index);
        }
        let cells = vec![0; rows.len() * columns.len()];
        Self {
            rows,
            columns,
            row_index,
            column_index,
            cells,
        }
    }

    #[must_use]
    pub fn row_labels(&self) -> &[R] {
        &self.rows
    }

    #[must_use]
    pub fn column_labels(&self) -> &[C] {
        &self.columns
    }

    /// Cell value by label, `None` when either label is not on its axis.
    #[must_use]
    pub fn get(&self, row: &R, column: &C) -> Option<usize> {
        let offset = self.offset(row, column)?;
        Some(self.cells[offset])
    }

    /// Adds one to a cell. Returns `false` when either label is not on its axis.
    pub fn increment(&mut self, row: &R, column: &C) -> bool {
        match self.offset(row, column) {
            Some(offset) => {
                self.cells[offset] += 1;
                true
            }
            None => false,
        }
    }

    /// Cells of one row in column order.
    #[must_use]
    pub fn row(&self, row: &R) -> Option<&[usize]> {
        let index = *self.row_index.get(row)?;
        let width = self.columns.len();
        Some(&self.cells[index * width..(index + 1) * width])
    }

    /// Sum of a row, `None` for an unknown row label.
    #[must_use]
    pub fn row_sum(&self, row: &R) -> Option<usize> {
        self.row(row).map(|cells| cells.iter().sum())
    }

    /// Rows with their labels in row order.
    pub fn iter_rows(&self) -> impl Iterator<Item = (&R, &[usize])> {
        let width = self.columns.len();
        self.rows
            .iter()
            .enumerate()
            .map(move |(index, label)| (label, &self.cells[index * width..(index + 1) * width]))
    }

    fn offset(&self, row: &R, column: &C) -> Option<usize> {
        let row = *self.row_index.get(row)?;
        let column = *self.column_index.get(column)?;
        Some(row * self.columns.len() + column)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_increment() {
        let mut matrix = LabeledMatrix::zeros(vec!["a", "b"], vec![2019, 2020, 2021]);
        assert!(matrix.increment(&"b", &2020));
        assert!(matrix.increment(&"b", &2020));
        assert!(!matrix.increment(&"c", &2020));
        assert!(!matrix.increment(&"a", &1999));

        assert_eq!(matrix.get(&"b", &2020), Some(2));
        assert_eq!(matrix.get(&"a", &2020), Some(0));
        assert_eq!(matrix.get(&"a", &1999), None);
        assert_eq!(matrix.row(&"b").unwrap(), &[0, 2, 0]);
        assert_eq!(matrix.row_sum(&"b"), Some(2));
    }

    #[test]
    fn test_iter_rows_in_label_order() {
        let mut matrix = LabeledMatrix::zeros(vec!["x", "y"], vec!["p"]);
        matrix.increment(&"y", &"p");
        let rows: Vec<_> = matrix.iter_rows().map(|(l, c)| (*l, c.to_vec())).collect();
        assert_eq!(rows, vec![("x", vec![0]), ("y", vec![1])]);
    }

    #[test]
    fn test_equality_compares_labels_and_counts() {
        let mut left = LabeledMatrix::zeros(vec!["a".to_string()], vec![2020]);
        let mut right = LabeledMatrix::zeros(vec!["a".to_string()], vec![2020]);
        assert_eq!(left, right);

        left.increment(&"a".to_string(), &2020);
        assert_ne!(left, right);
        right.increment(&"a".to_string(), &2020);
        assert_eq!(left, right);

        let other_axis = LabeledMatrix::zeros(vec!["b".to_string()], vec![2020]);
        assert_ne!(LabeledMatrix::zeros(vec!["a".to_string()], vec![2020]), other_axis);
    }

    #[test]
    fn test_empty_axes() {
        let matrix: LabeledMatrix<String, i32> = LabeledMatrix::zeros(Vec::new(), Vec::new());
        assert!(matrix.row_labels().is_empty());
        assert_eq!(matrix.iter_rows().count(), 0);
    }
}
