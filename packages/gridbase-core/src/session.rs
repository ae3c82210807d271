//! Per-caller view of the selected table and its cached rows.

use std::cmp::Ordering;

use crate::model::{Column, ColumnId, Record, RecordId, Table, TableId};
use crate::types::{parse_date, parse_number, ColumnType};
use crate::value::Value;

/// Sort direction of the session's current sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Column and direction the records view is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column_id: ColumnId,
    pub direction: SortDirection,
}

/// Caches of the current table, its columns and its records.
///
/// Owned by the caller and passed to every engine operation, which
/// reloads the affected parts after each mutation. Columns are kept in
/// `order` sequence and records in identity sequence.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub(crate) current_table_id: Option<TableId>,
    pub(crate) tables: Vec<Table>,
    pub(crate) columns: Vec<Column>,
    pub(crate) records: Vec<Record>,
    pub(crate) current_sort: Option<SortSpec>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_table_id(&self) -> Option<TableId> {
        self.current_table_id
    }

    /// Returns the selected table, if it is in the table cache.
    pub fn current_table(&self) -> Option<&Table> {
        let id = self.current_table_id?;
        self.tables.iter().find(|table| table.id == id)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn current_sort(&self) -> Option<SortSpec> {
        self.current_sort
    }

    /// Sorts the records view by a column.
    pub fn set_sort(&mut self, column_id: ColumnId, direction: SortDirection) {
        self.current_sort = Some(SortSpec {
            column_id,
            direction,
        });
    }

    pub fn clear_sort(&mut self) {
        self.current_sort = None;
    }

    /// Returns the cached records in the order of the current sort.
    ///
    /// Without a sort, or when the sorted column is no longer loaded,
    /// records keep their cache order.
    pub fn sorted_records(&self) -> Vec<&Record> {
        let mut records: Vec<&Record> = self.records.iter().collect();
        let Some(sort) = self.current_sort else {
            return records;
        };
        let Some(column) = self.column(sort.column_id) else {
            return records;
        };

        let column_type = column.column_type;
        records.sort_by(|a, b| {
            let ordering = compare_values(column_type, a.value(sort.column_id), b.value(sort.column_id))
                .then_with(|| a.id.cmp(&b.id));
            match sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        records
    }

    pub(crate) fn clear_table(&mut self) {
        self.current_table_id = None;
        self.columns.clear();
        self.records.clear();
        self.current_sort = None;
    }
}

fn compare_values(column_type: ColumnType, a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|value| !value.is_empty());
    let b = b.filter(|value| !value.is_empty());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match column_type {
            ColumnType::Number => match (parse_number(a), parse_number(b)) {
                (Ok(x), Ok(y)) => x.total_cmp(&y),
                _ => natural_cmp(&a.to_text(), &b.to_text()),
            },
            ColumnType::Date => match (parse_date(a), parse_date(b)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => natural_cmp(&a.to_text(), &b.to_text()),
            },
            _ => natural_cmp(&a.to_text(), &b.to_text()),
        },
    }
}

/// Case-insensitive comparison treating digit runs as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x_run = take_digits(&mut left);
                let y_run = take_digits(&mut right);
                let ordering = compare_digit_runs(&x_run, &y_run);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        run.push(c);
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}
