//! Reusable page components.

pub mod data_table;

pub use data_table::{
    DataTableConfig, DataTableView, SortDirection, TableQuery, TableRow, apply as apply_table,
    truncate_words,
};
