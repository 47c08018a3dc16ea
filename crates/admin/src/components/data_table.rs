//! Data table component types.
//!
//! Tables are rendered from the full result set the API returns; search,
//! filtering and sorting happen here, driven by the query string
//! (`?q=...&sort=...&dir=...` plus one key per select filter).

use std::cmp::Ordering;

use serde::Deserialize;
use url::form_urlencoded;

use tyhub_core::{OrderStatus, ProductType, StockFilter};

use crate::api::{Customer, Order, Product};
use crate::filters::format_date;

/// Sort direction of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Lenient parse; anything but `desc` sorts ascending.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

/// Table state carried in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub stock: Option<String>,
}

impl TableQuery {
    /// Lowercased search text, if any.
    #[must_use]
    pub fn search(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// The search text as typed.
    #[must_use]
    pub fn search_value(&self) -> &str {
        self.q.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.dir.as_deref().map(SortDirection::parse).unwrap_or_default()
    }

    #[must_use]
    pub fn sort_key(&self) -> Option<&str> {
        self.sort.as_deref().filter(|s| !s.is_empty())
    }

    /// Current value of a select filter.
    #[must_use]
    pub fn filter_value(&self, key: &str) -> &str {
        let value = match key {
            "status" => self.status.as_deref(),
            "type" => self.product_type.as_deref(),
            "stock" => self.stock.as_deref(),
            _ => None,
        };
        value.unwrap_or_default()
    }

    /// Link to `path` with this table state, sorted by `sort` in `dir`.
    #[must_use]
    pub fn href(&self, path: &str, sort: &str, dir: SortDirection) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if !self.search_value().is_empty() {
            query.append_pair("q", self.search_value());
        }
        for key in ["status", "type", "stock"] {
            let value = self.filter_value(key);
            if !value.is_empty() {
                query.append_pair(key, value);
            }
        }
        query.append_pair("sort", sort);
        query.append_pair("dir", dir.as_str());
        format!("{path}?{}", query.finish())
    }
}

/// Column definition for a data table.
#[derive(Debug, Clone)]
pub struct TableColumn {
    /// Unique key for the column (the `sort` value).
    pub key: &'static str,
    /// Display label for the column header.
    pub label: &'static str,
    /// Whether the column is sortable.
    pub sortable: bool,
}

impl TableColumn {
    /// Create a new sortable column.
    #[must_use]
    pub const fn sortable(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: true,
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: false,
        }
    }
}

/// Option for select filters.
#[derive(Debug, Clone)]
pub struct FilterOption {
    /// Option value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl FilterOption {
    /// Create a new filter option.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Select filter definition for a data table.
#[derive(Debug, Clone)]
pub struct TableFilter {
    /// Filter parameter key.
    pub key: &'static str,
    /// Available options; the first one means "no filter".
    pub options: Vec<FilterOption>,
}

impl TableFilter {
    /// Create a select filter.
    #[must_use]
    pub const fn select(key: &'static str, options: Vec<FilterOption>) -> Self {
        Self { key, options }
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: &'static str,
    /// Path the table is served at.
    pub path: &'static str,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Filter definitions.
    pub filters: Vec<TableFilter>,
    /// Search placeholder text.
    pub search_placeholder: &'static str,
    /// Title for empty state.
    pub empty_title: &'static str,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub const fn new(table_id: &'static str, path: &'static str) -> Self {
        Self {
            table_id,
            path,
            columns: vec![],
            filters: vec![],
            search_placeholder: "Search...",
            empty_title: "No items found",
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set search placeholder.
    #[must_use]
    pub const fn search_placeholder(mut self, placeholder: &'static str) -> Self {
        self.search_placeholder = placeholder;
        self
    }

    /// Set empty state title.
    #[must_use]
    pub const fn empty_title(mut self, title: &'static str) -> Self {
        self.empty_title = title;
        self
    }

    /// Resolve the configuration against the current query for rendering.
    #[must_use]
    pub fn view(&self, query: &TableQuery) -> DataTableView {
        let current_sort = query.sort_key();
        let current_dir = query.direction();

        let headers = self
            .columns
            .iter()
            .map(|column| {
                let active = column.sortable && current_sort == Some(column.key);
                let next_dir = if active {
                    current_dir.toggled()
                } else {
                    SortDirection::Asc
                };
                ColumnHeader {
                    label: column.label,
                    sortable: column.sortable,
                    href: query.href(self.path, column.key, next_dir),
                    indicator: match (active, current_dir) {
                        (false, _) => "",
                        (true, SortDirection::Asc) => "▲",
                        (true, SortDirection::Desc) => "▼",
                    },
                }
            })
            .collect();

        let filters = self
            .filters
            .iter()
            .map(|filter| {
                let current = query.filter_value(filter.key);
                FilterView {
                    key: filter.key,
                    options: filter
                        .options
                        .iter()
                        .map(|option| FilterOptionView {
                            value: option.value.clone(),
                            label: option.label.clone(),
                            selected: option.value == current,
                        })
                        .collect(),
                }
            })
            .collect();

        DataTableView {
            table_id: self.table_id,
            path: self.path,
            search_placeholder: self.search_placeholder,
            search_value: query.search_value().to_string(),
            sort: current_sort.unwrap_or_default().to_string(),
            dir: current_dir.as_str(),
            empty_title: self.empty_title,
            headers,
            filters,
        }
    }
}

/// A rendered column header.
#[derive(Debug, Clone)]
pub struct ColumnHeader {
    pub label: &'static str,
    pub sortable: bool,
    pub href: String,
    /// Arrow shown on the active sort column.
    pub indicator: &'static str,
}

/// A rendered select filter.
#[derive(Debug, Clone)]
pub struct FilterView {
    pub key: &'static str,
    pub options: Vec<FilterOptionView>,
}

#[derive(Debug, Clone)]
pub struct FilterOptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Everything the table controls partial needs.
#[derive(Debug, Clone)]
pub struct DataTableView {
    pub table_id: &'static str,
    pub path: &'static str,
    pub search_placeholder: &'static str,
    pub search_value: String,
    pub sort: String,
    pub dir: &'static str,
    pub empty_title: &'static str,
    pub headers: Vec<ColumnHeader>,
    pub filters: Vec<FilterView>,
}

// =============================================================================
// Rows
// =============================================================================

/// A record that can be shown in a data table.
pub trait TableRow {
    /// Whether the row contains the (lowercased) search text.
    fn matches_search(&self, needle: &str) -> bool;

    /// Whether the row passes the select filters.
    fn matches_filters(&self, query: &TableQuery) -> bool;

    /// Ascending comparison on a column; `None` for unknown columns.
    fn compare(&self, other: &Self, column: &str) -> Option<Ordering>;
}

/// Search, filter and sort `rows` according to `query`.
///
/// Rows keep their API order unless a known sort column is requested.
#[must_use]
pub fn apply<'a, T: TableRow>(rows: &'a [T], query: &TableQuery) -> Vec<&'a T> {
    let search = query.search();
    let mut visible: Vec<&T> = rows
        .iter()
        .filter(|row| search.as_deref().is_none_or(|needle| row.matches_search(needle)))
        .filter(|row| row.matches_filters(query))
        .collect();

    if let Some(column) = query.sort_key() {
        let dir = query.direction();
        visible.sort_by(|a, b| {
            let ordering = a.compare(b, column).unwrap_or(Ordering::Equal);
            match dir {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    visible
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl TableRow for Order {
    fn matches_search(&self, needle: &str) -> bool {
        contains(self.id.as_str(), needle)
            || contains(&self.user.name, needle)
            || self.user.email.as_deref().is_some_and(|e| contains(e, needle))
    }

    fn matches_filters(&self, query: &TableQuery) -> bool {
        match query.filter_value("status") {
            "" => true,
            value => value.parse::<OrderStatus>().is_ok_and(|s| s == self.status),
        }
    }

    fn compare(&self, other: &Self, column: &str) -> Option<Ordering> {
        Some(match column {
            "id" => self.id.cmp(&other.id),
            "customer" => self.user.name.to_lowercase().cmp(&other.user.name.to_lowercase()),
            "date" => self.created_at.cmp(&other.created_at),
            "total" => self.total_amount.total_cmp(&other.total_amount),
            "status" => self.status.as_str().cmp(other.status.as_str()),
            _ => return None,
        })
    }
}

impl TableRow for Product {
    fn matches_search(&self, needle: &str) -> bool {
        contains(&self.title, needle)
            || self.description.as_deref().is_some_and(|d| contains(d, needle))
    }

    fn matches_filters(&self, query: &TableQuery) -> bool {
        let type_ok = match query.filter_value("type") {
            "" => true,
            value => value.parse::<ProductType>().is_ok_and(|t| t == self.product_type),
        };
        let stock_ok = query
            .filter_value("stock")
            .parse::<StockFilter>()
            .map_or(true, |filter| filter.matches(self.stock));
        type_ok && stock_ok
    }

    fn compare(&self, other: &Self, column: &str) -> Option<Ordering> {
        // Untracked stock sorts after any number.
        let stock = |p: &Self| p.stock.map_or(u64::MAX, u64::from);
        Some(match column {
            "title" => self.title.to_lowercase().cmp(&other.title.to_lowercase()),
            "type" => self.product_type.as_str().cmp(other.product_type.as_str()),
            "price" => self.price.total_cmp(&other.price),
            "stock" => stock(self).cmp(&stock(other)),
            _ => return None,
        })
    }
}

impl TableRow for Customer {
    fn matches_search(&self, needle: &str) -> bool {
        contains(&self.username, needle)
            || contains(&self.email, needle)
            || contains(&format_date(&self.created_at), needle)
    }

    fn matches_filters(&self, _query: &TableQuery) -> bool {
        true
    }

    fn compare(&self, other: &Self, column: &str) -> Option<Ordering> {
        Some(match column {
            "name" => self.username.to_lowercase().cmp(&other.username.to_lowercase()),
            "email" => self.email.to_lowercase().cmp(&other.email.to_lowercase()),
            "registered" => self.created_at.cmp(&other.created_at),
            _ => return None,
        })
    }
}

// =============================================================================
// Table configurations
// =============================================================================

/// Build the orders table configuration.
#[must_use]
pub fn orders_table_config() -> DataTableConfig {
    let mut statuses = vec![FilterOption::new("", "All Status")];
    statuses.extend(
        OrderStatus::ALL
            .iter()
            .map(|s| FilterOption::new(s.as_str(), s.label())),
    );

    DataTableConfig::new("orders", "/orders")
        .column(TableColumn::sortable("id", "Order ID"))
        .column(TableColumn::sortable("customer", "Customer"))
        .column(TableColumn::sortable("date", "Date"))
        .column(TableColumn::sortable("total", "Total"))
        .column(TableColumn::sortable("status", "Status"))
        .column(TableColumn::new("actions", ""))
        .filter(TableFilter::select("status", statuses))
        .search_placeholder("Search orders by id, customer or email...")
        .empty_title("No orders found")
}

/// Build the products table configuration.
#[must_use]
pub fn products_table_config() -> DataTableConfig {
    let types = vec![
        FilterOption::new("", "All Types"),
        FilterOption::new(ProductType::Physical.as_str(), ProductType::Physical.label()),
        FilterOption::new(ProductType::Digital.as_str(), ProductType::Digital.label()),
    ];
    let stock = StockFilter::ALL
        .iter()
        .map(|f| FilterOption::new(f.as_str(), f.label()))
        .collect();

    DataTableConfig::new("products", "/products")
        .column(TableColumn::new("image", "Image"))
        .column(TableColumn::sortable("title", "Product"))
        .column(TableColumn::new("description", "Description"))
        .column(TableColumn::sortable("type", "Type"))
        .column(TableColumn::sortable("price", "Price"))
        .column(TableColumn::sortable("stock", "Stock"))
        .column(TableColumn::new("actions", ""))
        .filter(TableFilter::select("type", types))
        .filter(TableFilter::select("stock", stock))
        .search_placeholder("Search products...")
        .empty_title("No products found")
}

/// Build the customers table configuration.
#[must_use]
pub fn customers_table_config() -> DataTableConfig {
    DataTableConfig::new("customers", "/customers")
        .column(TableColumn::sortable("name", "Customer"))
        .column(TableColumn::sortable("email", "Email"))
        .column(TableColumn::new("phone", "Phone"))
        .column(TableColumn::sortable("registered", "Registered"))
        .column(TableColumn::new("actions", ""))
        .search_placeholder("Search customers by name, email or date...")
        .empty_title("No customers found")
}

/// First `max_words` words of `text`, with `...` appended when cut.
#[must_use]
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    if words.next().is_some() {
        format!("{}...", kept.join(" "))
    } else {
        kept.join(" ")
    }
}
