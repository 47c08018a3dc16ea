//! Product type and stock classification.

use serde::{Deserialize, Serialize};

/// Stock below this level is flagged as low.
pub const LOW_STOCK_THRESHOLD: u32 = 50;

/// Whether a product ships physically or is delivered as a download.
///
/// Physical products carry stock, size/color variants and images; digital
/// products carry a single downloadable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Physical,
    Digital,
}

impl ProductType {
    pub const ALL: [Self; 2] = [Self::Physical, Self::Digital];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Digital => "digital",
        }
    }

    /// Capitalised label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Physical => "Physical",
            Self::Digital => "Digital",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "physical" => Ok(Self::Physical),
            "digital" => Ok(Self::Digital),
            _ => Err(format!("invalid product type: {s}")),
        }
    }
}

/// Stock filter offered on the products table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StockFilter {
    /// No stock filtering.
    #[default]
    #[serde(rename = "")]
    All,
    /// Stock is tracked and above zero.
    #[serde(rename = "In Stock")]
    InStock,
    /// Stock is tracked, non-zero and below [`LOW_STOCK_THRESHOLD`].
    #[serde(rename = "Low Stock")]
    LowStock,
    /// Stock is not tracked.
    #[serde(rename = "Unlimited")]
    Unlimited,
}

impl StockFilter {
    /// Every filter value, in the order shown in the selector.
    pub const ALL: [Self; 4] = [Self::All, Self::InStock, Self::LowStock, Self::Unlimited];

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "",
            Self::InStock => "In Stock",
            Self::LowStock => "Low Stock",
            Self::Unlimited => "Unlimited",
        }
    }

    /// Selector label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All Stock",
            other => other.as_str(),
        }
    }

    /// Whether a product with the given stock passes this filter.
    ///
    /// A stock of zero is neither "In Stock" nor "Low Stock".
    #[must_use]
    pub const fn matches(self, stock: Option<u32>) -> bool {
        match (self, stock) {
            (Self::All, _) | (Self::Unlimited, None) => true,
            (Self::InStock, Some(n)) => n > 0,
            (Self::LowStock, Some(n)) => n > 0 && n < LOW_STOCK_THRESHOLD,
            _ => false,
        }
    }
}

impl std::str::FromStr for StockFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("invalid stock filter: {s}"))
    }
}

/// Display classification of a stock value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Unlimited,
    OutOfStock,
    Low(u32),
    Available(u32),
}

impl StockLevel {
    /// Classify a stock value.
    #[must_use]
    pub const fn of(stock: Option<u32>) -> Self {
        match stock {
            None => Self::Unlimited,
            Some(0) => Self::OutOfStock,
            Some(n) if n < LOW_STOCK_THRESHOLD => Self::Low(n),
            Some(n) => Self::Available(n),
        }
    }

    /// Table cell text.
    #[must_use]
    pub fn display(self) -> String {
        match self {
            Self::Unlimited => "Unlimited".to_string(),
            Self::OutOfStock => "Out of Stock".to_string(),
            Self::Low(n) => format!("{n} (Low)"),
            Self::Available(n) => n.to_string(),
        }
    }

    /// Text color class for the table cell.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::OutOfStock => "text-red-500",
            Self::Low(_) => "text-yellow-500",
            Self::Unlimited | Self::Available(_) => "text-gray-600",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_filter_matches() {
        assert!(StockFilter::All.matches(None));
        assert!(StockFilter::All.matches(Some(0)));

        assert!(StockFilter::InStock.matches(Some(1)));
        assert!(StockFilter::InStock.matches(Some(500)));
        assert!(!StockFilter::InStock.matches(Some(0)));
        assert!(!StockFilter::InStock.matches(None));

        assert!(StockFilter::LowStock.matches(Some(49)));
        assert!(!StockFilter::LowStock.matches(Some(50)));
        assert!(!StockFilter::LowStock.matches(Some(0)));
        assert!(!StockFilter::LowStock.matches(None));

        assert!(StockFilter::Unlimited.matches(None));
        assert!(!StockFilter::Unlimited.matches(Some(10)));
    }

    #[test]
    fn test_stock_filter_from_query_value() {
        assert_eq!("".parse::<StockFilter>().unwrap(), StockFilter::All);
        assert_eq!(
            "Low Stock".parse::<StockFilter>().unwrap(),
            StockFilter::LowStock
        );
        assert!("low".parse::<StockFilter>().is_err());
    }

    #[test]
    fn test_stock_level_display() {
        assert_eq!(StockLevel::of(None).display(), "Unlimited");
        assert_eq!(StockLevel::of(Some(0)).display(), "Out of Stock");
        assert_eq!(StockLevel::of(Some(12)).display(), "12 (Low)");
        assert_eq!(StockLevel::of(Some(50)).display(), "50");
        assert_eq!(StockLevel::of(Some(0)).css_class(), "text-red-500");
    }

    #[test]
    fn test_product_type_wire_format() {
        let t: ProductType = serde_json::from_str("\"digital\"").unwrap();
        assert_eq!(t, ProductType::Digital);
        assert_eq!("physical".parse::<ProductType>().unwrap(), ProductType::Physical);
        assert!("Physical".parse::<ProductType>().is_err());
    }
}
