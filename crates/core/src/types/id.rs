//! Newtype IDs for type-safe entity references.
//!
//! The remote API identifies every record with an opaque string (a document
//! id such as `665f1c2e9b1d8a0012ab34cd`). Use the `define_id!` macro to create
//! type-safe wrappers that prevent accidentally mixing IDs from different
//! entity types.

/// Number of trailing characters shown in short labels (`#ab34cd`).
pub const SHORT_ID_LEN: usize = 6;

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `short()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use tyhub_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::new("665f1c2e9b1d8a0012ab34cd");
/// let order_id = OrderId::new("665f1c2e9b1d8a0012ab34cd");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = order_id;
/// assert_eq!(order_id.short(), "ab34cd");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The last few characters of the ID, used in compact labels.
            #[must_use]
            pub fn short(&self) -> &str {
                let start = self
                    .0
                    .char_indices()
                    .rev()
                    .nth($crate::types::id::SHORT_ID_LEN - 1)
                    .map_or(0, |(idx, _)| idx);
                self.0.get(start..).unwrap_or(&self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(CustomerId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_short_takes_last_six_chars() {
        let id = OrderId::new("665f1c2e9b1d8a0012ab34cd");
        assert_eq!(id.short(), "ab34cd");
    }

    #[test]
    fn test_short_on_short_id_returns_whole_id() {
        let id = OrderId::new("42");
        assert_eq!(id.short(), "42");
        assert_eq!(OrderId::new("").short(), "");
    }

    #[test]
    fn test_serde_transparent() {
        let id: ProductId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
    }

    #[test]
    fn test_display() {
        let id = CustomerId::from("c-1");
        assert_eq!(format!("{id}"), "c-1");
    }
}
