//! File classification by name pattern
//!
//! Maps an object key to the Olist dataset category it belongs to, which
//! in turn names the destination bronze table and the upload prefix.

use serde::{Deserialize, Serialize};

/// Logical dataset category, one per bronze table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Customers,
    Orders,
    OrderItems,
    Products,
    Geolocation,
    Sellers,
    OrderPayments,
    OrderReviews,
    ProductCategoryNameTranslation,
}

/// Ordered (pattern, category) table scanned first-match-wins.
///
/// Ordering is correctness-critical: more specific substrings come before
/// their prefixes ("order_items" before "orders",
/// "product_category_name_translation" before "products"), otherwise an
/// order_items file would land in the orders table.
const PATTERNS: &[(&str, Category)] = &[
    ("product_category_name_translation", Category::ProductCategoryNameTranslation),
    ("order_items", Category::OrderItems),
    ("order_payments", Category::OrderPayments),
    ("order_reviews", Category::OrderReviews),
    ("customers", Category::Customers),
    ("geolocation", Category::Geolocation),
    ("sellers", Category::Sellers),
    ("products", Category::Products),
    ("orders", Category::Orders),
];

/// Prefix folder used by the upload stage for files no pattern matches.
/// The load stage never creates a table for these; they are skipped.
pub const UNRECOGNIZED_FOLDER: &str = "others";

impl Category {
    /// Classify an object key, returning `None` when no pattern matches.
    ///
    /// Pure and deterministic: the first entry of [`PATTERNS`] whose
    /// substring appears in the key wins.
    pub fn classify(key: &str) -> Option<Category> {
        PATTERNS
            .iter()
            .find(|(pattern, _)| key.contains(pattern))
            .map(|&(_, category)| category)
    }

    /// Destination table name in the bronze schema.
    pub fn table_name(&self) -> &'static str {
        match self {
            Category::Customers => "customers",
            Category::Orders => "orders",
            Category::OrderItems => "order_items",
            Category::Products => "products",
            Category::Geolocation => "geolocation",
            Category::Sellers => "sellers",
            Category::OrderPayments => "order_payments",
            Category::OrderReviews => "order_reviews",
            Category::ProductCategoryNameTranslation => "product_category_name_translation",
        }
    }

    /// Prefix folder name for the upload stage; falls back to
    /// [`UNRECOGNIZED_FOLDER`] for keys no pattern matches.
    pub fn folder_for(key: &str) -> &'static str {
        Self::classify(key)
            .map(|c| c.table_name())
            .unwrap_or(UNRECOGNIZED_FOLDER)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_every_olist_file() {
        let cases = [
            ("raw/olist_customers_dataset.csv", Category::Customers),
            ("raw/olist_orders_dataset.csv", Category::Orders),
            ("raw/olist_order_items_dataset.csv", Category::OrderItems),
            ("raw/olist_products_dataset.csv", Category::Products),
            ("raw/olist_geolocation_dataset.csv", Category::Geolocation),
            ("raw/olist_sellers_dataset.csv", Category::Sellers),
            ("raw/olist_order_payments_dataset.csv", Category::OrderPayments),
            ("raw/olist_order_reviews_dataset.csv", Category::OrderReviews),
            (
                "raw/product_category_name_translation.csv",
                Category::ProductCategoryNameTranslation,
            ),
        ];

        for (key, expected) in cases {
            assert_eq!(Category::classify(key), Some(expected), "key: {}", key);
        }
    }

    #[test]
    fn specific_patterns_win_over_their_prefixes() {
        // Keys containing both "orders" and "order_items" must not land in
        // the orders table.
        assert_eq!(
            Category::classify("raw/olist_order_items_dataset.csv"),
            Some(Category::OrderItems)
        );
        assert_eq!(
            Category::classify("raw/product_category_name_translation.csv"),
            Some(Category::ProductCategoryNameTranslation)
        );
    }

    #[test]
    fn unrecognized_keys_are_none() {
        assert_eq!(Category::classify("raw/unknown_blob.bin"), None);
        assert_eq!(Category::classify("raw/readme.txt"), None);
    }

    #[test]
    fn classification_is_deterministic() {
        let key = "raw/olist_order_payments_dataset.csv";
        assert_eq!(Category::classify(key), Category::classify(key));
    }

    #[test]
    fn folder_falls_back_to_others() {
        assert_eq!(Category::folder_for("olist_sellers_dataset.csv"), "sellers");
        assert_eq!(Category::folder_for("unknown_blob.bin"), "others");
    }
}
