//! Table schema definitions for the Yelp dataset

use super::types::*;

// =============================================================================
// Independent Tables (no FK dependencies)
// =============================================================================

pub static BUSINESS: TableSchema = TableSchema {
    name: "business",
    columns: &[
        Column::required("business_id", ColumnType::Text),
        Column::required("name", ColumnType::Text),
        Column::required("address", ColumnType::Text).default_to("''"),
        Column::new("state", ColumnType::Text),
        Column::new("city", ColumnType::Text),
        Column::new("zipcode", ColumnType::Text),
        Column::new("stars", ColumnType::Real),
        Column::new("num_reviews", ColumnType::Integer),
        Column::new("is_open", ColumnType::Boolean),
    ],
    primary_key: &["business_id"],
    foreign_keys: &[],
    indexes: &[Index::on(&["state", "city", "zipcode"])],
};

pub static CATEGORY: TableSchema = TableSchema {
    name: "category",
    columns: &[
        Column::required("category_id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
    ],
    primary_key: &["category_id"],
    foreign_keys: &[],
    indexes: &[Index::unique(&["name"])],
};

pub static YELP_USER: TableSchema = TableSchema {
    name: "yelp_user",
    columns: &[
        Column::required("user_id", ColumnType::Text),
        Column::new("review_count", ColumnType::Integer),
    ],
    primary_key: &["user_id"],
    foreign_keys: &[],
    indexes: &[],
};

/// External reference data; not part of the four core feeds
pub static ZIPCODE_STATS: TableSchema = TableSchema {
    name: "zipcode_stats",
    columns: &[
        Column::required("zipcode", ColumnType::Text),
        Column::new("population", ColumnType::Integer),
        Column::new("average_income", ColumnType::Real),
    ],
    primary_key: &["zipcode"],
    foreign_keys: &[],
    indexes: &[],
};

// =============================================================================
// Dependent Tables
// =============================================================================

pub static BUSINESS_CATEGORY: TableSchema = TableSchema {
    name: "business_category",
    columns: &[
        Column::required("business_id", ColumnType::Text),
        Column::required("category_id", ColumnType::Integer),
    ],
    primary_key: &["business_id", "category_id"],
    foreign_keys: &[
        ForeignKey::new("business_id", "business", "business_id"),
        ForeignKey::new("category_id", "category", "category_id"),
    ],
    indexes: &[Index::on(&["category_id"])],
};

pub static REVIEW: TableSchema = TableSchema {
    name: "review",
    columns: &[
        Column::required("review_id", ColumnType::Text),
        Column::required("business_id", ColumnType::Text),
        Column::new("stars", ColumnType::Real),
        Column::new("text", ColumnType::Text),
    ],
    primary_key: &["review_id"],
    foreign_keys: &[ForeignKey::new("business_id", "business", "business_id")],
    indexes: &[Index::on(&["business_id"])],
};

pub static CHECK_IN: TableSchema = TableSchema {
    name: "check_in",
    columns: &[
        Column::required("business_id", ColumnType::Text),
        Column::required("day", ColumnType::Text),
        Column::required("time", ColumnType::Text),
        Column::required("num_checkins", ColumnType::Integer),
    ],
    primary_key: &[],
    foreign_keys: &[ForeignKey::new("business_id", "business", "business_id")],
    indexes: &[Index::on(&["business_id"])],
};

pub static ALL_TABLES: &[&TableSchema] = &[
    &BUSINESS,
    &CATEGORY,
    &YELP_USER,
    &ZIPCODE_STATS,
    &BUSINESS_CATEGORY,
    &REVIEW,
    &CHECK_IN,
];

/// Look up a table by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().copied().find(|t| t.name == name)
}

/// All table names, in declaration order
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}
