//! Read-only queries behind the explorer

use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::Result;

/// Marker shown for aggregates with no underlying data
pub const NOT_AVAILABLE: &str = "N/A";

/// One line of the results table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessRow {
    pub business_id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub stars: f64,
    pub review_count: i64,
    /// Average review stars rounded to one decimal; None without reviews
    pub review_rating: Option<f64>,
    pub num_checkins: i64,
}

/// Column headers for a results listing
pub const RESULT_COLUMNS: [&str; 7] = [
    "Name",
    "Address",
    "City",
    "Stars",
    "Reviews",
    "Rating",
    "Check-ins",
];

impl BusinessRow {
    pub fn rating_display(&self) -> String {
        match self.review_rating {
            Some(rating) => format!("{:.1}", rating),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    /// Display values in `RESULT_COLUMNS` order
    pub fn cells(&self) -> [String; 7] {
        [
            self.name.clone(),
            self.address.clone(),
            self.city.clone(),
            format!("{:.1}", self.stars),
            self.review_count.to_string(),
            self.rating_display(),
            self.num_checkins.to_string(),
        ]
    }
}

/// Business count and reference statistics for one zipcode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZipSummary {
    pub zipcode: String,
    pub business_count: i64,
    pub population: Option<i64>,
    pub average_income: Option<f64>,
}

impl ZipSummary {
    pub fn population_display(&self) -> String {
        self.population
            .map(|p| p.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn income_display(&self) -> String {
        self.average_income
            .map(|i| format!("{:.2}", i))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: i64,
}

/// Scope of a business listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub state: String,
    pub city: String,
    pub zipcode: String,
    /// None lists every business in the zipcode
    pub category: Option<String>,
}

/// Queries the explorer needs from the store
pub trait Catalog {
    fn states(&self) -> Result<Vec<String>>;
    fn cities(&self, state: &str) -> Result<Vec<String>>;
    fn zipcodes(&self, state: &str, city: &str) -> Result<Vec<String>>;
    fn categories(&self, state: &str, city: &str, zipcode: &str) -> Result<Vec<String>>;
    fn zip_summary(&self, zipcode: &str) -> Result<ZipSummary>;
    /// Categories with at least `threshold` businesses in the zipcode, most
    /// common first, ties by name
    fn top_categories(&self, zipcode: &str, threshold: u32) -> Result<Vec<CategoryCount>>;
    fn businesses(&self, filter: &SearchFilter) -> Result<Vec<BusinessRow>>;
}

/// Catalog over one read-only SQLite connection, held for the session
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    pub fn open(db: &DatabaseConfig) -> Result<Self> {
        db.warn_unused_credentials();
        let path = db.path();
        debug!("Opening {} read-only", path.display());
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn strings(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }
}

impl Catalog for SqliteCatalog {
    fn states(&self) -> Result<Vec<String>> {
        self.strings(
            "SELECT DISTINCT state FROM business WHERE state IS NOT NULL ORDER BY state",
            [],
        )
    }

    fn cities(&self, state: &str) -> Result<Vec<String>> {
        self.strings(
            "SELECT DISTINCT city FROM business
             WHERE state = ?1 AND city IS NOT NULL
             ORDER BY city",
            [state],
        )
    }

    fn zipcodes(&self, state: &str, city: &str) -> Result<Vec<String>> {
        self.strings(
            "SELECT DISTINCT zipcode FROM business
             WHERE state = ?1 AND city = ?2 AND zipcode IS NOT NULL
             ORDER BY zipcode",
            [state, city],
        )
    }

    fn categories(&self, state: &str, city: &str, zipcode: &str) -> Result<Vec<String>> {
        self.strings(
            "SELECT DISTINCT c.name
             FROM business b
             JOIN business_category bc ON bc.business_id = b.business_id
             JOIN category c ON c.category_id = bc.category_id
             WHERE b.state = ?1 AND b.city = ?2 AND b.zipcode = ?3
             ORDER BY c.name",
            [state, city, zipcode],
        )
    }

    fn zip_summary(&self, zipcode: &str) -> Result<ZipSummary> {
        let summary = self.conn.prepare_cached(
            "SELECT (SELECT COUNT(*) FROM business WHERE zipcode = ?1),
                    (SELECT population FROM zipcode_stats WHERE zipcode = ?1),
                    (SELECT average_income FROM zipcode_stats WHERE zipcode = ?1)",
        )?
        .query_row([zipcode], |row| {
            Ok(ZipSummary {
                zipcode: zipcode.to_string(),
                business_count: row.get(0)?,
                population: row.get(1)?,
                average_income: row.get(2)?,
            })
        })?;
        Ok(summary)
    }

    fn top_categories(&self, zipcode: &str, threshold: u32) -> Result<Vec<CategoryCount>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT c.name, COUNT(DISTINCT b.business_id) AS n
             FROM business b
             JOIN business_category bc ON bc.business_id = b.business_id
             JOIN category c ON c.category_id = bc.category_id
             WHERE b.zipcode = ?1
             GROUP BY c.name
             HAVING n >= ?2
             ORDER BY n DESC, c.name ASC",
        )?;
        let rows = stmt.query_map(params![zipcode, threshold], |row| {
            Ok(CategoryCount {
                name: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn businesses(&self, filter: &SearchFilter) -> Result<Vec<BusinessRow>> {
        // Review and check-in aggregates are computed separately so neither
        // multiplies the other
        let mut stmt = self.conn.prepare_cached(
            "SELECT b.business_id, b.name, b.address, b.city, b.stars,
                    (SELECT COUNT(*) FROM review r WHERE r.business_id = b.business_id),
                    (SELECT ROUND(AVG(r.stars), 1) FROM review r WHERE r.business_id = b.business_id),
                    (SELECT COALESCE(SUM(ci.num_checkins), 0) FROM check_in ci
                     WHERE ci.business_id = b.business_id)
             FROM business b
             WHERE b.state = ?1 AND b.city = ?2 AND b.zipcode = ?3
               AND (?4 IS NULL OR EXISTS (
                    SELECT 1 FROM business_category bc
                    JOIN category c ON c.category_id = bc.category_id
                    WHERE bc.business_id = b.business_id AND c.name = ?4))
             ORDER BY b.name ASC, b.business_id ASC",
        )?;
        let rows = stmt.query_map(
            params![filter.state, filter.city, filter.zipcode, filter.category],
            |row| {
                Ok(BusinessRow {
                    business_id: row.get(0)?,
                    name: row.get(1)?,
                    address: row.get(2)?,
                    city: row.get(3)?,
                    stars: row.get::<_, Option<f64>>(4)?.unwrap_or_default(),
                    review_count: row.get(5)?,
                    review_rating: row.get(6)?,
                    num_checkins: row.get(7)?,
                })
            },
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
