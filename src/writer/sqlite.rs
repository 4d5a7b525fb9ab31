use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::schema_gen::{generate_create_table, generate_indexes};
use crate::config::{DatabaseConfig, FeedConfig};
use crate::error::{Error, Result};
use crate::parser::{
    parse_record, BusinessRecord, CheckinRecord, ReviewRecord, UserRecord, ZipcodeStatsRecord,
};
use crate::schema::creation_order;
use crate::ui::{Phase, Ui};

/// Lines between progress updates
const PROGRESS_INTERVAL: u64 = 1000;

/// Source feeds, in load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    Business,
    Review,
    User,
    Checkin,
    ZipcodeStats,
}

impl Feed {
    pub const ALL: [Feed; 5] = [
        Feed::Business,
        Feed::Review,
        Feed::User,
        Feed::Checkin,
        Feed::ZipcodeStats,
    ];

    /// Optional feeds are skipped when their file is absent
    pub fn required(self) -> bool {
        !matches!(self, Feed::ZipcodeStats)
    }

    pub fn file_name(self, feeds: &FeedConfig) -> &str {
        match self {
            Feed::Business => &feeds.business,
            Feed::Review => &feeds.review,
            Feed::User => &feeds.user,
            Feed::Checkin => &feeds.checkin,
            Feed::ZipcodeStats => &feeds.zipcode_stats,
        }
    }
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Feed::Business => "business",
            Feed::Review => "review",
            Feed::User => "user",
            Feed::Checkin => "checkin",
            Feed::ZipcodeStats => "zipcode_stats",
        };
        f.pad(name)
    }
}

/// Per-feed line counts
#[derive(Debug, Clone, Serialize)]
pub struct FeedSummary {
    pub feed: Feed,
    pub file: PathBuf,
    /// None when an optional feed was skipped
    pub lines: Option<u64>,
}

/// What a load wrote, by table
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub feeds: Vec<FeedSummary>,
    pub rows: BTreeMap<&'static str, u64>,
}

impl LoadReport {
    pub fn rows(&self, table: &str) -> u64 {
        self.rows.get(table).copied().unwrap_or(0)
    }

    pub fn total_rows(&self) -> u64 {
        self.rows.values().sum()
    }

    fn add(&mut self, table: &'static str, count: u64) {
        *self.rows.entry(table).or_insert(0) += count;
    }
}

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    /// Open (or create) the database file described by `db`
    pub fn open(db: &DatabaseConfig, fresh: bool) -> Result<Self> {
        db.warn_unused_credentials();
        let path = db.path();

        if fresh && path.exists() {
            info!("Removing existing database {}", path.display());
            std::fs::remove_file(&path)?;
        }

        let conn = Connection::open(&path)?;
        Self::from_connection(conn)
    }

    /// Wrap an already open connection
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;",
        )?;

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Create all tables that do not exist yet
    pub fn create_tables(&self) -> Result<()> {
        let tables = creation_order()?;
        debug!("Creating {} tables", tables.len());

        for schema in tables {
            self.conn.execute(&generate_create_table(schema), [])?;
            for index_sql in generate_indexes(schema) {
                self.conn.execute(&index_sql, [])?;
            }
        }

        Ok(())
    }

    /// Start the batch transaction. Dropping the session without
    /// `commit` rolls everything back.
    pub fn begin(&mut self) -> Result<LoadSession<'_>> {
        Ok(LoadSession {
            tx: self.conn.transaction()?,
            report: LoadReport::default(),
        })
    }
}

/// Inserts issued inside the single batch transaction
pub struct LoadSession<'conn> {
    tx: Transaction<'conn>,
    report: LoadReport,
}

impl LoadSession<'_> {
    pub fn insert_business(&mut self, record: &BusinessRecord) -> Result<()> {
        self.tx
            .prepare_cached(
                "INSERT INTO business
                 (business_id, name, address, state, city, zipcode, stars, num_reviews, is_open)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?
            .execute(params![
                record.business_id,
                record.name,
                record.address,
                record.state,
                record.city,
                record.postal_code,
                record.stars,
                record.review_count,
                record.is_open(),
            ])?;
        self.report.add("business", 1);

        for name in record.category_names() {
            let category_id = self.resolve_category(&name)?;
            self.link_category(&record.business_id, category_id)?;
        }

        Ok(())
    }

    /// Look a category up by name, inserting it when absent
    pub fn resolve_category(&mut self, name: &str) -> Result<i64> {
        let existing: Option<i64> = self
            .tx
            .prepare_cached("SELECT category_id FROM category WHERE name = ?1")?
            .query_row([name], |row| row.get(0))
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        self.tx
            .prepare_cached("INSERT INTO category (name) VALUES (?1)")?
            .execute([name])?;
        let id = self.tx.last_insert_rowid();
        debug!("New category {:?} -> {}", name, id);
        self.report.add("category", 1);

        Ok(id)
    }

    /// Associate a business with a category. Returns false when the pair
    /// already existed.
    pub fn link_category(&mut self, business_id: &str, category_id: i64) -> Result<bool> {
        let inserted = self
            .tx
            .prepare_cached(
                "INSERT OR IGNORE INTO business_category (business_id, category_id)
                 VALUES (?1, ?2)",
            )?
            .execute(params![business_id, category_id])?;

        if inserted > 0 {
            self.report.add("business_category", 1);
        }
        Ok(inserted > 0)
    }

    pub fn insert_review(&mut self, record: &ReviewRecord) -> Result<()> {
        self.tx
            .prepare_cached(
                "INSERT INTO review (review_id, business_id, stars, text) VALUES (?1, ?2, ?3, ?4)",
            )?
            .execute(params![
                record.review_id,
                record.business_id,
                record.stars,
                record.text
            ])?;
        self.report.add("review", 1);
        Ok(())
    }

    pub fn insert_user(&mut self, record: &UserRecord) -> Result<()> {
        self.tx
            .prepare_cached("INSERT INTO yelp_user (user_id, review_count) VALUES (?1, ?2)")?
            .execute(params![record.user_id, record.review_count])?;
        self.report.add("yelp_user", 1);
        Ok(())
    }

    /// One row per (day, hour) bucket
    pub fn insert_checkin(&mut self, record: &CheckinRecord) -> Result<()> {
        let rows = record.flatten();
        let mut stmt = self.tx.prepare_cached(
            "INSERT INTO check_in (business_id, day, time, num_checkins) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for row in &rows {
            stmt.execute(params![record.business_id, row.day, row.time, row.count])?;
        }
        drop(stmt);

        self.report.add("check_in", rows.len() as u64);
        Ok(())
    }

    pub fn insert_zipcode_stats(&mut self, record: &ZipcodeStatsRecord) -> Result<()> {
        self.tx
            .prepare_cached(
                "INSERT INTO zipcode_stats (zipcode, population, average_income)
                 VALUES (?1, ?2, ?3)",
            )?
            .execute(params![
                record.zipcode,
                record.population,
                record.average_income
            ])?;
        self.report.add("zipcode_stats", 1);
        Ok(())
    }

    /// Parse one feed line and issue its inserts
    pub fn apply_line(&mut self, feed: Feed, line: &str) -> Result<()> {
        match feed {
            Feed::Business => self.insert_business(&parse_record(line)?),
            Feed::Review => self.insert_review(&parse_record(line)?),
            Feed::User => self.insert_user(&parse_record(line)?),
            Feed::Checkin => self.insert_checkin(&parse_record(line)?),
            Feed::ZipcodeStats => self.insert_zipcode_stats(&parse_record(line)?),
        }
    }

    /// Load every line of a feed file. The first failing line aborts with
    /// the file name and line number attached.
    pub fn load_feed(&mut self, feed: Feed, path: &Path, ui: &mut impl Ui) -> Result<u64> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| feed.to_string());

        let total = count_lines(path)?;
        ui.log(format!("Parsing {}...", file_name));

        let reader = BufReader::new(File::open(path)?);
        let mut count: u64 = 0;

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::from(e).at_line(&file_name, idx + 1))?;
            if line.trim().is_empty() {
                continue;
            }

            self.apply_line(feed, &line)
                .map_err(|e| e.at_line(&file_name, idx + 1))?;
            count += 1;

            if count % PROGRESS_INTERVAL == 0 {
                ui.set_progress(count, total, &file_name);
            }
        }

        ui.set_progress(count, total, &file_name);
        ui.clear_progress();
        ui.log(format!("Parsed {} lines", count));

        self.report.feeds.push(FeedSummary {
            feed,
            file: path.to_path_buf(),
            lines: Some(count),
        });

        Ok(count)
    }

    fn skip_feed(&mut self, feed: Feed, path: &Path) {
        self.report.feeds.push(FeedSummary {
            feed,
            file: path.to_path_buf(),
            lines: None,
        });
    }

    /// Commit the whole batch
    pub fn commit(self) -> Result<LoadReport> {
        self.tx.commit()?;
        Ok(self.report)
    }
}

fn count_lines(path: &Path) -> Result<u64> {
    Ok(BufReader::new(File::open(path)?).lines().count() as u64)
}

/// Resolve feed paths, failing on a missing required feed before anything
/// is written
pub fn resolve_feeds(input_dir: &Path, feeds: &FeedConfig) -> Result<Vec<(Feed, PathBuf, bool)>> {
    Feed::ALL
        .iter()
        .map(|&feed| {
            let path = input_dir.join(feed.file_name(feeds));
            let present = path.is_file();
            if feed.required() && !present {
                return Err(Error::MissingFeed(path));
            }
            Ok((feed, path, present))
        })
        .collect()
}

/// Load all feeds from `input_dir` in one transaction
pub fn load_dataset(
    db: &DatabaseConfig,
    input_dir: &Path,
    feeds: &FeedConfig,
    fresh: bool,
    ui: &mut impl Ui,
) -> Result<LoadReport> {
    let sources = resolve_feeds(input_dir, feeds)?;

    ui.set_phase(Phase::Preparing);
    let mut writer = SqliteWriter::open(db, fresh)?;
    writer.create_tables()?;

    ui.set_phase(Phase::Loading);
    let mut session = writer.begin()?;
    for (feed, path, present) in &sources {
        if *present {
            session.load_feed(*feed, path, ui)?;
        } else {
            ui.log(format!("{}: skipped (file not found)", path.display()));
            session.skip_feed(*feed, path);
        }
    }

    ui.set_phase(Phase::Committing);
    let report = session.commit()?;
    ui.set_phase(Phase::Complete);

    info!(
        "Loaded {} rows into {}",
        report.total_rows(),
        db.path().display()
    );
    Ok(report)
}
