//! Integration tests that load small feed files into a scratch database and
//! browse the result through the explorer.
//!
//! Run with:
//! ```sh
//! cargo test --test integration_test
//! ```

use once_cell::sync::Lazy;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

use yelp_explorer::config::{DatabaseConfig, FeedConfig};
use yelp_explorer::explorer::{Catalog, Event, ExplorerState, SearchFilter, SqliteCatalog, Stage};
use yelp_explorer::ui::SilentUi;
use yelp_explorer::writer::{load_dataset, LoadReport};
use yelp_explorer::Error;

// =============================================================================
// Test Configuration
// =============================================================================

/// Random seed for reproducible check-in shapes
const RANDOM_SEED: u64 = 42;

const ZIP: &str = "99163";

fn business(id: &str, name: &str, zipcode: &str, categories: &[&str]) -> Value {
    json!({
        "business_id": id,
        "name": name,
        "address": format!("{} Main St", id),
        "state": "WA",
        "city": "Pullman",
        "postal_code": zipcode,
        "stars": 4.0,
        "review_count": 2,
        "is_open": 1,
        "categories": categories,
    })
}

/// Pullman sample: six pizza places, one cafe-bakery, one unreviewed diner
static BUSINESSES: Lazy<Vec<Value>> = Lazy::new(|| {
    let mut rows = vec![
        business("cafe", "Brewed Awakening", ZIP, &["Coffee", "Bakery"]),
        json!({
            "business_id": "diner",
            "name": "Cougar Diner",
            "state": "WA",
            "city": "Pullman",
            "postal_code": ZIP,
            "stars": 3.0,
            "review_count": 0,
            "is_open": 0,
        }),
        business("moscow", "Moscow Bagel", "83843", &["Bakery"]),
    ];
    for i in 0..6 {
        rows.push(business(
            &format!("pizza{}", i),
            &format!("Pizza Place {}", i),
            ZIP,
            &["Pizza", "Restaurants"],
        ));
    }
    rows
});

static REVIEWS: Lazy<Vec<Value>> = Lazy::new(|| {
    vec![
        json!({"review_id": "r1", "business_id": "cafe", "stars": 5, "text": "Great \"latte\"\nwould return"}),
        json!({"review_id": "r2", "business_id": "cafe", "stars": 4, "text": "It's fine"}),
        json!({"review_id": "r3", "business_id": "cafe", "stars": 4, "text": null}),
    ]
});

static USERS: Lazy<Vec<Value>> = Lazy::new(|| {
    vec![
        json!({"user_id": "u1", "name": "Ryan", "review_count": 3, "friends": ["u2"]}),
        json!({"user_id": "u2", "name": "Stef", "review_count": 0}),
    ]
});

static CHECKINS: Lazy<Vec<Value>> = Lazy::new(|| {
    vec![json!({
        "business_id": "cafe",
        "time": {"Monday": {"7:00": 4, "8:00": 6}, "Saturday": {"10:00": 2}}
    })]
});

// =============================================================================
// Fixture Utilities
// =============================================================================

struct Fixture {
    dir: TempDir,
    feeds: FeedConfig,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
            feeds: FeedConfig::default(),
        };
        fixture.write(&fixture.feeds.business, &BUSINESSES);
        fixture.write(&fixture.feeds.review, &REVIEWS);
        fixture.write(&fixture.feeds.user, &USERS);
        fixture.write(&fixture.feeds.checkin, &CHECKINS);
        fixture
    }

    fn write(&self, file: &str, rows: &[Value]) {
        let lines: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        self.write_raw(file, &(lines.join("\n") + "\n"));
    }

    fn write_raw(&self, file: &str, content: &str) {
        std::fs::write(self.dir.path().join(file), content).expect("Failed to write feed");
    }

    fn input_dir(&self) -> &Path {
        self.dir.path()
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join("yelp.db")
    }

    fn db_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            database: self.db_path().to_string_lossy().into_owned(),
            ..DatabaseConfig::default()
        }
    }

    fn load(&self, fresh: bool) -> Result<LoadReport, Error> {
        load_dataset(
            &self.db_config(),
            self.input_dir(),
            &self.feeds,
            fresh,
            &mut SilentUi::new(),
        )
    }

    fn connection(&self) -> Connection {
        Connection::open(self.db_path()).expect("Failed to open test database")
    }

    fn catalog(&self) -> SqliteCatalog {
        SqliteCatalog::open(&self.db_config()).expect("Failed to open catalog")
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

fn pullman(category: Option<&str>) -> SearchFilter {
    SearchFilter {
        state: "WA".into(),
        city: "Pullman".into(),
        zipcode: ZIP.into(),
        category: category.map(String::from),
    }
}

// =============================================================================
// Loader Tests
// =============================================================================

#[test]
fn test_load_counts() {
    let fixture = Fixture::new();
    let report = fixture.load(false).unwrap();

    assert_eq!(report.rows("business"), 9);
    assert_eq!(report.rows("review"), 3);
    assert_eq!(report.rows("yelp_user"), 2);
    assert_eq!(report.rows("check_in"), 3);
    assert_eq!(report.feeds.len(), 5);
    assert_eq!(report.feeds[4].lines, None, "zipcode stats feed was absent");

    let conn = fixture.connection();
    assert_eq!(count(&conn, "business"), 9);
    assert_eq!(count(&conn, "review"), 3);
    assert_eq!(count(&conn, "yelp_user"), 2);
    assert_eq!(count(&conn, "check_in"), 3);
    assert_eq!(count(&conn, "zipcode_stats"), 0);
}

#[test]
fn test_text_is_stored_verbatim() {
    let fixture = Fixture::new();
    fixture.load(false).unwrap();

    let text: String = fixture
        .connection()
        .query_row("SELECT text FROM review WHERE review_id = 'r1'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(text, "Great \"latte\"\nwould return");

    let text: String = fixture
        .connection()
        .query_row("SELECT text FROM review WHERE review_id = 'r3'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(text, "");
}

#[test]
fn test_category_resolution_is_idempotent() {
    let fixture = Fixture::new();
    fixture.load(false).unwrap();
    let conn = fixture.connection();

    // Bakery is shared by cafe and moscow; Pizza by six businesses
    assert_eq!(count(&conn, "category"), 4);
    let bakery_links: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM business_category bc
             JOIN category c ON c.category_id = bc.category_id
             WHERE c.name = 'Bakery'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(bakery_links, 2);
    assert_eq!(count(&conn, "business_category"), 2 + 1 + 6 * 2);
}

#[test]
fn test_repeated_category_on_one_business() {
    let fixture = Fixture::new();
    fixture.write(
        &fixture.feeds.business,
        &[business("twice", "Double Shot", ZIP, &["Coffee", "Coffee"])],
    );
    fixture.write(&fixture.feeds.review, &[]);
    fixture.write(&fixture.feeds.checkin, &[]);
    fixture.load(false).unwrap();

    let conn = fixture.connection();
    assert_eq!(count(&conn, "category"), 1);
    assert_eq!(count(&conn, "business_category"), 1);
}

#[test]
fn test_is_open_mapping() {
    let fixture = Fixture::new();
    fixture.load(false).unwrap();
    let conn = fixture.connection();

    let is_open = |id: &str| -> bool {
        conn.query_row(
            "SELECT is_open FROM business WHERE business_id = ?1",
            [id],
            |r| r.get(0),
        )
        .unwrap()
    };
    assert!(is_open("cafe"));
    assert!(!is_open("diner"));
}

#[test]
fn test_missing_address_defaults_to_empty() {
    let fixture = Fixture::new();
    fixture.load(false).unwrap();
    let address: String = fixture
        .connection()
        .query_row(
            "SELECT address FROM business WHERE business_id = 'diner'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(address, "");
}

#[test]
fn test_checkin_flattening_shapes() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(RANDOM_SEED);
    let days = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

    for _ in 0..5 {
        let n_days = rng.gen_range(1..=days.len());
        let n_hours = rng.gen_range(1..=24);

        let mut time = serde_json::Map::new();
        for day in &days[..n_days] {
            let hours: serde_json::Map<String, Value> = (0..n_hours)
                .map(|h| (format!("{}:00", h), json!(h + 1)))
                .collect();
            time.insert(day.to_string(), Value::Object(hours));
        }

        let fixture = Fixture::new();
        fixture.write(
            &fixture.feeds.checkin,
            &[json!({"business_id": "cafe", "time": time})],
        );
        fixture.load(false).unwrap();

        let conn = fixture.connection();
        assert_eq!(count(&conn, "check_in"), (n_days * n_hours) as i64);

        let (day, count): (String, i64) = conn
            .query_row(
                "SELECT day, num_checkins FROM check_in WHERE time = '0:00' ORDER BY day LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert!(days[..n_days].contains(&day.as_str()));
        assert_eq!(count, 1);
    }
}

#[test]
fn test_malformed_last_feed_rolls_back_everything() {
    let fixture = Fixture::new();
    fixture.write_raw(
        &fixture.feeds.checkin,
        &format!("{}\n{{\"business_id\": \"cafe\", \"time\": \n", CHECKINS[0]),
    );

    let err = fixture.load(false).unwrap_err();
    match &err {
        Error::Feed { file, line, .. } => {
            assert_eq!(file, "yelp_checkin.JSON");
            assert_eq!(*line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    let conn = fixture.connection();
    for table in ["business", "category", "business_category", "review", "yelp_user", "check_in"] {
        assert_eq!(count(&conn, table), 0, "{} should be empty", table);
    }
}

#[test]
fn test_reload_conflicts_and_keeps_first_load() {
    let fixture = Fixture::new();
    fixture.load(false).unwrap();

    let err = fixture.load(false).unwrap_err();
    assert!(matches!(err, Error::Feed { .. }));

    let conn = fixture.connection();
    assert_eq!(count(&conn, "business"), 9);
    assert_eq!(count(&conn, "review"), 3);
}

#[test]
fn test_fresh_reload() {
    let fixture = Fixture::new();
    fixture.load(false).unwrap();
    fixture.load(true).unwrap();
    assert_eq!(count(&fixture.connection(), "business"), 9);
}

#[test]
fn test_missing_required_feed_writes_nothing() {
    let fixture = Fixture::new();
    std::fs::remove_file(fixture.input_dir().join(&fixture.feeds.user)).unwrap();

    assert!(matches!(fixture.load(false), Err(Error::MissingFeed(_))));
    assert!(!fixture.db_path().exists());
}

#[test]
fn test_unreachable_database() {
    let fixture = Fixture::new();
    let db = DatabaseConfig {
        database: fixture
            .input_dir()
            .join("no/such/dir/yelp.db")
            .to_string_lossy()
            .into_owned(),
        ..DatabaseConfig::default()
    };
    let result = load_dataset(
        &db,
        fixture.input_dir(),
        &fixture.feeds,
        false,
        &mut SilentUi::new(),
    );
    assert!(matches!(result, Err(Error::Database(_))));
}

// =============================================================================
// Explorer Tests
// =============================================================================

#[test]
fn test_result_aggregates() {
    let fixture = Fixture::new();
    fixture.load(false).unwrap();
    let rows = fixture.catalog().businesses(&pullman(None)).unwrap();

    let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted, "rows are ordered by name");
    assert_eq!(rows.len(), 8);

    let cafe = rows.iter().find(|r| r.business_id == "cafe").unwrap();
    assert_eq!(cafe.review_count, 3);
    assert_eq!(cafe.rating_display(), "4.3");
    assert_eq!(cafe.num_checkins, 12);

    let diner = rows.iter().find(|r| r.business_id == "diner").unwrap();
    assert_eq!(diner.review_count, 0);
    assert_eq!(diner.rating_display(), "N/A");
    assert_eq!(diner.num_checkins, 0);
}

#[test]
fn test_top_categories_scenario() {
    let fixture = Fixture::new();
    fixture.load(false).unwrap();
    let catalog = fixture.catalog();

    let categories = catalog.categories("WA", "Pullman", ZIP).unwrap();
    assert!(categories.contains(&"Coffee".to_string()));
    assert!(categories.contains(&"Bakery".to_string()));

    let top = catalog.top_categories(ZIP, 5).unwrap();
    let names: Vec<_> = top.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Pizza", "Restaurants"]);
    assert!(top.iter().all(|c| c.count == 6));
}

#[test]
fn test_zip_summary_with_and_without_stats() {
    let fixture = Fixture::new();
    fixture.write(
        &fixture.feeds.zipcode_stats,
        &[json!({"zipcode": ZIP, "population": 31359, "average_income": 27120.0})],
    );
    let report = fixture.load(false).unwrap();
    assert_eq!(report.rows("zipcode_stats"), 1);

    let catalog = fixture.catalog();
    let summary = catalog.zip_summary(ZIP).unwrap();
    assert_eq!(summary.business_count, 8);
    assert_eq!(summary.population, Some(31359));
    assert_eq!(summary.income_display(), "27120.00");

    let moscow = catalog.zip_summary("83843").unwrap();
    assert_eq!(moscow.business_count, 1);
    assert_eq!(moscow.population_display(), "N/A");
}

#[test]
fn test_cascade_against_loaded_database() {
    let fixture = Fixture::new();
    fixture.load(false).unwrap();
    let catalog = fixture.catalog();

    let state = ExplorerState::new(&catalog, 5).unwrap();
    assert_eq!(state.states.options, vec!["WA"]);

    let state = state.apply(Event::SelectState("WA".into()), &catalog).unwrap();
    assert_eq!(state.cities.options, vec!["Pullman"]);

    let state = state.apply(Event::SelectCity("Pullman".into()), &catalog).unwrap();
    assert_eq!(state.zipcodes.options, vec!["83843", "99163"]);

    let state = state.apply(Event::SelectZip(ZIP.into()), &catalog).unwrap();
    assert_eq!(state.stage(), Stage::ZipChosen);
    assert_eq!(state.top_categories.len(), 2);
    assert!(!state.top_categories.iter().any(|c| c.name == "Coffee"));

    let state = state.apply(Event::SelectCategory("Coffee".into()), &catalog).unwrap();
    assert_eq!(state.results.len(), 1);
    assert_eq!(state.results[0].name, "Brewed Awakening");

    let state = state.apply(Event::SelectCity("Pullman".into()), &catalog).unwrap();
    assert_eq!(state.stage(), Stage::CityChosen);
    assert!(state.results.is_empty());
    assert!(state.top_categories.is_empty());

    let state = state
        .apply(Event::SelectZip(ZIP.into()), &catalog)
        .unwrap()
        .apply(Event::Search, &catalog)
        .unwrap();
    assert_eq!(state.results.len(), 8);
}

#[test]
fn test_catalog_rejects_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = DatabaseConfig {
        database: dir.path().join("absent.db").to_string_lossy().into_owned(),
        ..DatabaseConfig::default()
    };
    assert!(SqliteCatalog::open(&db).is_err());
}

// =============================================================================
// Binary Tests
// =============================================================================

fn explore(database: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_yelp-explorer"))
        .arg("--database")
        .arg(database)
        .arg("explore")
        .env_remove("YELP_DB_HOST")
        .env_remove("YELP_DB_NAME")
        .env_remove("YELP_DB_USER")
        .env_remove("YELP_DB_PASSWORD")
        .output()
        .expect("Failed to run yelp-explorer")
}

#[test]
fn test_explore_reports_unopenable_database() {
    let dir = tempfile::tempdir().unwrap();
    let output = explore(&dir.path().join("no/such/dir/yelp.db"));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Failed to open"), "stderr: {}", stderr);
}

#[test]
fn test_explore_reports_unloaded_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("empty.db");
    Connection::open(&db).unwrap();

    let output = explore(&db);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no such table"), "stderr: {}", stderr);
}
