use anyhow::{Context, Result};
use serde::Serialize;
use std::io::IsTerminal;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use yelp_explorer::{
    cli::{Cli, Commands},
    config::Config,
    explorer::{BusinessRow, Catalog, SearchFilter, SqliteCatalog, RESULT_COLUMNS},
    schema::creation_order,
    ui::ExplorerApp,
    writer::{load_dataset, LoadReport},
    ConsoleUi, SilentUi,
};

fn main() {
    let cli = Cli::parse_args();
    init_logging(&cli);

    // Printed directly: the explorer routes tracing to a sink, and by now
    // the terminal has been restored
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // The explorer owns the terminal; log lines would corrupt the screen
    if matches!(cli.command, Commands::Explore { .. }) {
        builder.with_writer(std::io::sink).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    match &cli.command {
        Commands::Load {
            input_dir, fresh, ..
        } => {
            let start = Instant::now();
            let (db, feeds) = (&config.database, &config.feeds);
            let loaded = if std::io::stderr().is_terminal() {
                load_dataset(db, input_dir, feeds, *fresh, &mut ConsoleUi::new())
            } else {
                load_dataset(db, input_dir, feeds, *fresh, &mut SilentUi::new())
            };
            let report = loaded.context("Load aborted, nothing was committed")?;

            if cli.json {
                print_json(&report)?;
            } else {
                print_report(&report);
                println!(
                    "\nCreated {:?} ({} rows) in {:.1}s",
                    config.database.path(),
                    report.total_rows(),
                    start.elapsed().as_secs_f64()
                );
            }
        }

        Commands::Explore { .. } => {
            let catalog = open_catalog(&config)?;
            ExplorerApp::new(catalog, config.explorer.top_category_threshold)?.run()?;
        }

        Commands::States => {
            let states = open_catalog(&config)?.states()?;
            print_list(&states, cli.json)?;
        }

        Commands::Cities { state } => {
            let cities = open_catalog(&config)?.cities(state)?;
            print_list(&cities, cli.json)?;
        }

        Commands::Zipcodes { state, city } => {
            let zipcodes = open_catalog(&config)?.zipcodes(state, city)?;
            print_list(&zipcodes, cli.json)?;
        }

        Commands::Categories {
            state,
            city,
            zipcode,
        } => {
            let categories = open_catalog(&config)?.categories(state, city, zipcode)?;
            print_list(&categories, cli.json)?;
        }

        Commands::Search {
            state,
            city,
            zipcode,
            category,
        } => {
            let rows = open_catalog(&config)?.businesses(&SearchFilter {
                state: state.clone(),
                city: city.clone(),
                zipcode: zipcode.clone(),
                category: category.clone(),
            })?;
            if cli.json {
                print_json(&rows)?;
            } else {
                print_businesses(&rows);
            }
        }

        Commands::Stats { zipcode } => {
            let summary = open_catalog(&config)?.zip_summary(zipcode)?;
            if cli.json {
                print_json(&summary)?;
            } else {
                println!("Zipcode:        {}", summary.zipcode);
                println!("Businesses:     {}", summary.business_count);
                println!("Population:     {}", summary.population_display());
                println!("Average income: {}", summary.income_display());
            }
        }

        Commands::TopCategories { zipcode, .. } => {
            let threshold = config.explorer.top_category_threshold;
            let top = open_catalog(&config)?.top_categories(zipcode, threshold)?;
            if cli.json {
                print_json(&top)?;
            } else {
                println!("Categories with at least {} businesses:\n", threshold);
                for category in top {
                    println!("  {:>5}  {}", category.count, category.name);
                }
            }
        }

        Commands::Tables => {
            println!("Tables:\n");
            for table in creation_order()? {
                println!("  {}", table.name);
            }
        }
    }

    Ok(())
}

fn open_catalog(config: &Config) -> Result<SqliteCatalog> {
    SqliteCatalog::open(&config.database)
        .with_context(|| format!("Failed to open {:?}", config.database.path()))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_list(items: &[String], json: bool) -> Result<()> {
    if json {
        return print_json(&items);
    }
    for item in items {
        println!("{}", item);
    }
    Ok(())
}

fn print_report(report: &LoadReport) {
    for feed in &report.feeds {
        match feed.lines {
            Some(lines) => println!("  {:<14} {:>10} lines  {:?}", feed.feed, lines, feed.file),
            None => println!("  {:<14} {:>10}        {:?}", feed.feed, "skipped", feed.file),
        }
    }
    println!();
    for (table, rows) in &report.rows {
        println!("  {:<18} {:>10} rows", table, rows);
    }
}

fn print_businesses(rows: &[BusinessRow]) {
    let cells: Vec<[String; 7]> = rows.iter().map(BusinessRow::cells).collect();

    let mut widths = RESULT_COLUMNS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |values: Vec<&str>| {
        values
            .iter()
            .zip(widths)
            .map(|(v, w)| format!("{:<w$}", v, w = w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(RESULT_COLUMNS.to_vec()));
    for row in &cells {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
    println!("\n{} businesses", rows.len());
}
