use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "yelp-explorer")]
#[command(version, about = "Load the Yelp dataset into SQLite and browse it")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection options; each overrides the config file
#[derive(Args, Debug, Default)]
pub struct DatabaseArgs {
    /// Directory holding the database file
    #[arg(long, global = true, env = "YELP_DB_HOST")]
    pub host: Option<String>,

    /// Database file
    #[arg(long, global = true, env = "YELP_DB_NAME")]
    pub database: Option<String>,

    /// Database user (ignored by SQLite)
    #[arg(long, global = true, env = "YELP_DB_USER")]
    pub user: Option<String>,

    /// Database password (ignored by SQLite)
    #[arg(long, global = true, env = "YELP_DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the JSON feeds into the database in one transaction
    Load {
        /// Directory containing the feed files
        input_dir: PathBuf,

        /// Delete an existing database file first
        #[arg(long)]
        fresh: bool,

        /// Business feed file name
        #[arg(long)]
        business_file: Option<String>,

        /// Review feed file name
        #[arg(long)]
        review_file: Option<String>,

        /// User feed file name
        #[arg(long)]
        user_file: Option<String>,

        /// Check-in feed file name
        #[arg(long)]
        checkin_file: Option<String>,

        /// Zipcode statistics feed file name (optional feed)
        #[arg(long)]
        zipcode_stats_file: Option<String>,
    },

    /// Browse businesses interactively
    Explore {
        /// Minimum businesses for a top category
        #[arg(short, long)]
        threshold: Option<u32>,
    },

    /// List states
    States,

    /// List cities in a state
    Cities { state: String },

    /// List zipcodes in a city
    Zipcodes { state: String, city: String },

    /// List categories in a zipcode
    Categories {
        state: String,
        city: String,
        zipcode: String,
    },

    /// List businesses in a zipcode, optionally filtered by category
    Search {
        state: String,
        city: String,
        zipcode: String,

        #[arg(long)]
        category: Option<String>,
    },

    /// Show business count, population and income for a zipcode
    Stats { zipcode: String },

    /// Show the most common categories in a zipcode
    TopCategories {
        zipcode: String,

        /// Minimum businesses for a top category
        #[arg(short, long)]
        threshold: Option<u32>,
    },

    /// List all table names in creation order
    Tables,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Apply command-line and environment overrides on top of file config
    pub fn apply_overrides(&self, config: &mut Config) {
        let db = &mut config.database;
        if let Some(host) = &self.database.host {
            db.host = Some(host.clone());
        }
        if let Some(database) = &self.database.database {
            db.database = database.clone();
        }
        if let Some(user) = &self.database.user {
            db.user = Some(user.clone());
        }
        if let Some(password) = &self.database.password {
            db.password = Some(password.clone());
        }

        match &self.command {
            Commands::Load {
                business_file,
                review_file,
                user_file,
                checkin_file,
                zipcode_stats_file,
                ..
            } => {
                let feeds = &mut config.feeds;
                let overrides = [
                    (&mut feeds.business, business_file),
                    (&mut feeds.review, review_file),
                    (&mut feeds.user, user_file),
                    (&mut feeds.checkin, checkin_file),
                    (&mut feeds.zipcode_stats, zipcode_stats_file),
                ];
                for (target, value) in overrides {
                    if let Some(value) = value {
                        *target = value.clone();
                    }
                }
            }
            Commands::Explore {
                threshold: Some(threshold),
            }
            | Commands::TopCategories {
                threshold: Some(threshold),
                ..
            } => {
                config.explorer.top_category_threshold = *threshold;
            }
            _ => {}
        }
    }
}
