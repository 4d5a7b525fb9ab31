use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;

/// Parse one JSON line into a typed record
pub fn parse_record<T: DeserializeOwned>(line: &str) -> Result<T> {
    Ok(serde_json::from_str(line)?)
}

/// One line of the business feed
#[derive(Debug, Clone, Deserialize)]
pub struct BusinessRecord {
    pub business_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub address: String,
    pub state: String,
    pub city: String,
    pub postal_code: String,
    pub stars: f64,
    pub review_count: i64,
    /// 1 (or `true`) for open; any other value is closed
    #[serde(default)]
    pub is_open: Value,
    #[serde(default)]
    pub categories: Option<Categories>,
}

impl BusinessRecord {
    pub fn is_open(&self) -> bool {
        match &self.is_open {
            Value::Bool(open) => *open,
            Value::Number(n) => n.as_f64() == Some(1.0),
            _ => false,
        }
    }

    /// Category names in source order, trimmed, without empties
    pub fn category_names(&self) -> Vec<String> {
        match &self.categories {
            None => Vec::new(),
            Some(Categories::List(names)) => names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Categories::Joined(joined)) => joined
                .split(',')
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Older dumps list categories as an array, newer ones as "A, B, C"
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Categories {
    List(Vec<String>),
    Joined(String),
}

/// One line of the review feed
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRecord {
    pub review_id: String,
    pub business_id: String,
    pub stars: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
}

/// One line of the user feed; everything except the id and count is dropped
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub review_count: i64,
}

/// One line of the check-in feed: `time` maps day -> hour -> count
#[derive(Debug, Clone, Deserialize)]
pub struct CheckinRecord {
    pub business_id: String,
    pub time: BTreeMap<String, BTreeMap<String, i64>>,
}

/// A single (day, hour, count) bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckinRow {
    pub day: String,
    pub time: String,
    pub count: i64,
}

impl CheckinRecord {
    /// Flatten the nested day/hour map into one row per bucket
    pub fn flatten(&self) -> Vec<CheckinRow> {
        self.time
            .iter()
            .flat_map(|(day, hours)| {
                hours.iter().map(move |(hour, count)| CheckinRow {
                    day: day.clone(),
                    time: hour.clone(),
                    count: *count,
                })
            })
            .collect()
    }
}

/// One line of the optional zipcode statistics feed
#[derive(Debug, Clone, Deserialize)]
pub struct ZipcodeStatsRecord {
    pub zipcode: String,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default)]
    pub average_income: Option<f64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
