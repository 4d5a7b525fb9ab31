//! Default values for configuration

/// Default database file name
pub fn default_database() -> String {
    "yelp.db".to_string()
}

/// Minimum number of businesses a category needs in a zipcode to be listed
/// among that zipcode's top categories
pub fn default_top_category_threshold() -> u32 {
    5
}

pub fn default_business_feed() -> String {
    "yelp_business.JSON".to_string()
}

pub fn default_review_feed() -> String {
    "yelp_review.JSON".to_string()
}

pub fn default_user_feed() -> String {
    "yelp_user.JSON".to_string()
}

pub fn default_checkin_feed() -> String {
    "yelp_checkin.JSON".to_string()
}

pub fn default_zipcode_stats_feed() -> String {
    "yelp_zipcode_stats.JSON".to_string()
}
