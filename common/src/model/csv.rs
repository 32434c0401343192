use serde::{Deserialize, Serialize};

/// One data line of `categories.csv`, bound positionally to [`CategoryRecord::COLUMNS`].
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl CategoryRecord {
    pub const COLUMNS: [&'static str; 3] = ["id", "name", "description"];
}

/// One data line of `products.csv`, bound positionally to [`ProductRecord::COLUMNS`].
///
/// `category_id` is the foreign key into the categories imported in the first
/// phase of the job.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category_id: i64,
}

impl ProductRecord {
    pub const COLUMNS: [&'static str; 5] = ["id", "name", "description", "price", "category_id"];
}
