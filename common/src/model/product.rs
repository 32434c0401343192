use crate::model::category::Category;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// A catalog product as stored in the `products` table.
///
/// The product owns the reference to its category (`products.category_id`);
/// it is the only direction of the relationship that gets serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
}

impl Product {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        category: Category,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            price,
            category,
        }
    }

    pub fn category_id(&self) -> i64 {
        self.category.id
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankName {
                entity: "product",
                id: self.id,
            });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::BlankDescription {
                entity: "product",
                id: self.id,
            });
        }
        // written so that NaN fails as well
        if !(self.price > 0.0 && self.price.is_finite()) {
            return Err(ValidationError::NonPositivePrice {
                id: self.id,
                price: self.price,
            });
        }
        Ok(())
    }
}
