use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// Minimum number of characters a category description must hold.
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// A catalog category as stored in the `categories` table.
///
/// The id is assigned by the import file, never generated. A category does not
/// carry its products: that direction is answered by
/// `ProductRepository::find_by_category_id`, so serializing a category never
/// recurses into products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl Category {
    pub fn new(id: i64, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
        }
    }

    /// Checks the column constraints enforced at write time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankName {
                entity: "category",
                id: self.id,
            });
        }
        let actual = self.description.chars().count();
        if actual < MIN_DESCRIPTION_LEN {
            return Err(ValidationError::DescriptionTooShort {
                id: self.id,
                min: MIN_DESCRIPTION_LEN,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_named_category_with_long_description() {
        let category = Category::new(1, "Books", "Printed and digital books");
        assert_eq!(category.validate(), Ok(()));
    }

    #[test]
    fn rejects_blank_name() {
        let category = Category::new(2, "   ", "Printed and digital books");
        assert_eq!(
            category.validate(),
            Err(ValidationError::BlankName {
                entity: "category",
                id: 2
            })
        );
    }

    #[test]
    fn description_length_counts_characters_not_bytes() {
        // 10 characters, 11 bytes
        let category = Category::new(3, "Jardín", "jardinería");
        assert_eq!(category.validate(), Ok(()));

        let short = Category::new(4, "Toys", "Fun stuff");
        assert_eq!(
            short.validate(),
            Err(ValidationError::DescriptionTooShort {
                id: 4,
                min: MIN_DESCRIPTION_LEN,
                actual: 9
            })
        );
    }
}
