use thiserror::Error;

/// Constraint violations detected on a catalog entity before it is persisted.
///
/// Each variant carries the id of the offending entity so the failure can be
/// traced back to the source line of the import file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{entity} {id}: name must not be blank")]
    BlankName { entity: &'static str, id: i64 },

    #[error("{entity} {id}: description must not be blank")]
    BlankDescription { entity: &'static str, id: i64 },

    #[error("category {id}: description must be at least {min} characters, got {actual}")]
    DescriptionTooShort { id: i64, min: usize, actual: usize },

    #[error("product {id}: price must be greater than 0 and finite, got {price}")]
    NonPositivePrice { id: i64, price: f64 },
}
