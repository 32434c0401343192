//! Persistence seam for the catalog.
//!
//! The import pipeline only talks to these traits; `sqlite` provides the
//! implementation used by the running server, tests plug in in-memory doubles.

pub mod sqlite;

use crate::error::RepositoryError;
use common::model::category::Category;
use common::model::product::Product;

pub trait CategoryRepository {
    fn find_by_id(&self, id: i64) -> Result<Option<Category>, RepositoryError>;

    fn find_all(&self) -> Result<Vec<Category>, RepositoryError>;

    /// Validates and upserts the whole batch atomically.
    fn save_all(&self, categories: &[Category]) -> Result<(), RepositoryError>;

    fn count(&self) -> Result<u64, RepositoryError>;
}

pub trait ProductRepository {
    /// The products owned by a category, ordered by id.
    fn find_by_category_id(&self, category_id: i64) -> Result<Vec<Product>, RepositoryError>;

    /// Validates and upserts the whole batch atomically. Every referenced
    /// category must already be stored.
    fn save_all(&self, products: &[Product]) -> Result<(), RepositoryError>;

    fn count(&self) -> Result<u64, RepositoryError>;
}
