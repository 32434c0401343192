use crate::batch::mapper::CategoryLookup;
use crate::error::{ImportError, RepositoryError};
use crate::repository::{CategoryRepository, ProductRepository};
use common::model::category::Category;
use common::model::product::Product;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS categories (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS products (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    price       REAL NOT NULL,
    category_id INTEGER NOT NULL REFERENCES categories(id)
);
CREATE INDEX IF NOT EXISTS idx_products_category_id ON products(category_id);
";

const PRODUCT_SELECT: &str = "
SELECT p.id, p.name, p.description, p.price, c.id, c.name, c.description
FROM products p
JOIN categories c ON c.id = p.category_id";

/// Opens the catalog database at `path`, enabling foreign keys and creating the
/// schema when missing.
pub fn open(path: impl AsRef<Path>) -> Result<Connection, RepositoryError> {
    let conn = Connection::open(path)?;
    init(&conn)?;
    Ok(conn)
}

pub fn init(conn: &Connection) -> Result<(), RepositoryError> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        category: Category {
            id: row.get(4)?,
            name: row.get(5)?,
            description: row.get(6)?,
        },
    })
}

pub struct SqliteCategoryRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteCategoryRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn find_by_id(&self, id: i64) -> Result<Option<Category>, RepositoryError> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name, description FROM categories WHERE id = ?1",
                params![id],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    fn find_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM categories ORDER BY id")?;
        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn save_all(&self, categories: &[Category]) -> Result<(), RepositoryError> {
        for category in categories {
            category.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO categories (id, name, description) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, description = excluded.description",
            )?;
            for category in categories {
                stmt.execute(params![category.id, category.name, category.description])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl CategoryLookup for SqliteCategoryRepository<'_> {
    fn find_category_by_id(&self, id: i64) -> Result<Option<Category>, ImportError> {
        Ok(self.find_by_id(id)?)
    }
}

pub struct SqliteProductRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteProductRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn find_by_category_id(&self, category_id: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.category_id = ?1 ORDER BY p.id");
        let mut stmt = self.conn.prepare(sql.as_str())?;
        let products = stmt
            .query_map(params![category_id], product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    fn save_all(&self, products: &[Product]) -> Result<(), RepositoryError> {
        for product in products {
            product.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO products (id, name, description, price, category_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     description = excluded.description,
                     price = excluded.price,
                     category_id = excluded.category_id",
            )?;
            for product in products {
                stmt.execute(params![
                    product.id,
                    product.name,
                    product.description,
                    product.price,
                    product.category_id()
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
