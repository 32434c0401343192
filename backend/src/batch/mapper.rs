use crate::error::ImportError;
use common::model::category::Category;
use common::model::csv::{CategoryRecord, ProductRecord};
use common::model::product::Product;

/// Turns one decoded record into an entity ready to be written.
pub trait ItemMapper<I> {
    type Output;

    fn map(&self, item: &I) -> Result<Self::Output, ImportError>;
}

/// Resolves a category by id while products are being mapped.
pub trait CategoryLookup {
    fn find_category_by_id(&self, id: i64) -> Result<Option<Category>, ImportError>;
}

/// Copies the three columns of a category line. Never fails and never touches
/// the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryMapper;

impl ItemMapper<CategoryRecord> for CategoryMapper {
    type Output = Category;

    fn map(&self, item: &CategoryRecord) -> Result<Category, ImportError> {
        Ok(Category::new(item.id, &item.name, &item.description))
    }
}

/// Binds a product line to its stored category.
pub struct ProductMapper<'a, L: ?Sized> {
    lookup: &'a L,
}

impl<'a, L: CategoryLookup + ?Sized> ProductMapper<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }
}

impl<L: CategoryLookup + ?Sized> ItemMapper<ProductRecord> for ProductMapper<'_, L> {
    type Output = Product;

    fn map(&self, item: &ProductRecord) -> Result<Product, ImportError> {
        let category = self
            .lookup
            .find_category_by_id(item.category_id)?
            .ok_or(ImportError::CategoryNotFound(item.category_id))?;

        Ok(Product::new(
            item.id,
            &item.name,
            &item.description,
            item.price,
            category,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapLookup {
        categories: HashMap<i64, Category>,
        calls: RefCell<Vec<i64>>,
    }

    impl CategoryLookup for MapLookup {
        fn find_category_by_id(&self, id: i64) -> Result<Option<Category>, ImportError> {
            self.calls.borrow_mut().push(id);
            Ok(self.categories.get(&id).cloned())
        }
    }

    fn product_record(category_id: i64) -> ProductRecord {
        ProductRecord {
            id: 10,
            name: "Dune".into(),
            description: "Frank Herbert novel".into(),
            price: 19.99,
            category_id,
        }
    }

    #[test]
    fn category_fields_are_copied_verbatim() {
        let record = CategoryRecord {
            id: 7,
            name: " Books ".into(),
            description: "Printed and digital books".into(),
        };

        let category = CategoryMapper.map(&record).unwrap();

        assert_eq!(
            category,
            Category::new(7, " Books ", "Printed and digital books")
        );
    }

    #[test]
    fn product_is_bound_to_resolved_category() {
        let books = Category::new(1, "Books", "Printed and digital books");
        let lookup = MapLookup {
            categories: HashMap::from([(1, books.clone())]),
            ..Default::default()
        };

        let product = ProductMapper::new(&lookup).map(&product_record(1)).unwrap();

        assert_eq!(product.category, books);
        assert_eq!(product.price, 19.99);
        assert_eq!(*lookup.calls.borrow(), vec![1]);
    }

    #[test]
    fn unknown_category_carries_missing_id() {
        let lookup = MapLookup::default();

        let err = ProductMapper::new(&lookup)
            .map(&product_record(42))
            .unwrap_err();

        assert!(matches!(err, ImportError::CategoryNotFound(42)));
        assert_eq!(err.to_string(), "referenced category not found: 42");
    }
}
