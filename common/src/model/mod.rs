pub mod category;
pub mod csv;
pub mod product;
pub mod validation;
