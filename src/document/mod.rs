//! Goods-tracking registration documents.
//!
//! Documents are validated once, when built or deserialized. Anything that
//! reaches the submission pipeline has already passed these checks.

mod model;
mod validate;

pub use model::{
    Document, DocumentBuilder, Product, ProductBuilder, ProductionType, DEFAULT_DOC_TYPE,
};
pub use validate::{parse_date, validate_inn, validate_tnved_code, DATE_FORMAT};
