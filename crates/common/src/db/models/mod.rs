//! SeaORM entity models
//!
//! Database entities for PdfQuery

mod document;

pub use document::{
    Entity as DocumentEntity,
    Model as Document,
    ActiveModel as DocumentActiveModel,
    Column as DocumentColumn,
};
