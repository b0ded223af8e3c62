//! Document entity
//!
//! One row per ingested PDF holding its full extracted text. Rows are
//! only ever inserted; the integer key is assigned by SQLite
//! (`AUTOINCREMENT`) and never reused.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pdf_content")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Concatenated page text of one PDF
    #[sea_orm(column_type = "Text")]
    pub text: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
