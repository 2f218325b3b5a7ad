use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per aggregate. The whole entry/attachment tree lives in `document`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collection")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// "timeline" or "program".
    #[sea_orm(indexed)]
    pub family: String,

    /// Canonical text form of the year or title. Unique per family.
    pub natural_key: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub document: serde_json::Value,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
