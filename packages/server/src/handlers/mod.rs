pub mod collection;
pub mod entry;
pub mod viewer;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::Family;

/// An id that is not a UUID cannot name any collection.
pub(crate) fn collection_id(family: Family, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| family.not_found())
}
