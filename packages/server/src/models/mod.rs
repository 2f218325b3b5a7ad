pub mod collection;
pub mod entry;
pub mod shared;

pub use collection::{Collection, CollectionRequest, Entry, Family, Infographic, Media, NaturalKey};
