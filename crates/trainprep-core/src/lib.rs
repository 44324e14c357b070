pub mod columns;
pub mod metadata;
pub mod model_id;
pub mod placeholder;
pub mod schema;

pub use metadata::RunMetadata;
pub use model_id::{ModelId, UnknownModelId};
pub use placeholder::{PLACEHOLDER_FEATURES, PlaceholderFeature, PlaceholderValue};
pub use schema::training;
