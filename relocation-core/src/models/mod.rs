mod field_value;
mod record;
mod relocation_profile;

pub use field_value::{EMPTY_DISPLAY, FieldValue};
pub use record::{FieldChanges, ID_KEY, Record, RecordId, RecordKind};
pub use relocation_profile::{ChildProfile, GeoPoint, RelocationProfile};
