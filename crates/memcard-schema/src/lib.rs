mod error;
mod loader;
mod model;

pub use error::SchemaError;
pub use loader::{load_schema, parse_schema};
pub use model::{
    DerivedField, DerivedFn, FieldKind, FieldSpec, ListRules, MapRules, Pattern, Schema,
    TextRules,
};
