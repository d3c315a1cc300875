//! Header policy model: schemas, validation, merging and serialization.
//!
//! Each [`HeaderKind`] carries its own schema, merge strategy and wire
//! grammar. The functions here are pure; state lives in
//! [`PolicyStore`](crate::PolicyStore).

mod kind;
mod merge;
mod overrides;
mod schema;
mod serialize;
mod validate;
mod value;

pub use kind::HeaderKind;
pub use merge::{merge, MergeMode};
pub use overrides::Overrides;
pub use schema::{default_policy, empty_csp, schema, FieldRule, FieldSchema, HeaderSchema, CSP_DIRECTIVES};
pub use serialize::{header_name, serialize, SecurityHeader};
pub use validate::validate;
pub use value::{FieldValue, Pin, ValueMap};
