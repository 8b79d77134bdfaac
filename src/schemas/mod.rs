// ============================================================================
// Entity Schema Set
// ============================================================================
//
// Declarative record shapes for every dashboard entity, plus the validation
// step that narrows a raw JSON payload into a typed Record before it reaches
// the document store.
//
// ============================================================================

pub mod entities;
pub mod errors;
pub mod field;

pub use entities::*;
pub use errors::{UnknownSchema, ValidationError};
pub use field::{EntitySchema, FieldSpec, FieldType, Presence};
