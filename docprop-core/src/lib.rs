//! docprop Core Engine
//!
//! Generic property/value resolution engine sitting between a streaming,
//! tag-token event source and independent semantic-model builders. The
//! engine consumes a single forward pass of start/characters/end events,
//! builds a schema-agnostic representation (values, property bags,
//! ordered tables), and replays it to visitor-implementing builders -
//! without knowing anything about the schema or the builders.
//!
//! # Architecture
//!
//! - **value.rs**    - Typed values with total, never-failing projections
//! - **property.rs** - Property/PropertySet/Table and the visitor protocol
//! - **handle.rs**   - Deferred binary/stream/shape/object handles
//! - **context.rs**  - Per-element build contexts and the schema registry
//! - **document.rs** - Token-stream front-end driving the context stack

pub mod context;
pub mod document;
pub mod handle;
pub mod property;
pub mod value;

pub use context::{
    AttrType, ContextHandler, ContextResult, ElementSpec, Registry, Role, SpecId, Token,
};
pub use document::DocumentHandler;
pub use handle::{
    BinaryHandle, BinarySource, HandleError, ObjectHandle, ShapeHandle, StreamHandle, StreamSource,
};
pub use property::{
    FindInt, FindString, Id, PropertiesVisitor, Property, PropertyKind, PropertySet, Table,
    TableVisitor, ID_NONE,
};
pub use value::{AnyValue, Value};
