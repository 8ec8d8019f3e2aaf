//! SWE Common data model shared by the codec and accessor crates.
//!
//! Values live in typed [`DataBlock`]s; their logical structure is described
//! by a [`DataComponent`] tree that can be bound to a block, split it across
//! its descendants, and rebuild it when arrays grow or choices switch.

pub mod data;
pub mod encoding;
pub mod error;
pub mod schema;
pub mod value;

pub use data::{DataBlock, ListBlock, MixedBlock, ScalarBlock};
pub use encoding::{
    BinaryDataType, BinaryEncoding, BinaryMember, ByteEncoding, ByteOrder, DataEncoding,
    JsonEncoding, TextEncoding,
};
pub use error::{DataError, DataResult};
pub use schema::{
    ComponentDef, ComponentKind, DataArray, DataChoice, DataComponent, DataRecord, ElementCount,
    KindDef, ScalarComponent, ScalarKind, SiblingScope,
};
pub use value::{Atom, DataType, Value};
