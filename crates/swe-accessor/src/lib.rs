//! Named, typed access to schema-bound SWE Common data blocks.
//!
//! [`DataAccessor`] maps method names such as `get_temperature` or
//! `add_sample` to component paths and performs the typed get, set, resize
//! or append on whatever block is currently wrapped. The
//! [`data_accessor!`] macro generates typed structs on top of it.

pub mod accessor;
pub mod error;
mod macros;
pub mod naming;

pub use accessor::{AccessorView, DataAccessor};
pub use error::{AccessorError, AccessorResult};

#[doc(hidden)]
pub use swe_common as __swe_common;
