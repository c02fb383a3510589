//! HTTP byte-range handling
//!
//! A `Range` header is first decoded into [`RawRangeSpec`]s, which know
//! nothing about the object, and then resolved against the object's length
//! into concrete [`ResolvedRange`] windows. Both steps are pure and keep the
//! order in which ranges appeared in the header.

pub mod parser;
pub mod resolver;

pub use parser::{decode, RawRangeSpec};
pub use resolver::{resolve, resolve_one, ResolvedRange};
