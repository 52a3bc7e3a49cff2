//! # Query Codec
//!
//! Bidirectional translation between the typed query model and its
//! canonical JSON wire form.
//!
//! - **Encoder**: typed to wire, all-or-nothing per tree
//! - **Parser**: wire to typed, the inverse of the encoder
//! - **Mapper**: `$type`-tagged objects for typed leaf values

pub mod encoder;
pub mod errors;
pub mod mapper;
pub mod parser;

pub use encoder::Encoder;
pub use errors::{CodecError, CodecResult};
pub use mapper::{CanonicalMapper, Mapped, ValueMapper};
pub use parser::{ParseContext, QueryParser};
