//! Format catalog: the typed view of an upstream streaming manifest.
//!
//! Derived display fields ([`Format::mime_type`], [`Format::description`]) are
//! computed on access from the stored fields and the static itag table.

mod error;
pub mod itag;
mod model;

pub use error::ManifestError;
pub use model::{Format, PlayerResponse, StreamingData, VideoDetails};
