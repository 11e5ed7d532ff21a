//! Input parsing: turning pasted link text into a [`VideoId`].
//!
//! Resolution is a pure function over the input string. It performs no
//! network access and never panics on arbitrary text.
//!
//! # Example
//!
//! ```
//! use nezumi_core::parser::resolve;
//!
//! let id = resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=1").unwrap();
//! assert_eq!(id.as_str(), "dQw4w9WgXcQ");
//! ```

mod error;
mod video_id;

pub use error::{NO_MATCH_MESSAGE, ResolutionError};
pub use video_id::{VideoId, resolve};
