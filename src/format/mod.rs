//! # Format Module
//!
//! Content negotiation and serialization for handler results.
//!
//! ## Overview
//!
//! - [`FormatDescriptor`] - one serialization scheme: id, extensions, MIME types,
//!   entity/collection encoders and a decoder
//! - [`FormatRegistry`] - the set of formats, built at startup and shared read-only
//! - [`ResponseFormatter`] - picks a format for a request and encodes a
//!   [`RawResult`](crate::result::RawResult)
//!
//! ## Selection
//!
//! | Step | Source | Mode |
//! |------|--------|------|
//! | 1 | path extension (strict, no fallback) | both |
//! | 2 | `Accept` (unless `*/*`), else default extension | response |
//! | 3 | `Content-Type` without parameters | both |
//! | 4 | configured default extension | both |
//!
//! When nothing resolves in response mode the raw value is passed through.
//!
//! ## Built-in formats
//!
//! | Id | Extensions | MIME types |
//! |----|------------|------------|
//! | `json` | `json`, `js` | `application/json`, `text/json`, `application/javascript` |
//! | `yaml` | `yaml`, `yml` | `application/yaml`, `application/x-yaml`, `text/yaml` |
//! | `bson` | `bson` | `application/bson` |

pub mod builtin;
mod core;
mod formatter;

pub use self::core::{CollectionEncoder, Decoder, EntityEncoder, FormatDescriptor, FormatRegistry};
pub use formatter::{FormattedBody, ResponseFormatter, SelectionMode};
