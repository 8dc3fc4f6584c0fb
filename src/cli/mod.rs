//! # CLI Module
//!
//! Command-line front end of the `rest-dispatch` binary.
//!
//! ## Commands
//!
//! ### `request`
//!
//! Run one request through the full dispatch and formatting path against the
//! seeded demo article controller:
//!
//! ```bash
//! rest-dispatch request --method GET --path /5.yaml
//! rest-dispatch request -X POST -H 'Content-Type: application/json' --body '{"Title":"New"}'
//! rest-dispatch request --path /search/article --config rest.yaml
//! ```
//!
//! Options:
//! - `--method, -X <VERB>` - HTTP verb (default: `GET`)
//! - `--path, -p <PATH>` - request path below the controller (default: `/`)
//! - `--header, -H <NAME: VALUE>` - request header, repeatable
//! - `--body, -d <TEXT>` - raw request body
//! - `--config, -c <FILE>` - YAML [`RestConfig`](crate::config::RestConfig); otherwise
//!   `REST_DEFAULT_EXTENSION` / `REST_AUTHENTICATOR` are read
//!
//! ### `formats`
//!
//! List the registered formats with their extensions and MIME types.
//!
//! ## Logging
//!
//! Logging is configured from `REST_LOG_*` (see [`crate::logging`]) and goes to
//! stderr so the response printed on stdout stays clean.

mod commands;

pub use commands::{execute, parse_header, run_cli, Cli, Commands};
