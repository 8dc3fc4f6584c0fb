//! # restful-dispatch
//!
//! Verb-to-handler dispatch for REST resource controllers, with content
//! negotiation for the response body.
//!
//! ## Overview
//!
//! A serving runtime hands over an already-routed request: verb, optional id,
//! optional action with positional parameters, path extension, headers and body.
//! This crate picks the handler, invokes it, and turns its result into bytes in
//! the format the client asked for.
//!
//! ## Architecture
//!
//! - **[`dispatcher`]** - canonical CRUD endpoint by verb, or a named action gated by
//!   an allow-list
//! - **[`format`]** - format registry, selection precedence and encoding
//! - **[`result`]** - [`RawResult`](result::RawResult), the handler output union
//! - **[`security`]** - pluggable authenticators and two-phase auth hooks
//! - **[`server`]** - request/response types and [`RestService`](server::RestService)
//! - **[`config`]** - [`RestConfig`](config::RestConfig) from env or YAML
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** / **[`demo`]** - the `rest-dispatch` binary and its in-memory store
//!
//! ### Request Flow
//!
//! ```text
//! RestRequest ──► Dispatcher ──► handler ──► RawResult ──► ResponseFormatter ──► RestResponse
//!                    │                                        │
//!                    └─ 403 on unsupported verb               └─ raw passthrough when no
//!                                                                format can be selected
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::{Method, StatusCode};
//! use restful_dispatch::config::RestConfig;
//! use restful_dispatch::dispatcher::Controller;
//! use restful_dispatch::result::Entity;
//! use restful_dispatch::server::{RestRequest, RestService};
//! use serde_json::{Map, Value};
//!
//! let controller = Controller::builder("Notes")
//!     .get(|_ctx, id| {
//!         let mut fields = Map::new();
//!         fields.insert("ID".into(), Value::from(id.unwrap_or("0").parse::<i64>()?));
//!         fields.insert("Title".into(), "Hello".into());
//!         Ok(Entity::new("Note", fields))
//!     })
//!     .build();
//!
//! let service = RestService::new(controller, &RestConfig::default()).unwrap();
//! let res = service
//!     .handle(&RestRequest::from_path(Method::GET, "/1.json"))
//!     .unwrap();
//! assert_eq!(res.status, StatusCode::OK);
//! assert_eq!(res.content_type(), Some("application/json"));
//!
//! let res = service
//!     .handle(&RestRequest::from_path(Method::DELETE, "/1"))
//!     .unwrap();
//! assert_eq!(res.status, StatusCode::FORBIDDEN);
//! ```

pub mod cli;
pub mod config;
pub mod demo;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod ids;
pub mod logging;
pub mod result;
pub mod security;
pub mod server;

pub use config::RestConfig;
pub use dispatcher::{Controller, Dispatcher, HandlerContext};
pub use error::RestError;
pub use format::{FormatDescriptor, FormatRegistry, ResponseFormatter};
pub use result::{Collection, Entity, RawResult};
pub use server::{RestRequest, RestResponse, RestService};
