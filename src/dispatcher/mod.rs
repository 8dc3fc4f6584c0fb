//! # Dispatcher Module
//!
//! Resolves an already-routed [`RestRequest`](crate::server::RestRequest) against a
//! [`Controller`] and invokes exactly one handler.
//!
//! ## Resolution
//!
//! | Request | Handler | Arguments |
//! |---------|---------|-----------|
//! | `GET`, no action | `get` | id (optional) |
//! | `DELETE`, no action | `delete` | id (optional) |
//! | `POST`, no action | `post` | raw body |
//! | `PUT`, no action | `put` | id (optional), raw body |
//! | any verb, action `name` | action `name` | non-empty params, in order |
//!
//! A canonical verb with no handler (or any other verb) is
//! [`RestError::UnsupportedMethod`](crate::error::RestError::UnsupportedMethod),
//! which the service maps to `403` with an empty body.
//!
//! A named action that is undefined or missing from the controller's allow-list
//! resolves to the empty result without invoking anything. The request still
//! succeeds; the rejection is logged at `warn`.
//!
//! ## Example
//!
//! ```rust
//! use restful_dispatch::dispatcher::Controller;
//! use restful_dispatch::result::RawResult;
//!
//! let articles = Controller::builder("Articles")
//!     .get(|_ctx, id| Ok(format!("article {}", id.unwrap_or("index"))))
//!     .action("count", |_ctx, _args| Ok(RawResult::Opaque(3.into())))
//!     .allow_action("count")
//!     .build();
//! assert!(articles.is_action_invocable("count"));
//! ```

mod controller;
mod core;

pub use self::core::{Dispatcher, HandlerContext};
pub use controller::{
    ActionHandler, BodyHandler, Controller, ControllerBuilder, IdBodyHandler, IdHandler, Verb,
};
