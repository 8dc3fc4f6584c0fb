//! Request and response types plus [`RestService`], the glue a serving runtime
//! calls once per request.
//!
//! The runtime owns sockets, threads and routing. It builds a [`RestRequest`]
//! (directly or via [`RestRequest::from_path`]), calls [`RestService::handle`]
//! and writes the [`RestResponse`] out.

pub mod request;
pub mod response;
pub mod service;

pub use request::{parse_accept, HeaderVec, ParamVec, RestRequest, MAX_PARAMS};
pub use response::RestResponse;
pub use service::RestService;
