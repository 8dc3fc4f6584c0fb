use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::controller::{Controller, Verb};
use crate::config::RestConfig;
use crate::error::RestError;
use crate::format::{FormatDescriptor, ResponseFormatter};
use crate::result::RawResult;
use crate::security::{authenticate, Authenticator, AuthenticatorRegistry, Principal};
use crate::server::RestRequest;

/// Per-call view handed to every handler.
///
/// Gives access to the request, body decoding in the negotiated request format
/// and the authentication lifecycle of the owning controller.
pub struct HandlerContext<'a> {
    request: &'a RestRequest,
    controller: &'a Controller,
    formatter: &'a ResponseFormatter,
    authenticator: &'a dyn Authenticator,
}

impl<'a> HandlerContext<'a> {
    #[must_use]
    pub fn request(&self) -> &'a RestRequest {
        self.request
    }

    #[must_use]
    pub fn controller(&self) -> &'a Controller {
        self.controller
    }

    /// Format used to decode the request body
    ///
    /// # Errors
    ///
    /// [`RestError::NoFormatter`] when nothing matches.
    pub fn request_format(&self) -> Result<Arc<FormatDescriptor>, RestError> {
        self.formatter.request_format(self.request)
    }

    /// Decode a payload with the request-mode format. Empty input is `Null`.
    ///
    /// # Errors
    ///
    /// Fails when no format matches or the payload is malformed.
    pub fn decode_body(&self, body: &[u8]) -> Result<Value, RestError> {
        self.formatter.decode_body(self.request, body)
    }

    /// Like [`decode_body`](Self::decode_body) but requires a map.
    ///
    /// # Errors
    ///
    /// Also fails with [`RestError::Format`] when the payload is not a map.
    pub fn decode_object(&self, body: &[u8]) -> Result<Map<String, Value>, RestError> {
        match self.decode_body(body)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => {
                let format = self
                    .request_format()
                    .map(|f| f.id().to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                Err(RestError::format(
                    &format,
                    format_args!("expected a map, got {}", value_kind(&other)),
                ))
            }
        }
    }

    /// Run the authenticator wrapped in the controller's hooks.
    ///
    /// # Errors
    ///
    /// [`RestError::Configuration`] when a hook phase does not complete.
    pub fn authenticate(&self) -> Result<Option<Principal>, RestError> {
        authenticate(self.authenticator, self.controller.auth_hooks(), self.request)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

/// Resolves a request against a [`Controller`] and invokes the handler.
///
/// Holds the request-body formatter and the authenticator resolved from
/// configuration. Both are fixed at construction.
#[derive(Clone)]
pub struct Dispatcher {
    formatter: ResponseFormatter,
    authenticator: Arc<dyn Authenticator>,
    authenticator_id: String,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("formatter", &self.formatter)
            .field("authenticator", &self.authenticator_id)
            .finish()
    }
}

impl Dispatcher {
    /// Build a dispatcher, resolving `config.authenticator` up front.
    ///
    /// # Errors
    ///
    /// [`RestError::Configuration`] for an unknown authenticator id.
    pub fn new(
        config: &RestConfig,
        formatter: ResponseFormatter,
        authenticators: &AuthenticatorRegistry,
    ) -> Result<Self, RestError> {
        let authenticator = authenticators.resolve(&config.authenticator)?;
        info!(
            authenticator = %config.authenticator,
            default_extension = %formatter.default_extension(),
            "Dispatcher ready"
        );
        Ok(Self {
            formatter,
            authenticator,
            authenticator_id: config.authenticator.clone(),
        })
    }

    #[must_use]
    pub fn authenticator_id(&self) -> &str {
        &self.authenticator_id
    }

    #[must_use]
    pub fn formatter(&self) -> &ResponseFormatter {
        &self.formatter
    }

    /// Dispatch `req` to `controller`.
    ///
    /// A non-empty action selects named-action dispatch; otherwise the verb
    /// selects the canonical handler.
    ///
    /// # Errors
    ///
    /// - [`RestError::UnsupportedMethod`] when the verb has no canonical handler
    /// - whatever the handler returns, unchanged
    pub fn dispatch(&self, controller: &Controller, req: &RestRequest) -> Result<RawResult, RestError> {
        let ctx = HandlerContext {
            request: req,
            controller,
            formatter: &self.formatter,
            authenticator: self.authenticator.as_ref(),
        };

        let start = Instant::now();
        let result = match req.action.as_deref().filter(|a| !a.is_empty()) {
            Some(action) => self.dispatch_action(&ctx, action),
            None => self.dispatch_canonical(&ctx),
        };

        match &result {
            Ok(raw) => debug!(
                request_id = %req.request_id,
                controller = %controller.name(),
                result_kind = raw.kind(),
                execution_time_us = start.elapsed().as_micros() as u64,
                "Handler completed"
            ),
            Err(err) => warn!(
                request_id = %req.request_id,
                controller = %controller.name(),
                method = %req.method,
                error = %err,
                execution_time_us = start.elapsed().as_micros() as u64,
                "Dispatch failed"
            ),
        }
        result
    }

    fn dispatch_canonical(&self, ctx: &HandlerContext<'_>) -> Result<RawResult, RestError> {
        let req = ctx.request;
        let controller = ctx.controller;
        let id = req.id.as_deref();

        let verb = Verb::from_method(&req.method);
        let outcome = match verb {
            Some(Verb::Get) => controller.get.as_ref().map(|h| h(ctx, id)),
            Some(Verb::Delete) => controller.delete.as_ref().map(|h| h(ctx, id)),
            Some(Verb::Post) => controller.post.as_ref().map(|h| h(ctx, req.body.as_slice())),
            Some(Verb::Put) => controller.put.as_ref().map(|h| h(ctx, id, req.body.as_slice())),
            None => None,
        };

        match outcome {
            Some(result) => {
                debug!(
                    request_id = %req.request_id,
                    controller = %controller.name(),
                    handler = verb.map(Verb::handler_name).unwrap_or_default(),
                    id = ?id,
                    "Canonical handler invoked"
                );
                result.map_err(RestError::from)
            }
            None => Err(RestError::UnsupportedMethod {
                method: req.method.clone(),
            }),
        }
    }

    fn dispatch_action(&self, ctx: &HandlerContext<'_>, action: &str) -> Result<RawResult, RestError> {
        let req = ctx.request;
        let controller = ctx.controller;

        let Some(handler) = controller.actions.get(action) else {
            warn!(
                request_id = %req.request_id,
                controller = %controller.name(),
                action = %action,
                "Action not defined - returning empty result"
            );
            return Ok(RawResult::null());
        };
        if !controller.is_action_allowed(action) {
            warn!(
                request_id = %req.request_id,
                controller = %controller.name(),
                action = %action,
                "Action not in allow-list - returning empty result"
            );
            return Ok(RawResult::null());
        }

        let args = req.positional_args();
        debug!(
            request_id = %req.request_id,
            controller = %controller.name(),
            action = %action,
            arg_count = args.len(),
            "Named action invoked"
        );
        handler(ctx, args.as_slice()).map_err(RestError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatRegistry;
    use http::Method;
    use serde_json::json;
    use std::sync::Mutex;

    fn dispatcher() -> Dispatcher {
        let config = RestConfig::default();
        let formatter = ResponseFormatter::new(Arc::new(FormatRegistry::with_defaults()), &config);
        Dispatcher::new(&config, formatter, &AuthenticatorRegistry::with_defaults(&config)).unwrap()
    }

    #[test]
    fn test_unknown_authenticator_fails_at_startup() {
        let config = RestConfig {
            authenticator: "kerberos".to_string(),
            ..RestConfig::default()
        };
        let formatter = ResponseFormatter::new(Arc::new(FormatRegistry::with_defaults()), &config);
        let err = Dispatcher::new(&config, formatter, &AuthenticatorRegistry::with_defaults(&config))
            .unwrap_err();
        assert!(matches!(err, RestError::Configuration { .. }));
    }

    #[test]
    fn test_get_receives_absent_id() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let controller = Controller::builder("Probe")
            .get(move |_ctx, id| {
                *sink.lock().unwrap() = Some(id.map(str::to_string));
                Ok(())
            })
            .build();
        dispatcher()
            .dispatch(&controller, &RestRequest::new(Method::GET))
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(None));
    }

    #[test]
    fn test_unsupported_verb() {
        let controller = Controller::builder("GetOnly").get(|_ctx, _id| Ok(())).build();
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let err = dispatcher()
                .dispatch(&controller, &RestRequest::new(method.clone()))
                .unwrap_err();
            assert!(matches!(err, RestError::UnsupportedMethod { .. }), "{method}");
        }
    }

    #[test]
    fn test_handler_error_propagates_as_is() {
        let controller = Controller::builder("Failing")
            .get(|_ctx, _id| -> anyhow::Result<()> { anyhow::bail!("store offline") })
            .build();
        let err = dispatcher()
            .dispatch(&controller, &RestRequest::new(Method::GET))
            .unwrap_err();
        assert!(matches!(err, RestError::Handler(_)));
        assert!(err.to_string().contains("store offline"));
    }

    #[test]
    fn test_decode_object_from_context() {
        let controller = Controller::builder("Echo")
            .post(|ctx, body| Ok(Value::Object(ctx.decode_object(body)?)))
            .build();
        let req = RestRequest::new(Method::POST)
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"Title":"Hello"}"#);
        let result = dispatcher().dispatch(&controller, &req).unwrap();
        assert_eq!(result, RawResult::PlainStructure(json!({"Title": "Hello"})));
    }

    #[test]
    fn test_decode_object_rejects_arrays() {
        let controller = Controller::builder("Echo")
            .post(|ctx, body| Ok(Value::Object(ctx.decode_object(body)?)))
            .build();
        let req = RestRequest::new(Method::POST).with_body("[1,2]");
        let err = dispatcher().dispatch(&controller, &req).unwrap_err();
        assert!(matches!(err, RestError::Format { .. }));
    }

    #[test]
    fn test_disallowed_action_is_silent_null() {
        let controller = Controller::builder("Actions")
            .action("secret", |_ctx, _args| Ok("leaked".to_string()))
            .build();
        let req = RestRequest::new(Method::GET).with_action("secret");
        let result = dispatcher().dispatch(&controller, &req).unwrap();
        assert!(result.is_null());
    }

    #[test]
    fn test_empty_action_uses_canonical_endpoint() {
        let controller = Controller::builder("Probe")
            .get(|_ctx, _id| Ok("canonical".to_string()))
            .build();
        let req = RestRequest::new(Method::GET).with_action("");
        let result = dispatcher().dispatch(&controller, &req).unwrap();
        assert_eq!(result, RawResult::Opaque(json!("canonical")));
    }
}
