use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use super::request::RestRequest;
use super::response::RestResponse;
use crate::config::RestConfig;
use crate::dispatcher::{Controller, Dispatcher};
use crate::error::RestError;
use crate::format::{FormatRegistry, ResponseFormatter};
use crate::security::AuthenticatorRegistry;

/// One mounted controller: dispatch, then format, then render.
///
/// `Clone` is cheap; the controller and registries are shared.
#[derive(Debug, Clone)]
pub struct RestService {
    controller: Arc<Controller>,
    dispatcher: Dispatcher,
    formatter: ResponseFormatter,
}

impl RestService {
    /// Service over the built-in formats and authenticators.
    ///
    /// # Errors
    ///
    /// [`RestError::Configuration`] when `config` names an unknown authenticator.
    pub fn new(controller: Controller, config: &RestConfig) -> Result<Self, RestError> {
        let formats = Arc::new(FormatRegistry::with_defaults());
        let authenticators = AuthenticatorRegistry::with_defaults(config);
        Self::with_registries(Arc::new(controller), config, formats, &authenticators)
    }

    /// Service over caller-provided registries.
    ///
    /// # Errors
    ///
    /// [`RestError::Configuration`] when `config` names an unknown authenticator.
    pub fn with_registries(
        controller: Arc<Controller>,
        config: &RestConfig,
        formats: Arc<FormatRegistry>,
        authenticators: &AuthenticatorRegistry,
    ) -> Result<Self, RestError> {
        let formatter = ResponseFormatter::new(formats, config);
        let dispatcher = Dispatcher::new(config, formatter.clone(), authenticators)?;
        info!(
            controller = %controller.name(),
            verbs = ?controller.supported_verbs(),
            "Controller mounted"
        );
        Ok(Self {
            controller,
            dispatcher,
            formatter,
        })
    }

    #[must_use]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    #[must_use]
    pub fn formatter(&self) -> &ResponseFormatter {
        &self.formatter
    }

    /// Handle one request.
    ///
    /// An unsupported verb is answered with an empty `403`. Every other failure
    /// is returned to the caller unchanged.
    ///
    /// # Errors
    ///
    /// Handler errors, request-body format errors, configuration errors from
    /// authentication hooks, and encoder failures.
    pub fn handle(&self, req: &RestRequest) -> Result<RestResponse, RestError> {
        let start = Instant::now();
        let raw = match self.dispatcher.dispatch(&self.controller, req) {
            Ok(raw) => raw,
            Err(RestError::UnsupportedMethod { method }) => {
                warn!(
                    request_id = %req.request_id,
                    controller = %self.controller.name(),
                    method = %method,
                    "Unsupported method - 403"
                );
                return Ok(RestResponse::forbidden()
                    .with_header("x-request-id", req.request_id.to_string()));
            }
            Err(err) => {
                error!(
                    request_id = %req.request_id,
                    controller = %self.controller.name(),
                    error = %err,
                    "Request failed"
                );
                return Err(err);
            }
        };

        let body = self.formatter.format(req, raw)?;
        let res = RestResponse::from_formatted(body)
            .with_header("x-request-id", req.request_id.to_string());
        info!(
            request_id = %req.request_id,
            controller = %self.controller.name(),
            method = %req.method,
            status = res.status.as_u16(),
            content_type = res.content_type().unwrap_or(""),
            body_size = res.body.len(),
            duration_us = start.elapsed().as_micros() as u64,
            "Request handled"
        );
        Ok(res)
    }

    /// Like [`handle`](Self::handle) but renders failures as responses
    #[must_use]
    pub fn respond(&self, req: &RestRequest) -> RestResponse {
        self.handle(req).unwrap_or_else(|err| {
            RestResponse::from_error(&err).with_header("x-request-id", req.request_id.to_string())
        })
    }
}
