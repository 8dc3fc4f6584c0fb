use crate::ids::RequestId;
use http::Method;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of positional parameters a named action receives
pub const MAX_PARAMS: usize = 10;

/// Request headers, stack-allocated for up to 16 entries. Names are lowercase.
pub type HeaderVec = SmallVec<[(Arc<str>, String); 16]>;

/// Positional action parameters `param1..param10`; `None` marks an unset slot.
pub type ParamVec = SmallVec<[Option<String>; MAX_PARAMS]>;

/// An already-routed request, as consumed by the dispatcher and formatter.
///
/// Routing proper belongs to the serving runtime; [`RestRequest::from_path`] is
/// a convenience for runtimes that hand over a raw path.
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    /// Correlation id for log lines
    pub request_id: RequestId,
    /// HTTP verb
    pub method: Method,
    /// Resource identifier for the canonical endpoint
    pub id: Option<String>,
    /// Named action segment; non-empty selects action dispatch
    pub action: Option<String>,
    /// Positional parameters in route order
    pub params: ParamVec,
    /// Raw request body
    pub body: Vec<u8>,
    /// HTTP headers (lowercase keys)
    pub headers: HeaderVec,
    /// Format extension taken from the path, without the dot (may be empty)
    pub extension: String,
}

impl RestRequest {
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            id: None,
            action: None,
            params: ParamVec::new(),
            body: Vec::new(),
            headers: HeaderVec::new(),
            extension: String::new(),
        }
    }

    /// Resolve a request path into id / action / params / extension.
    ///
    /// - `/` → resource root
    /// - `/5.json` → id `5`, extension `json`
    /// - `/publish/5/draft` → action `publish`, params `["5", "draft"]`
    ///
    /// A first segment made only of digits is an id; anything else is an action.
    /// The query string is ignored. Parameters beyond the tenth are dropped.
    #[must_use]
    pub fn from_path(method: Method, path: &str) -> Self {
        let mut req = Self::new(method);
        let path = path.split('?').next().unwrap_or("");

        let mut segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            })
            .collect();

        if let Some(last) = segments.last_mut() {
            if let Some((stem, ext)) = last.rsplit_once('.') {
                if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                    req.extension = ext.to_ascii_lowercase();
                    *last = stem.to_string();
                }
            }
        }
        segments.retain(|s| !s.is_empty());

        let mut rest = segments.into_iter();
        match rest.next() {
            None => {}
            Some(first) if first.chars().all(|c| c.is_ascii_digit()) => {
                req.id = Some(first);
                let ignored = rest.count();
                if ignored > 0 {
                    debug!(ignored_segments = ignored, "Trailing segments after id ignored");
                }
            }
            Some(action) => {
                req.action = Some(action);
                req.params = rest.by_ref().take(MAX_PARAMS).map(Some).collect();
                let dropped = rest.count();
                if dropped > 0 {
                    debug!(dropped_params = dropped, "Positional params beyond limit dropped");
                }
            }
        }

        req
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Append a positional parameter; ignored once ten are present.
    #[must_use]
    pub fn with_param(mut self, value: Option<&str>) -> Self {
        if self.params.len() < MAX_PARAMS {
            self.params.push(value.map(str::to_string));
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.extension = ext.trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// Add or replace a header. An `x-request-id` header also sets the request id.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.trim().to_ascii_lowercase();
        let value = value.into();
        if name == "x-request-id" {
            self.request_id = RequestId::from_header_or_new(Some(&value));
        }
        self.headers.retain(|(k, _)| k.as_ref() != name);
        self.headers.push((Arc::from(name.as_str()), value));
        self
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `Content-Type` without parameters such as `;charset=utf-8`
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
            .map(|ct| ct.split(';').next().unwrap_or("").trim())
            .filter(|ct| !ct.is_empty())
    }

    /// Raw `Accept` header, if present and non-blank
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.get_header("accept")
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Positional parameters in order, skipping unset slots.
    ///
    /// Present values are passed as-is, empty strings included.
    #[must_use]
    pub fn positional_args(&self) -> Vec<&str> {
        self.params.iter().flatten().map(String::as_str).collect()
    }
}

/// Parse an `Accept` header into MIME types ordered by client preference.
///
/// Entries are ordered by their `q` weight (default 1.0); equal weights keep the
/// order the client listed them in. Entries with `q=0` are dropped, as are
/// entries whose `q` is not a number in `0..=1`.
#[must_use]
pub fn parse_accept(header: &str) -> Vec<String> {
    let mut entries: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let mime = pieces.next()?.trim().to_ascii_lowercase();
            if mime.is_empty() {
                return None;
            }
            let q = pieces
                .filter_map(|p| {
                    let (k, v) = p.split_once('=')?;
                    if k.trim().eq_ignore_ascii_case("q") {
                        v.trim().parse::<f32>().ok()
                    } else {
                        None
                    }
                })
                .next()
                .unwrap_or(1.0);
            if q.is_finite() && q > 0.0 && q <= 1.0 {
                Some((mime, q))
            } else {
                None
            }
        })
        .collect();

    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.into_iter().map(|(mime, _)| mime).collect()
}
