use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use http::Method;

use super::core::HandlerContext;
use crate::result::RawResult;
use crate::security::AuthHooks;

/// `get(id?)` / `delete(id?)`
pub type IdHandler =
    Arc<dyn Fn(&HandlerContext<'_>, Option<&str>) -> anyhow::Result<RawResult> + Send + Sync>;
/// `post(body)`
pub type BodyHandler =
    Arc<dyn Fn(&HandlerContext<'_>, &[u8]) -> anyhow::Result<RawResult> + Send + Sync>;
/// `put(id?, body)`
pub type IdBodyHandler = Arc<
    dyn Fn(&HandlerContext<'_>, Option<&str>, &[u8]) -> anyhow::Result<RawResult> + Send + Sync,
>;
/// Named action receiving the non-empty positional parameters
pub type ActionHandler =
    Arc<dyn Fn(&HandlerContext<'_>, &[&str]) -> anyhow::Result<RawResult> + Send + Sync>;

/// The four verbs the canonical endpoint dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    /// `None` for every other HTTP method
    #[must_use]
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Verb::Get),
            Method::POST => Some(Verb::Post),
            Method::PUT => Some(Verb::Put),
            Method::DELETE => Some(Verb::Delete),
            _ => None,
        }
    }

    /// Handler name the verb maps to
    #[must_use]
    pub fn handler_name(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.handler_name())
    }
}

/// A resource controller: an explicit dispatch table built once at startup.
///
/// Verb handlers serve the canonical endpoint. Named actions are only
/// reachable when they are both registered and listed in the allow-list.
pub struct Controller {
    name: String,
    pub(crate) get: Option<IdHandler>,
    pub(crate) delete: Option<IdHandler>,
    pub(crate) post: Option<BodyHandler>,
    pub(crate) put: Option<IdBodyHandler>,
    pub(crate) actions: HashMap<String, ActionHandler>,
    allowed_actions: HashSet<String>,
    auth_hooks: Vec<Arc<dyn AuthHooks>>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<&String> = self.actions.keys().collect();
        actions.sort();
        let mut allowed: Vec<&String> = self.allowed_actions.iter().collect();
        allowed.sort();
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("verbs", &self.supported_verbs())
            .field("actions", &actions)
            .field("allowed_actions", &allowed)
            .field("auth_hooks", &self.auth_hooks.len())
            .finish()
    }
}

impl Controller {
    pub fn builder(name: impl Into<String>) -> ControllerBuilder {
        ControllerBuilder {
            controller: Controller {
                name: name.into(),
                get: None,
                delete: None,
                post: None,
                put: None,
                actions: HashMap::new(),
                allowed_actions: HashSet::new(),
                auth_hooks: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn supports(&self, verb: Verb) -> bool {
        match verb {
            Verb::Get => self.get.is_some(),
            Verb::Post => self.post.is_some(),
            Verb::Put => self.put.is_some(),
            Verb::Delete => self.delete.is_some(),
        }
    }

    #[must_use]
    pub fn supported_verbs(&self) -> Vec<Verb> {
        [Verb::Get, Verb::Post, Verb::Put, Verb::Delete]
            .into_iter()
            .filter(|v| self.supports(*v))
            .collect()
    }

    #[must_use]
    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    #[must_use]
    pub fn is_action_allowed(&self, name: &str) -> bool {
        self.allowed_actions.contains(name)
    }

    /// Registered and allowed: the only actions a URL can reach
    #[must_use]
    pub fn is_action_invocable(&self, name: &str) -> bool {
        self.has_action(name) && self.is_action_allowed(name)
    }

    #[must_use]
    pub fn auth_hooks(&self) -> &[Arc<dyn AuthHooks>] {
        &self.auth_hooks
    }

    /// Link to this controller, or to one of its actions.
    ///
    /// The action is appended only when it is invocable; otherwise the base link
    /// is returned unchanged.
    #[must_use]
    pub fn link(&self, base: &str, action: Option<&str>) -> String {
        match action {
            Some(action) if self.is_action_invocable(action) => {
                format!("{}/{}", base.trim_end_matches('/'), action.trim_start_matches('/'))
            }
            _ => base.to_string(),
        }
    }
}

/// Builder for [`Controller`]
pub struct ControllerBuilder {
    controller: Controller,
}

impl ControllerBuilder {
    #[must_use]
    pub fn get<F, R>(mut self, handler: F) -> Self
    where
        F: Fn(&HandlerContext<'_>, Option<&str>) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<RawResult>,
    {
        self.controller.get = Some(Arc::new(
            move |ctx: &HandlerContext<'_>, id: Option<&str>| handler(ctx, id).map(Into::into),
        ));
        self
    }

    #[must_use]
    pub fn delete<F, R>(mut self, handler: F) -> Self
    where
        F: Fn(&HandlerContext<'_>, Option<&str>) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<RawResult>,
    {
        self.controller.delete = Some(Arc::new(
            move |ctx: &HandlerContext<'_>, id: Option<&str>| handler(ctx, id).map(Into::into),
        ));
        self
    }

    #[must_use]
    pub fn post<F, R>(mut self, handler: F) -> Self
    where
        F: Fn(&HandlerContext<'_>, &[u8]) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<RawResult>,
    {
        self.controller.post = Some(Arc::new(
            move |ctx: &HandlerContext<'_>, body: &[u8]| handler(ctx, body).map(Into::into),
        ));
        self
    }

    #[must_use]
    pub fn put<F, R>(mut self, handler: F) -> Self
    where
        F: Fn(&HandlerContext<'_>, Option<&str>, &[u8]) -> anyhow::Result<R>
            + Send
            + Sync
            + 'static,
        R: Into<RawResult>,
    {
        self.controller.put = Some(Arc::new(
            move |ctx: &HandlerContext<'_>, id: Option<&str>, body: &[u8]| {
                handler(ctx, id, body).map(Into::into)
            },
        ));
        self
    }

    /// Register a named action. It stays unreachable until allowed.
    #[must_use]
    pub fn action<F, R>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&HandlerContext<'_>, &[&str]) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<RawResult>,
    {
        self.controller.actions.insert(
            name.to_string(),
            Arc::new(move |ctx: &HandlerContext<'_>, args: &[&str]| {
                handler(ctx, args).map(Into::into)
            }),
        );
        self
    }

    #[must_use]
    pub fn allow_action(mut self, name: &str) -> Self {
        self.controller.allowed_actions.insert(name.to_string());
        self
    }

    #[must_use]
    pub fn allow_actions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.controller
            .allowed_actions
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Add authentication lifecycle hooks, run in registration order
    #[must_use]
    pub fn auth_hook(mut self, hook: Arc<dyn AuthHooks>) -> Self {
        self.controller.auth_hooks.push(hook);
        self
    }

    #[must_use]
    pub fn build(self) -> Controller {
        self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> Controller {
        Controller::builder("Articles")
            .get(|_ctx, _id| Ok(RawResult::null()))
            .put(|_ctx, _id, _body| Ok(()))
            .action("publish", |_ctx, _args| Ok(()))
            .action("purge", |_ctx, _args| Ok(()))
            .allow_action("publish")
            .build()
    }

    #[test]
    fn test_verb_mapping() {
        assert_eq!(Verb::from_method(&Method::GET), Some(Verb::Get));
        assert_eq!(Verb::from_method(&Method::DELETE), Some(Verb::Delete));
        assert_eq!(Verb::from_method(&Method::PATCH), None);
        assert_eq!(Verb::from_method(&Method::HEAD), None);
        assert_eq!(Verb::Put.handler_name(), "put");
    }

    #[test]
    fn test_supported_verbs() {
        let c = controller();
        assert_eq!(c.supported_verbs(), vec![Verb::Get, Verb::Put]);
        assert!(!c.supports(Verb::Post));
    }

    #[test]
    fn test_action_needs_registration_and_allow_list() {
        let c = controller();
        assert!(c.is_action_invocable("publish"));
        assert!(!c.is_action_invocable("purge"));
        assert!(!c.is_action_invocable("missing"));
    }

    #[test]
    fn test_link() {
        let c = controller();
        assert_eq!(c.link("/api/articles/", Some("publish")), "/api/articles/publish");
        assert_eq!(c.link("/api/articles", Some("purge")), "/api/articles");
        assert_eq!(c.link("/api/articles", None), "/api/articles");
    }

    #[test]
    fn test_debug_lists_table() {
        let dbg = format!("{:?}", controller());
        assert!(dbg.contains("Articles"));
        assert!(dbg.contains("publish"));
    }
}
