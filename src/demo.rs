//! In-memory article store and a controller over it.
//!
//! Used by the `rest-dispatch` binary to exercise the full request path without
//! a database or a network listener.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context};
use serde_json::{Map, Value};
use tracing::debug;

use crate::dispatcher::Controller;
use crate::result::{Collection, Entity, RawResult};

pub const ARTICLE_TYPE: &str = "Article";

#[derive(Debug, Default)]
struct Articles {
    items: Vec<Entity>,
    next_id: i64,
}

/// Thread-safe list of `Article` entities with sequential ids
#[derive(Debug)]
pub struct ArticleStore {
    inner: Mutex<Articles>,
}

impl Default for ArticleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Articles {
                items: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Store holding five articles, ids `1..=5`
    #[must_use]
    pub fn seeded() -> Self {
        let store = Self::new();
        if let Ok(mut articles) = store.inner.lock() {
            for n in 1..=5 {
                let mut fields = Map::new();
                fields.insert("Title".into(), Value::String(format!("Article {n}")));
                fields.insert("Subtitle".into(), Value::String(format!("Subtitle {n}")));
                insert(&mut articles, fields);
            }
        }
        store
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Articles>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("article store lock poisoned"))
    }

    pub fn list(&self) -> anyhow::Result<Vec<Entity>> {
        Ok(self.lock()?.items.clone())
    }

    pub fn get(&self, id: i64) -> anyhow::Result<Option<Entity>> {
        Ok(self.lock()?.items.iter().find(|e| e.id() == Some(id)).cloned())
    }

    pub fn create(&self, fields: Map<String, Value>) -> anyhow::Result<Entity> {
        let mut articles = self.lock()?;
        Ok(insert(&mut articles, fields))
    }

    /// Apply `fields` to an existing article; `None` when the id is unknown
    pub fn update(&self, id: i64, fields: &Map<String, Value>) -> anyhow::Result<Option<Entity>> {
        let mut articles = self.lock()?;
        Ok(articles
            .items
            .iter_mut()
            .find(|e| e.id() == Some(id))
            .map(|e| {
                e.update(fields);
                e.clone()
            }))
    }

    /// `true` when something was removed
    pub fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut articles = self.lock()?;
        let before = articles.items.len();
        articles.items.retain(|e| e.id() != Some(id));
        Ok(articles.items.len() != before)
    }

    /// Articles whose title contains every term (case-insensitive)
    pub fn search(&self, terms: &[&str]) -> anyhow::Result<Vec<Entity>> {
        let terms: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        Ok(self
            .lock()?
            .items
            .iter()
            .filter(|e| {
                let title = e
                    .get("Title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase();
                terms.iter().all(|t| title.contains(t.as_str()))
            })
            .cloned()
            .collect())
    }
}

fn insert(articles: &mut Articles, fields: Map<String, Value>) -> Entity {
    let mut entity = Entity::new(ARTICLE_TYPE, fields);
    entity.set_id(articles.next_id);
    articles.next_id += 1;
    articles.items.push(entity.clone());
    entity
}

fn parse_id(id: Option<&str>) -> anyhow::Result<Option<i64>> {
    id.map(|raw| raw.parse::<i64>().with_context(|| format!("invalid article id '{raw}'")))
        .transpose()
}

/// CRUD controller over `store`.
///
/// Actions: `count` and `search/<term>...` are allowed; `reset` is registered
/// but never reachable from a URL.
#[must_use]
pub fn article_controller(store: Arc<ArticleStore>) -> Controller {
    let get_store = Arc::clone(&store);
    let post_store = Arc::clone(&store);
    let put_store = Arc::clone(&store);
    let delete_store = Arc::clone(&store);
    let count_store = Arc::clone(&store);
    let search_store = Arc::clone(&store);
    let reset_store = store;

    Controller::builder("Articles")
        .get(move |_ctx, id| {
            Ok(match parse_id(id)? {
                Some(id) => RawResult::from(get_store.get(id)?),
                None => Collection::new(get_store.list()?).into(),
            })
        })
        .post(move |ctx, body| {
            let fields = ctx.decode_object(body)?;
            let created = post_store.create(fields)?;
            debug!(id = ?created.id(), "Article created");
            Ok(created)
        })
        .put(move |ctx, id, body| {
            let id = parse_id(id)?.ok_or_else(|| anyhow!("PUT requires an article id"))?;
            let fields = ctx.decode_object(body)?;
            Ok(put_store.update(id, &fields)?)
        })
        .delete(move |_ctx, id| {
            if let Some(id) = parse_id(id)? {
                let removed = delete_store.delete(id)?;
                debug!(id, removed, "Article delete");
            }
            Ok(())
        })
        .action("count", move |_ctx, _args| {
            Ok(Value::from(count_store.list()?.len()))
        })
        .action("search", move |_ctx, args| {
            Ok(Collection::new(search_store.search(args)?))
        })
        .action("reset", move |_ctx, _args| {
            reset_store.lock()?.items.clear();
            Ok(())
        })
        .allow_actions(["count", "search"])
        .build()
}
