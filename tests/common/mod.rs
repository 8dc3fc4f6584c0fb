#![allow(dead_code)]

pub mod fixtures {
    use std::sync::{Arc, Mutex};

    use http::Method;
    use restful_dispatch::config::RestConfig;
    use restful_dispatch::dispatcher::Controller;
    use restful_dispatch::result::{Collection, Entity, RawResult};
    use restful_dispatch::server::{RestRequest, RestService};
    use serde_json::{Map, Value};

    pub const TYPE_NAME: &str = "TestDataObject";

    /// Five `TestDataObject`s with `Title`/`Subtitle`, ids 1..=5
    #[derive(Debug)]
    pub struct TestStore {
        items: Mutex<Vec<Entity>>,
    }

    impl TestStore {
        pub fn seeded() -> Arc<Self> {
            let items = (1..=5)
                .map(|n| {
                    let title = format!("Object {n}");
                    let subtitle = format!("Subtitle {n}");
                    let mut e = Entity::new(TYPE_NAME, fields(&title, &subtitle));
                    e.set_id(n);
                    e
                })
                .collect();
            Arc::new(Self {
                items: Mutex::new(items),
            })
        }

        pub fn all(&self) -> Vec<Entity> {
            self.items.lock().unwrap().clone()
        }

        pub fn ids(&self) -> Vec<i64> {
            self.all().iter().filter_map(Entity::id).collect()
        }

        pub fn get(&self, id: &str) -> Option<Entity> {
            let id: i64 = id.parse().ok()?;
            self.all().into_iter().find(|e| e.id() == Some(id))
        }

        pub fn insert(&self, data: Map<String, Value>) -> Entity {
            let mut items = self.items.lock().unwrap();
            let next = items.iter().filter_map(Entity::id).max().unwrap_or(0) + 1;
            let mut e = Entity::new(TYPE_NAME, Map::new());
            e.update(&data);
            e.set_id(next);
            items.push(e.clone());
            e
        }

        pub fn update(&self, id: &str, data: &Map<String, Value>) -> Option<Entity> {
            let id: i64 = id.parse().ok()?;
            let mut items = self.items.lock().unwrap();
            let e = items.iter_mut().find(|e| e.id() == Some(id))?;
            e.update(data);
            Some(e.clone())
        }

        pub fn remove(&self, id: &str) {
            if let Ok(id) = id.parse::<i64>() {
                self.items.lock().unwrap().retain(|e| e.id() != Some(id));
            }
        }
    }

    pub fn fields(title: &str, subtitle: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("Title".into(), Value::String(title.into()));
        map.insert("Subtitle".into(), Value::String(subtitle.into()));
        map
    }

    fn listing(store: &TestStore, id: Option<&str>) -> RawResult {
        match id {
            Some(id) => store.get(id).into(),
            None => Collection::new(store.all()).into(),
        }
    }

    pub fn get_only(store: Arc<TestStore>) -> Controller {
        Controller::builder("GetOnly")
            .get(move |_ctx, id| Ok(listing(&store, id)))
            .build()
    }

    pub fn delete_only(store: Arc<TestStore>) -> Controller {
        Controller::builder("DeleteOnly")
            .delete(move |_ctx, id| {
                if let Some(id) = id {
                    store.remove(id);
                }
                Ok(())
            })
            .build()
    }

    pub fn post_only(store: Arc<TestStore>) -> Controller {
        Controller::builder("PostOnly")
            .post(move |ctx, body| Ok(store.insert(ctx.decode_object(body)?)))
            .build()
    }

    pub fn put_only(store: Arc<TestStore>) -> Controller {
        Controller::builder("PutOnly")
            .put(move |ctx, id, body| {
                let data = ctx.decode_object(body)?;
                Ok(id.and_then(|id| store.update(id, &data)))
            })
            .build()
    }

    pub fn service(controller: Controller) -> RestService {
        RestService::new(controller, &RestConfig::default()).unwrap()
    }

    pub fn json_request(method: Method, path: &str, body: &str) -> RestRequest {
        RestRequest::from_path(method, path)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }
}

pub mod temp_files {
    use std::io::Write;

    use tempfile::NamedTempFile;

    /// Write `content` to a temporary `.yaml` file, removed on drop
    pub fn yaml(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("rest_dispatch_")
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }
}
