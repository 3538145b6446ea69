//! The CRUD façade: a model type built from declarative action specs.
//!
//! # Design
//! A `ModelType` is a plain value holding its compiled action specs. There
//! is no global registry: the application builds one per resource and passes
//! it explicitly to consumers. Each operation delegates to the resolver for
//! request shaping and to the wrappers for response shaping; the façade
//! itself owns no state beyond its configuration.
//!
//! Operations take the transport as an argument, so the same model value
//! can be driven by a real HTTP client in production and a canned-response
//! fake in tests.

use serde_json::{Map, Value};

use crate::action::{Action, ActionSpec, CompiledAction};
use crate::error::{json_type, ModelError};
use crate::http::HttpRequest;
use crate::resolver::{resolve, Params};
use crate::transport::Transport;
use crate::wrap::{wrap_many, wrap_one, Collection, Instance};

#[derive(Debug, Default)]
struct CompiledActions {
    find_all: Option<CompiledAction>,
    find_one: Option<CompiledAction>,
    create: Option<CompiledAction>,
    update: Option<CompiledAction>,
    destroy: Option<CompiledAction>,
}

impl CompiledActions {
    fn slot(&self, action: Action) -> &Option<CompiledAction> {
        match action {
            Action::FindAll => &self.find_all,
            Action::FindOne => &self.find_one,
            Action::Create => &self.create,
            Action::Update => &self.update,
            Action::Destroy => &self.destroy,
        }
    }

    fn slot_mut(&mut self, action: Action) -> &mut Option<CompiledAction> {
        match action {
            Action::FindAll => &mut self.find_all,
            Action::FindOne => &mut self.find_one,
            Action::Create => &mut self.create,
            Action::Update => &mut self.update,
            Action::Destroy => &mut self.destroy,
        }
    }
}

/// A model type: the declarative CRUD contract for one server-side
/// resource, compiled and validated at build time.
#[derive(Debug)]
pub struct ModelType {
    name: String,
    base_url: String,
    actions: CompiledActions,
}

impl ModelType {
    pub fn builder(name: &str) -> ModelBuilder {
        ModelBuilder {
            name: name.to_string(),
            base_url: String::new(),
            specs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve and execute one action, returning the raw response JSON.
    ///
    /// Overrides are fully delegated: the function issues its own request
    /// and this method does no request shaping of its own for them.
    fn perform(
        &self,
        action: Action,
        transport: &dyn Transport,
        params: Params,
    ) -> Result<Value, ModelError> {
        let compiled = self.actions.slot(action).as_ref().ok_or_else(|| {
            ModelError::Configuration(format!(
                "model `{}` has no {} action configured",
                self.name,
                action.name()
            ))
        })?;

        match compiled {
            CompiledAction::Override(run) => run(params, transport),
            CompiledAction::Route { method, template } => {
                let mut descriptor = resolve(*method, template, params)?;
                if !self.base_url.is_empty() {
                    descriptor.url = format!("{}{}", self.base_url, descriptor.url);
                }
                let response = transport.request(HttpRequest::from_descriptor(descriptor))?;
                if !response.is_success() {
                    return Err(ModelError::Http {
                        status: response.status,
                        body: response.body,
                    });
                }
                // A 204-style empty body reads as an empty object so that
                // merge-based flows have something to merge.
                if response.body.trim().is_empty() {
                    return Ok(Value::Object(Map::new()));
                }
                serde_json::from_str(&response.body)
                    .map_err(|e| ModelError::Transport(format!("invalid JSON response: {e}")))
            }
        }
    }

    /// Fetch every record matching `params`, wrapped in server order.
    pub fn find_all(
        &self,
        transport: &dyn Transport,
        params: Params,
    ) -> Result<Collection, ModelError> {
        wrap_many(self.perform(Action::FindAll, transport, params)?)
    }

    /// Fetch a single record.
    pub fn find_one(
        &self,
        transport: &dyn Transport,
        params: Params,
    ) -> Result<Instance, ModelError> {
        wrap_one(self.perform(Action::FindOne, transport, params)?)
    }

    /// Create a record from `attrs`. The result carries the input
    /// attributes merged with every server-returned field, so a server
    /// answering only `{"id": 5}` still yields a fully populated instance.
    pub fn create(
        &self,
        transport: &dyn Transport,
        attrs: Params,
    ) -> Result<Instance, ModelError> {
        let mut instance = Instance::new(attrs.clone());
        let json = self.perform(Action::Create, transport, attrs)?;
        instance.merge(object_fields(json)?);
        Ok(instance)
    }

    /// Update the record identified by `id` with `attrs`. The id fills the
    /// URL template; server-returned fields are merged over the attrs.
    pub fn update(
        &self,
        transport: &dyn Transport,
        id: Value,
        attrs: Params,
    ) -> Result<Instance, ModelError> {
        let mut params = attrs;
        params.insert("id".to_string(), id);
        let mut instance = Instance::new(params.clone());
        let json = self.perform(Action::Update, transport, params)?;
        instance.merge(object_fields(json)?);
        Ok(instance)
    }

    /// Delete the record identified by `id`.
    pub fn destroy(&self, transport: &dyn Transport, id: Value) -> Result<(), ModelError> {
        let mut params = Params::new();
        params.insert("id".to_string(), id);
        self.perform(Action::Destroy, transport, params)?;
        Ok(())
    }

    /// Create the instance's record on the server and merge the returned
    /// fields (notably a generated id) back into it.
    pub fn save(
        &self,
        transport: &dyn Transport,
        instance: &mut Instance,
    ) -> Result<(), ModelError> {
        instance.guard_live()?;
        let json = self.perform(Action::Create, transport, instance.attributes().clone())?;
        instance.merge(object_fields(json)?);
        Ok(())
    }

    /// Update the instance's record with `attrs`, using its id to fill the
    /// URL template. On success, `attrs` and the server-returned fields are
    /// applied to the instance.
    pub fn update_instance(
        &self,
        transport: &dyn Transport,
        instance: &mut Instance,
        attrs: Params,
    ) -> Result<(), ModelError> {
        instance.guard_live()?;
        let mut params = attrs.clone();
        if !params.contains_key("id") {
            if let Some(id) = instance.id() {
                params.insert("id".to_string(), id.clone());
            }
        }
        let json = self.perform(Action::Update, transport, params)?;
        instance.merge(attrs);
        instance.merge(object_fields(json)?);
        Ok(())
    }

    /// Delete the instance's record. On success the instance is logically
    /// dead: any further save/update/destroy through it fails with
    /// `Destroyed`.
    pub fn destroy_instance(
        &self,
        transport: &dyn Transport,
        instance: &mut Instance,
    ) -> Result<(), ModelError> {
        instance.guard_live()?;
        let mut params = Params::new();
        if let Some(id) = instance.id() {
            params.insert("id".to_string(), id.clone());
        }
        self.perform(Action::Destroy, transport, params)?;
        instance.mark_destroyed();
        Ok(())
    }
}

/// Builder for `ModelType`. Every action setter accepts anything that
/// converts into an `ActionSpec` (`&str` and `String` become templates).
/// `build` compiles all specs, so configuration errors surface here.
pub struct ModelBuilder {
    name: String,
    base_url: String,
    specs: Vec<(Action, ActionSpec)>,
}

impl ModelBuilder {
    /// Prefix applied to every resolved URL. A trailing slash is stripped.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn find_all(self, spec: impl Into<ActionSpec>) -> Self {
        self.action(Action::FindAll, spec)
    }

    pub fn find_one(self, spec: impl Into<ActionSpec>) -> Self {
        self.action(Action::FindOne, spec)
    }

    pub fn create(self, spec: impl Into<ActionSpec>) -> Self {
        self.action(Action::Create, spec)
    }

    pub fn update(self, spec: impl Into<ActionSpec>) -> Self {
        self.action(Action::Update, spec)
    }

    pub fn destroy(self, spec: impl Into<ActionSpec>) -> Self {
        self.action(Action::Destroy, spec)
    }

    pub fn action(mut self, action: Action, spec: impl Into<ActionSpec>) -> Self {
        self.specs.push((action, spec.into()));
        self
    }

    pub fn build(self) -> Result<ModelType, ModelError> {
        let mut actions = CompiledActions::default();
        for (action, spec) in self.specs {
            let slot = actions.slot_mut(action);
            if slot.is_some() {
                return Err(ModelError::Configuration(format!(
                    "duplicate {} action spec for model `{}`",
                    action.name(),
                    self.name
                )));
            }
            *slot = Some(CompiledAction::compile(action, spec)?);
        }
        Ok(ModelType {
            name: self.name,
            base_url: self.base_url,
            actions,
        })
    }
}

fn object_fields(json: Value) -> Result<Map<String, Value>, ModelError> {
    match json {
        Value::Object(fields) => Ok(fields),
        other => Err(ModelError::TypeMismatch {
            expected: "object",
            found: json_type(&other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use serde_json::json;

    use super::*;
    use crate::http::{HttpMethod, HttpResponse};

    /// Canned-response transport that records every request it is handed.
    struct FakeTransport {
        responses: RefCell<VecDeque<HttpResponse>>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn new() -> Self {
            FakeTransport {
                responses: RefCell::new(VecDeque::new()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn respond(self, status: u16, body: &str) -> Self {
            self.responses.borrow_mut().push_back(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            });
            self
        }

        fn sent(&self) -> Vec<HttpRequest> {
            self.requests.borrow().clone()
        }
    }

    impl Transport for FakeTransport {
        fn request(&self, request: HttpRequest) -> Result<HttpResponse, ModelError> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| ModelError::Transport("no canned response".to_string()))
        }
    }

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    fn task_model() -> ModelType {
        ModelType::builder("task")
            .find_all("/tasks.json")
            .find_one("/tasks/{id}.json")
            .create("/tasks.json")
            .update("/tasks/{id}.json")
            .destroy("/tasks/{id}.json")
            .build()
            .unwrap()
    }

    #[test]
    fn find_all_issues_get_with_filter_as_query_string() {
        let transport = FakeTransport::new().respond(200, r#"[{"id":1,"name":"foo"}]"#);
        let tasks = task_model().find_all(&transport, params(json!({"foo": "bar"}))).unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].url, "/tasks.json?foo=bar");

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].get("name"), Some(&json!("foo")));
    }

    #[test]
    fn find_one_substitutes_id_into_the_template() {
        let transport = FakeTransport::new().respond(200, r#"{"id":5,"name":"foo"}"#);
        let task = task_model()
            .find_one(&transport, params(json!({"id": 5})))
            .unwrap();

        assert_eq!(transport.sent()[0].url, "/tasks/5.json");
        assert_eq!(task.id(), Some(&json!(5)));
    }

    #[test]
    fn create_posts_attrs_and_merges_the_generated_id() {
        let transport = FakeTransport::new().respond(201, r#"{"id":5}"#);
        let task = task_model()
            .create(&transport, params(json!({"name": "justin"})))
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].url, "/tasks.json");
        let body: Value = serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "justin"}));

        // Server returned only the id; the result still carries the attrs.
        assert_eq!(task.id(), Some(&json!(5)));
        assert_eq!(task.get("name"), Some(&json!("justin")));
    }

    #[test]
    fn update_puts_attrs_with_id_in_the_url_only() {
        let transport = FakeTransport::new().respond(200, r#"{}"#);
        let task = task_model()
            .update(&transport, json!(5), params(json!({"name": "justin"})))
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].method, HttpMethod::Put);
        assert_eq!(sent[0].url, "/tasks/5.json");
        let body: Value = serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "justin"}));

        assert_eq!(task.id(), Some(&json!(5)));
        assert_eq!(task.get("name"), Some(&json!("justin")));
    }

    #[test]
    fn destroy_issues_delete_on_the_id_url() {
        let transport = FakeTransport::new().respond(204, "");
        task_model().destroy(&transport, json!(5)).unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].method, HttpMethod::Delete);
        assert_eq!(sent[0].url, "/tasks/5.json");
        assert!(sent[0].body.is_none());
    }

    #[test]
    fn save_merges_server_fields_into_the_instance() {
        let transport = FakeTransport::new().respond(201, r#"{"id":7}"#);
        let model = task_model();
        let mut task = Instance::new(params(json!({"name": "alex"})));
        model.save(&transport, &mut task).unwrap();

        assert_eq!(task.id(), Some(&json!(7)));
        assert_eq!(task.get("name"), Some(&json!("alex")));
    }

    #[test]
    fn update_instance_uses_the_instance_id_and_applies_attrs() {
        let transport = FakeTransport::new().respond(200, r#"{}"#);
        let model = task_model();
        let mut task = Instance::new(params(json!({"id": 5, "name": "justin"})));
        model
            .update_instance(&transport, &mut task, params(json!({"name": "jeremy"})))
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].url, "/tasks/5.json");
        let body: Value = serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "jeremy"}));
        assert_eq!(task.get("name"), Some(&json!("jeremy")));
    }

    #[test]
    fn destroy_instance_marks_the_instance_dead() {
        let transport = FakeTransport::new().respond(204, "");
        let model = task_model();
        let mut task = Instance::new(params(json!({"id": 5})));
        model.destroy_instance(&transport, &mut task).unwrap();
        assert!(task.is_destroyed());
    }

    #[test]
    fn update_after_destroy_fails_fast() {
        let transport = FakeTransport::new().respond(204, "");
        let model = task_model();
        let mut task = Instance::new(params(json!({"id": 5})));
        model.destroy_instance(&transport, &mut task).unwrap();

        let err = model
            .update_instance(&transport, &mut task, params(json!({"name": "x"})))
            .unwrap_err();
        assert!(matches!(err, ModelError::Destroyed));
        // The transport saw only the destroy, nothing afterwards.
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn save_and_destroy_after_destroy_fail_fast() {
        let transport = FakeTransport::new().respond(204, "");
        let model = task_model();
        let mut task = Instance::new(params(json!({"id": 5})));
        model.destroy_instance(&transport, &mut task).unwrap();

        assert!(matches!(
            model.save(&transport, &mut task).unwrap_err(),
            ModelError::Destroyed
        ));
        assert!(matches!(
            model.destroy_instance(&transport, &mut task).unwrap_err(),
            ModelError::Destroyed
        ));
    }

    #[test]
    fn unconfigured_action_is_a_configuration_error() {
        let model = ModelType::builder("task")
            .find_all("/tasks.json")
            .build()
            .unwrap();
        let transport = FakeTransport::new();
        let err = model
            .find_one(&transport, params(json!({"id": 1})))
            .unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn duplicate_action_spec_is_rejected_at_build_time() {
        let err = ModelType::builder("task")
            .find_all("/tasks.json")
            .find_all("/other.json")
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
    }

    #[test]
    fn bad_verb_token_is_rejected_at_build_time() {
        let err = ModelType::builder("task")
            .destroy("DESTROY /task/delete/{id}.json")
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
    }

    #[test]
    fn verb_prefixed_template_overrides_the_default_method() {
        let model = ModelType::builder("task")
            .destroy("POST /task/delete/{id}.json")
            .build()
            .unwrap();
        let transport = FakeTransport::new().respond(200, r#"{}"#);
        model.destroy(&transport, json!(5)).unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].url, "/task/delete/5.json");
    }

    #[test]
    fn base_url_prefixes_every_resolved_url() {
        let model = ModelType::builder("task")
            .base_url("http://localhost:3000/")
            .find_all("/tasks.json")
            .build()
            .unwrap();
        let transport = FakeTransport::new().respond(200, "[]");
        model.find_all(&transport, Params::new()).unwrap();
        assert_eq!(transport.sent()[0].url, "http://localhost:3000/tasks.json");
    }

    #[test]
    fn non_success_status_becomes_an_http_error() {
        let transport = FakeTransport::new().respond(500, "internal error");
        let err = task_model().find_all(&transport, Params::new()).unwrap_err();
        assert!(matches!(err, ModelError::Http { status: 500, .. }));
    }

    #[test]
    fn invalid_json_response_is_a_transport_error() {
        let transport = FakeTransport::new().respond(200, "not json");
        let err = task_model().find_all(&transport, Params::new()).unwrap_err();
        assert!(matches!(err, ModelError::Transport(_)));
    }

    #[test]
    fn object_response_to_find_all_is_a_type_mismatch() {
        let transport = FakeTransport::new().respond(200, r#"{"id":1}"#);
        let err = task_model().find_all(&transport, Params::new()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::TypeMismatch {
                expected: "array",
                ..
            }
        ));
    }

    #[test]
    fn missing_placeholder_param_is_a_template_error() {
        let transport = FakeTransport::new();
        let err = task_model().find_one(&transport, Params::new()).unwrap_err();
        assert!(matches!(err, ModelError::Template { placeholder } if placeholder == "id"));
    }

    #[test]
    fn override_action_owns_the_request_and_gets_wrapped() {
        let model = ModelType::builder("contact")
            .action(
                Action::FindAll,
                ActionSpec::Override(Box::new(|params, transport| {
                    // Issue a request by hand, shaped however we like.
                    let url = match params.get("archived") {
                        Some(Value::Bool(true)) => "/contacts/archived.json",
                        _ => "/contacts.json",
                    };
                    let response = transport.request(HttpRequest {
                        method: HttpMethod::Get,
                        url: url.to_string(),
                        headers: Vec::new(),
                        body: None,
                    })?;
                    serde_json::from_str(&response.body)
                        .map_err(|e| ModelError::Transport(e.to_string()))
                })),
            )
            .build()
            .unwrap();

        let transport = FakeTransport::new().respond(200, r#"[{"id":1,"name":"Alex"}]"#);
        let contacts = model
            .find_all(&transport, params(json!({"archived": true})))
            .unwrap();

        assert_eq!(transport.sent()[0].url, "/contacts/archived.json");
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].get("name"), Some(&json!("Alex")));
    }

    #[test]
    fn empty_body_on_update_keeps_local_attrs() {
        // Some servers answer an update with an empty 200.
        let transport = FakeTransport::new().respond(200, "");
        let task = task_model()
            .update(&transport, json!(5), params(json!({"name": "justin"})))
            .unwrap();
        assert_eq!(task.get("name"), Some(&json!("justin")));
    }
}
