//! Per-resource request handling.

use crate::actions::{ActionName, ResourceActions};
use crate::collection::Collection;
use crate::config::ResponderConfig;
use crate::model::Attributes;
use crate::resource::Resource;
use crate::responders::{Format, Responder, Response};
use tracing::{info, instrument};

/// Runs one resource's actions and dispatches their outcomes.
pub struct ResourceController<C> {
    actions: ResourceActions<C>,
    responder: Responder,
}

impl<C: Collection> ResourceController<C> {
    pub fn new(resource: Resource, collection: C, config: ResponderConfig) -> Self {
        let responder = Responder::new(resource.clone(), config);
        Self {
            actions: ResourceActions::new(resource, collection),
            responder,
        }
    }

    pub fn with_responder(mut self, responder: Responder) -> Self {
        self.responder = responder;
        self
    }

    pub fn actions(&self) -> &ResourceActions<C> {
        &self.actions
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    #[instrument(skip(self, params), fields(resource = %self.actions.resource().name))]
    pub async fn handle(
        &self,
        action: ActionName,
        format: Format,
        params: &Attributes,
    ) -> Response {
        let response = match action {
            ActionName::Index => {
                let outcome = self.actions.index(params).await;
                self.responder.dispatch_request(action, format, params, outcome)
            }
            ActionName::Show => {
                let outcome = self.actions.show(params).await;
                self.responder.dispatch_request(action, format, params, outcome)
            }
            ActionName::Create => {
                let outcome = self.actions.create(params).await;
                self.responder.dispatch_request(action, format, params, outcome)
            }
            ActionName::Update => {
                let outcome = self.actions.update(params).await;
                self.responder.dispatch_request(action, format, params, outcome)
            }
            ActionName::Destroy => {
                let outcome = self.actions.destroy(params).await;
                self.responder.dispatch_request(action, format, params, outcome)
            }
        };
        info!(status = %response.status(), "Handled");
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::mock::MockCollection;
    use crate::collection::{CollectionError, Filter};
    use crate::config::Environment;
    use crate::model::Entity;
    use http::StatusCode;
    use serde_json::{json, Value};

    fn params(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_show_by_slug_as_json() {
        let mut mock = MockCollection::new("programs");
        let clu = Entity::new(params(json!({ "id": "u1", "name": "CLU", "slug": "clu" })));
        mock.expect_find_matching(Filter::eq("slug", "clu"))
            .return_ok(vec![clu.clone()]);

        let controller = ResourceController::new(
            Resource::new("programs").slugged(["name"]),
            mock.client(),
            ResponderConfig::new(Environment::Test),
        );
        let response = controller
            .handle(ActionName::Show, Format::Json, &params(json!({ "id": "clu" })))
            .await;

        assert_eq!(
            response,
            Response::Json {
                status: StatusCode::OK,
                body: json!({ "ok": true, "data": clu }),
            }
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_destroy_failure_redirects_back_to_member() {
        let mut mock = MockCollection::new("programs");
        let clu = Entity::new(params(json!({ "id": "u1", "name": "CLU", "slug": "clu" })));
        mock.expect_find_matching(Filter::eq("slug", "clu"))
            .return_ok(vec![clu]);
        mock.expect_destroy("u1").return_err(CollectionError::ActorClosed);

        let controller = ResourceController::new(
            Resource::new("programs").slugged(["name"]),
            mock.client(),
            ResponderConfig::default(),
        );
        let response = controller
            .handle(ActionName::Destroy, Format::Html, &params(json!({ "id": "clu" })))
            .await;

        match response {
            Response::Redirect(directive) => {
                assert!(directive.back);
                assert_eq!(directive.path, "/programs/clu");
            }
            other => panic!("expected redirect, got {other:?}"),
        }
        mock.verify();
    }
}
