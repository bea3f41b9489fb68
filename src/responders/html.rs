//! Render and redirect directives for HTML requests.
//!
//! Every action declares a success directive, an ordered list of failure rules
//! and a fallback for failures no rule matches. [`HtmlResponder::new`] starts from
//! [`default_rules`]; callers replace an action's rules with
//! [`HtmlResponder::with_action_rules`] or put a failure rule in front with
//! [`HtmlResponder::with_failure_rule`].

use super::json::{ErrorMatcher, JsonResponder};
use super::{Flash, FlashLevel, RedirectDirective, RenderDirective, Response};
use crate::actions::ActionName;
use crate::config::ResponderConfig;
use crate::error::{ErrorKind, ResourceError};
use crate::model::{Attributes, Entity};
use crate::resource::Resource;
use http::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

pub const INDEX_COMPONENT: &str = "Views::Resources::Index";
pub const SHOW_COMPONENT: &str = "Views::Resources::Show";
pub const NEW_COMPONENT: &str = "Views::Resources::New";
pub const EDIT_COMPONENT: &str = "Views::Resources::Edit";
pub const MISSING_COMPONENT: &str = "Views::Pages::Missing";
pub const ERROR_COMPONENT: &str = "Views::Pages::Error";

/// What to do with a success or failure of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlDirective {
    /// Render a component. Without a status, successes use the action's status
    /// and failures the status of the error table.
    Render {
        component: String,
        status: Option<StatusCode>,
        flash: Option<FlashLevel>,
    },
    RedirectToIndex { flash: Option<FlashLevel> },
    /// Redirect to the show path of the entity, or of the requested identifier
    /// on failure.
    RedirectToShow { flash: Option<FlashLevel> },
    /// Redirect to the referring page, falling back to the show path.
    RedirectBack { flash: Option<FlashLevel> },
}

impl HtmlDirective {
    pub fn render(component: impl Into<String>) -> Self {
        HtmlDirective::Render {
            component: component.into(),
            status: None,
            flash: None,
        }
    }

    pub fn render_with_status(component: impl Into<String>, status: StatusCode) -> Self {
        HtmlDirective::Render {
            component: component.into(),
            status: Some(status),
            flash: None,
        }
    }

    fn missing() -> Self {
        Self::render_with_status(MISSING_COMPONENT, StatusCode::NOT_FOUND)
    }

    fn invalid_form(component: &str) -> Self {
        HtmlDirective::Render {
            component: component.to_string(),
            status: Some(StatusCode::UNPROCESSABLE_ENTITY),
            flash: Some(FlashLevel::Danger),
        }
    }
}

/// The declared directives of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRules {
    pub success: HtmlDirective,
    pub failures: Vec<(ErrorMatcher, HtmlDirective)>,
    pub fallback: HtmlDirective,
}

impl ActionRules {
    pub fn new(success: HtmlDirective, fallback: HtmlDirective) -> Self {
        Self {
            success,
            failures: Vec::new(),
            fallback,
        }
    }

    /// Adds a failure rule checked after the existing ones.
    pub fn on_failure(mut self, matcher: ErrorMatcher, directive: HtmlDirective) -> Self {
        self.failures.push((matcher, directive));
        self
    }

    fn directive_for(&self, error: &ResourceError) -> &HtmlDirective {
        self.failures
            .iter()
            .find(|(matcher, _)| matcher.matches(error))
            .map(|(_, directive)| directive)
            .unwrap_or(&self.fallback)
    }
}

/// The default rules of every action.
pub fn default_rules() -> HashMap<ActionName, ActionRules> {
    use ErrorKind::{FailedValidation, NotFound, NotUnique};
    use ErrorMatcher::Kind;

    let success = Some(FlashLevel::Success);
    let danger = Some(FlashLevel::Danger);

    let mut rules = HashMap::new();
    rules.insert(
        ActionName::Index,
        ActionRules::new(
            HtmlDirective::render(INDEX_COMPONENT),
            HtmlDirective::render(INDEX_COMPONENT),
        ),
    );
    rules.insert(
        ActionName::Show,
        ActionRules::new(
            HtmlDirective::render(SHOW_COMPONENT),
            HtmlDirective::render(ERROR_COMPONENT),
        )
        .on_failure(Kind(NotFound), HtmlDirective::missing())
        .on_failure(Kind(NotUnique), HtmlDirective::missing()),
    );
    rules.insert(
        ActionName::Create,
        ActionRules::new(
            HtmlDirective::RedirectToShow { flash: success },
            HtmlDirective::RedirectToIndex { flash: danger },
        )
        .on_failure(Kind(FailedValidation), HtmlDirective::invalid_form(NEW_COMPONENT)),
    );
    rules.insert(
        ActionName::Update,
        ActionRules::new(
            HtmlDirective::RedirectToShow { flash: success },
            HtmlDirective::RedirectBack { flash: danger },
        )
        .on_failure(Kind(FailedValidation), HtmlDirective::invalid_form(EDIT_COMPONENT))
        .on_failure(Kind(NotFound), HtmlDirective::missing())
        .on_failure(Kind(NotUnique), HtmlDirective::missing()),
    );
    rules.insert(
        ActionName::Destroy,
        ActionRules::new(
            HtmlDirective::RedirectToIndex {
                flash: Some(FlashLevel::Warning),
            },
            HtmlDirective::RedirectBack { flash: danger },
        )
        .on_failure(Kind(NotFound), HtmlDirective::missing())
        .on_failure(Kind(NotUnique), HtmlDirective::missing()),
    );
    rules
}

/// What a request named besides the action.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RequestContext<'a> {
    /// The requested member, for show/update/destroy.
    pub identifier: Option<&'a str>,
    /// Attributes submitted with a create or update, assigned back to re-rendered forms.
    pub submitted: Option<&'a Attributes>,
}

impl<'a> RequestContext<'a> {
    pub fn member(identifier: &'a str) -> Self {
        Self {
            identifier: Some(identifier),
            submitted: None,
        }
    }

    /// Reads the identifier and submitted attributes of `action` from request
    /// `params`, the same way [`Resource::identifier`] and
    /// [`Resource::attributes`] do.
    pub fn from_params(resource: &Resource, action: ActionName, params: &'a Attributes) -> Self {
        let identifier = params
            .get("id")
            .and_then(Value::as_str)
            .filter(|_| action.is_member());
        let submitted = params
            .get(&resource.singular_name)
            .and_then(Value::as_object)
            .filter(|_| matches!(action, ActionName::Create | ActionName::Update));
        Self {
            identifier,
            submitted,
        }
    }
}

/// Turns action outcomes into render or redirect directives.
#[derive(Debug, Clone)]
pub struct HtmlResponder {
    resource: Resource,
    layout: Option<String>,
    errors: JsonResponder,
    rules: HashMap<ActionName, ActionRules>,
}

impl HtmlResponder {
    pub fn new(resource: Resource, config: ResponderConfig) -> Self {
        Self {
            resource,
            layout: config.layout.clone(),
            errors: JsonResponder::new(config),
            rules: default_rules(),
        }
    }

    /// Replaces every rule of `action`.
    pub fn with_action_rules(mut self, action: ActionName, rules: ActionRules) -> Self {
        self.rules.insert(action, rules);
        self
    }

    /// Adds a failure rule of `action` checked before its existing ones.
    pub fn with_failure_rule(
        mut self,
        action: ActionName,
        matcher: ErrorMatcher,
        directive: HtmlDirective,
    ) -> Self {
        self.rules
            .entry(action)
            .or_insert_with(|| {
                ActionRules::new(
                    HtmlDirective::render(ERROR_COMPONENT),
                    HtmlDirective::render(ERROR_COMPONENT),
                )
            })
            .failures
            .insert(0, (matcher, directive));
        self
    }

    /// Uses `errors` for the statuses and concealment of rendered errors.
    pub fn with_errors(mut self, errors: JsonResponder) -> Self {
        self.errors = errors;
        self
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn rules(&self, action: ActionName) -> Option<&ActionRules> {
        self.rules.get(&action)
    }

    /// Responds to a successful `action` whose serialized result is `value`.
    pub fn success(&self, action: ActionName, value: Value) -> Response {
        let Some(rules) = self.rules.get(&action) else {
            let error = ResourceError::generic(format!("no HTML rules for {action}"));
            return self.error_page(error);
        };
        debug!(%action, directive = ?rules.success, "Responding to success");

        let entity = match &value {
            Value::Object(attributes) => Some(Entity::new(attributes.clone())),
            _ => None,
        };
        let entity_path = || {
            entity
                .as_ref()
                .map(|entity| self.resource.show_path(entity))
                .unwrap_or_else(|| self.resource.index_path())
        };
        match &rules.success {
            HtmlDirective::Render {
                component,
                status,
                flash,
            } => {
                let mut assigns = self.base_assigns();
                let name = match action {
                    ActionName::Index => &self.resource.name,
                    _ => &self.resource.singular_name,
                };
                assigns.insert(name.clone(), value);
                Response::Render(RenderDirective {
                    component: component.clone(),
                    assigns,
                    flash: flash.map(|level| self.flash(action, level)),
                    layout: self.layout.clone(),
                    status: status.unwrap_or_else(|| action.success_status()),
                })
            }
            HtmlDirective::RedirectToIndex { flash } => Response::Redirect(RedirectDirective::to(
                self.resource.index_path(),
                flash.map(|level| self.flash(action, level)),
            )),
            HtmlDirective::RedirectToShow { flash } => Response::Redirect(RedirectDirective::to(
                entity_path(),
                flash.map(|level| self.flash(action, level)),
            )),
            HtmlDirective::RedirectBack { flash } => Response::Redirect(RedirectDirective::back(
                entity_path(),
                flash.map(|level| self.flash(action, level)),
            )),
        }
    }

    /// Responds to a failed `action`.
    ///
    /// Rendered failures carry the submitted attributes under the singular
    /// resource name so forms can be filled in again.
    pub fn failure(
        &self,
        action: ActionName,
        context: RequestContext<'_>,
        error: &ResourceError,
    ) -> Response {
        let (table_status, public_error) = self.errors.public_error(error);
        let Some(rules) = self.rules.get(&action) else {
            return self.error_page(public_error);
        };
        let directive = rules.directive_for(error);
        debug!(%action, kind = ?error.kind(), ?directive, "Responding to failure");

        let member_path = || match context.identifier {
            Some(identifier) => format!("{}/{}", self.resource.index_path(), identifier),
            None => self.resource.index_path(),
        };
        match directive {
            HtmlDirective::Render {
                component,
                status,
                flash,
            } => {
                let mut assigns = self.base_assigns();
                if let Some(submitted) = context.submitted {
                    assigns.insert(
                        self.resource.singular_name.clone(),
                        Value::Object(submitted.clone()),
                    );
                }
                assigns.insert("error".to_string(), public_error.as_json());
                Response::Render(RenderDirective {
                    component: component.clone(),
                    assigns,
                    flash: flash.map(|level| self.flash(action, level)),
                    layout: self.layout.clone(),
                    status: status.unwrap_or(table_status),
                })
            }
            HtmlDirective::RedirectToIndex { flash } => Response::Redirect(RedirectDirective::to(
                self.resource.index_path(),
                flash.map(|level| self.flash(action, level)),
            )),
            HtmlDirective::RedirectToShow { flash } => Response::Redirect(RedirectDirective::to(
                member_path(),
                flash.map(|level| self.flash(action, level)),
            )),
            HtmlDirective::RedirectBack { flash } => Response::Redirect(RedirectDirective::back(
                member_path(),
                flash.map(|level| self.flash(action, level)),
            )),
        }
    }

    fn error_page(&self, error: ResourceError) -> Response {
        let mut assigns = self.base_assigns();
        assigns.insert("error".to_string(), error.as_json());
        Response::Render(RenderDirective {
            component: ERROR_COMPONENT.to_string(),
            assigns,
            flash: None,
            layout: self.layout.clone(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        })
    }

    fn base_assigns(&self) -> Attributes {
        let mut assigns = Attributes::new();
        assigns.insert("resource".to_string(), self.resource.descriptor());
        assigns
    }

    fn flash(&self, action: ActionName, level: FlashLevel) -> Flash {
        let singular = &self.resource.singular_name;
        let message = match (level, action) {
            (FlashLevel::Danger, _) => format!("Unable to {action} {singular}"),
            (_, ActionName::Create) => format!("Successfully created {singular}"),
            (_, ActionName::Update) => format!("Successfully updated {singular}"),
            (_, ActionName::Destroy) => format!("Successfully destroyed {singular}"),
            (_, action) => format!("Completed {action} of {}", self.resource.name),
        };
        Flash { level, message }
    }
}
