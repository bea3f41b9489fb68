//! Shared CRUD actions for resources.
//!
//! [`ResourceActions`] runs the index/show/create/update/destroy pipelines of one
//! [`Resource`](crate::resource::Resource) against a [`Collection`](crate::collection::Collection).
//! Each pipeline is a fixed sequence of named steps (see [`steps`]); the first step
//! that fails ends the action and nothing after it touches the collection.

mod pipeline;
pub mod steps;

pub use pipeline::*;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The actions every resource supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    Index,
    Show,
    Create,
    Update,
    Destroy,
}

impl ActionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::Index => "index",
            ActionName::Show => "show",
            ActionName::Create => "create",
            ActionName::Update => "update",
            ActionName::Destroy => "destroy",
        }
    }

    /// Status of a successful response to this action.
    pub fn success_status(&self) -> StatusCode {
        match self {
            ActionName::Create => StatusCode::CREATED,
            _ => StatusCode::OK,
        }
    }

    /// Whether the action operates on a single identified entity.
    pub fn is_member(&self) -> bool {
        matches!(self, ActionName::Show | ActionName::Update | ActionName::Destroy)
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for ActionName {
    type Err = UnknownAction;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "index" => Ok(ActionName::Index),
            "show" => Ok(ActionName::Show),
            "create" => Ok(ActionName::Create),
            "update" => Ok(ActionName::Update),
            "destroy" => Ok(ActionName::Destroy),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_names() {
        assert_eq!("show".parse::<ActionName>(), Ok(ActionName::Show));
        assert_eq!(
            "publish".parse::<ActionName>(),
            Err(UnknownAction("publish".into()))
        );
    }

    #[test]
    fn test_only_create_declares_created_status() {
        assert_eq!(ActionName::Create.success_status(), StatusCode::CREATED);
        assert_eq!(ActionName::Update.success_status(), StatusCode::OK);
        assert!(ActionName::Destroy.is_member());
        assert!(!ActionName::Index.is_member());
    }
}
