//! Detail-view actions.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{Map, Value};
use shared_types::Row;

use super::callback::CallbackReturn;
use super::params::{ParamDescriptor, ParamSpec};
use super::text::title_case;

/// Coerced action parameters, keyed by parameter name.
pub type ActionParams = Map<String, Value>;

type ActionFn = Arc<
    dyn Fn(Row, ActionParams) -> BoxFuture<'static, anyhow::Result<CallbackReturn>> + Send + Sync,
>;

/// A named operation on a single entry.
#[derive(Clone)]
pub struct ActionSpec {
    pub reference: String,
    pub title: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    handler: ActionFn,
}

impl ActionSpec {
    pub fn new<F>(reference: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Row, ActionParams) -> BoxFuture<'static, anyhow::Result<CallbackReturn>>
            + Send
            + Sync
            + 'static,
    {
        let reference = reference.into();
        Self {
            title: title_case(&reference),
            reference,
            description: String::new(),
            params: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn descriptor(&self) -> ActionDescriptor {
        ActionDescriptor {
            title: self.title.clone(),
            reference: self.reference.clone(),
            description: self.description.clone(),
            parameters: self.params.iter().map(ParamDescriptor::from).collect(),
        }
    }

    pub(crate) async fn call(
        &self,
        entry: Row,
        params: ActionParams,
    ) -> anyhow::Result<CallbackReturn> {
        (self.handler)(entry, params).await
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("reference", &self.reference)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Action as listed on a detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDescriptor {
    pub title: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub description: String,
    pub parameters: Vec<ParamDescriptor>,
}
