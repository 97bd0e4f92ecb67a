//! Callback return values and the response envelope they map to.
//!
//! Actions, create views and input forms all return a `CallbackReturn`.
//! `classify` turns it into the `ActionResponse` the client acts on:
//!
//! ```text
//! None / null              -> {message: "Success"}
//! "text"                   -> {message: "text"}
//! Refresh                  -> {message, refresh: true}
//! RedirectDetail           -> {message, redirect: {type: "detail", resource, id}}
//! RedirectList             -> {message, redirect: {type: "list", resource, filters, sort?}}
//! RedirectPage             -> {message, redirect: {type: "page", page}}
//! {"id": ..} + resource    -> same as RedirectDetail on the current resource
//! anything else            -> ContractViolation
//! ```

use serde::Serialize;
use serde_json::Value;
use shared_types::{render_value, AppliedFilter, Sort};

use super::error::PipelineError;

const SUCCESS: &str = "Success";

/// What a user callback hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackReturn {
    None,
    Message(String),
    Refresh {
        message: Option<String>,
    },
    RedirectDetail {
        message: Option<String>,
        resource: String,
        id: String,
    },
    RedirectList {
        message: Option<String>,
        resource: String,
        filters: Vec<AppliedFilter>,
        sort: Option<Sort>,
    },
    RedirectPage {
        message: Option<String>,
        page: String,
    },
    /// Untyped return, classified by shape.
    Value(Value),
}

impl CallbackReturn {
    pub fn refresh() -> Self {
        CallbackReturn::Refresh { message: None }
    }

    pub fn redirect_detail(resource: impl Into<String>, id: impl Into<String>) -> Self {
        CallbackReturn::RedirectDetail {
            message: None,
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn redirect_list(resource: impl Into<String>, filters: Vec<AppliedFilter>) -> Self {
        CallbackReturn::RedirectList {
            message: None,
            resource: resource.into(),
            filters,
            sort: None,
        }
    }

    pub fn redirect_page(page: impl Into<String>) -> Self {
        CallbackReturn::RedirectPage {
            message: None,
            page: page.into(),
        }
    }

    /// Attach a message. No effect on `None`, `Message` and `Value`.
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            CallbackReturn::Refresh { message }
            | CallbackReturn::RedirectDetail { message, .. }
            | CallbackReturn::RedirectList { message, .. }
            | CallbackReturn::RedirectPage { message, .. } => *message = Some(text.into()),
            _ => {}
        }
        self
    }
}

impl From<()> for CallbackReturn {
    fn from(_: ()) -> Self {
        CallbackReturn::None
    }
}

impl From<&str> for CallbackReturn {
    fn from(s: &str) -> Self {
        CallbackReturn::Message(s.to_string())
    }
}

impl From<String> for CallbackReturn {
    fn from(s: String) -> Self {
        CallbackReturn::Message(s)
    }
}

impl From<Value> for CallbackReturn {
    fn from(v: Value) -> Self {
        CallbackReturn::Value(v)
    }
}

/// Where the client navigates after a callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Redirect {
    Detail {
        resource: String,
        id: String,
    },
    List {
        resource: String,
        filters: Vec<AppliedFilter>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Option<Sort>,
    },
    Page {
        page: String,
    },
}

/// Envelope returned by actions, create views and input forms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub refresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl ActionResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            refresh: false,
            redirect: None,
            failed: false,
        }
    }

    /// A non-fatal failure shown inline by the client.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            failed: true,
            ..Self::message(message)
        }
    }

    fn redirect(message: Option<String>, redirect: Redirect) -> Self {
        Self {
            redirect: Some(redirect),
            ..Self::message(message.unwrap_or_else(|| SUCCESS.to_string()))
        }
    }
}

/// Map a callback return to its response.
///
/// `current_resource` enables the `{"id": ..}` shorthand for redirecting to
/// the entry a create view or action just touched.
pub fn classify(
    ret: CallbackReturn,
    current_resource: Option<&str>,
) -> Result<ActionResponse, PipelineError> {
    let response = match ret {
        CallbackReturn::None => ActionResponse::message(SUCCESS),
        CallbackReturn::Message(m) => ActionResponse::message(m),
        CallbackReturn::Refresh { message } => ActionResponse {
            refresh: true,
            ..ActionResponse::message(message.unwrap_or_else(|| SUCCESS.to_string()))
        },
        CallbackReturn::RedirectDetail {
            message,
            resource,
            id,
        } => ActionResponse::redirect(message, Redirect::Detail { resource, id }),
        CallbackReturn::RedirectList {
            message,
            resource,
            filters,
            sort,
        } => ActionResponse::redirect(
            message,
            Redirect::List {
                resource,
                filters,
                sort,
            },
        ),
        CallbackReturn::RedirectPage { message, page } => {
            ActionResponse::redirect(message, Redirect::Page { page })
        }
        CallbackReturn::Value(value) => return classify_value(value, current_resource),
    };
    Ok(response)
}

fn classify_value(
    value: Value,
    current_resource: Option<&str>,
) -> Result<ActionResponse, PipelineError> {
    match (&value, current_resource) {
        (Value::Null, _) => Ok(ActionResponse::message(SUCCESS)),
        (Value::String(s), _) => Ok(ActionResponse::message(s.clone())),
        (Value::Object(map), Some(resource)) => match map.get("id") {
            Some(id) if !id.is_null() => classify(
                CallbackReturn::redirect_detail(resource, render_value(id)),
                None,
            ),
            _ => Err(PipelineError::ContractViolation(value.to_string())),
        },
        _ => Err(PipelineError::ContractViolation(value.to_string())),
    }
}
