//! Demo admin configuration over in-memory users and items.
//!
//! Exercises every view kind: lists with links and hidden filters, a
//! detail view with actions, a sub-table, a graph and a live field, a create
//! view, pages and input forms.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use at_01_column_model::{FieldSpec, LinkDetail, LinkTable, LiveValue};
use at_02_resolver::{ColumnSchema, InMemoryResolver};
use at_03_view_pipeline::{
    ActionSpec, AdminConfig, CallbackReturn, CreateView, DetailView, FormCallback, FormSchema,
    GraphData, GraphRange, GraphSpec, InputForm, LineChart, ListView, Page, ParamSpec, Resource,
    SubTable, TextSource,
};
use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use rand::Rng;
use serde_json::{json, Map, Value};
use shared_types::{render_value, AppliedFilter, FilterOp, Row, SortDirection, User};
use tracing::info;

pub const USERS: &str = "User";
pub const ITEMS: &str = "Items";
pub const PUBLIC_ITEMS: &str = "Public Items";

/// Backing stores of the demo resources.
#[derive(Clone)]
pub struct DemoData {
    pub users: Arc<InMemoryResolver>,
    pub items: Arc<InMemoryResolver>,
    topic_prefix: String,
}

impl DemoData {
    /// Two users and nine items with random names. Each user's live field
    /// subscribes to `{topic_prefix}user-{id}`.
    pub fn seed(topic_prefix: impl Into<String>) -> Result<Self> {
        let users = InMemoryResolver::new(
            vec![
                ColumnSchema::integer("id", "ID"),
                ColumnSchema::text("email", "Email"),
                ColumnSchema::bool("is_active", "Active"),
                ColumnSchema::integer("item_count", "Items"),
                ColumnSchema::text("created_at", "Created At"),
                ColumnSchema::text("topic_value", "Topic"),
                ColumnSchema::integer("initial_topic_value", "Initial Value"),
            ],
            "id",
        )?;
        let items = InMemoryResolver::new(
            vec![
                ColumnSchema::integer("id", "ID"),
                ColumnSchema::text("title", "Title"),
                ColumnSchema::text("description", "Description"),
                ColumnSchema::integer("owner_id", "Owner"),
                ColumnSchema::text("owner_email", "Owner Email"),
                ColumnSchema::bool("public", "Public"),
            ],
            "id",
        )?;
        let data = Self {
            users: Arc::new(users),
            items: Arc::new(items),
            topic_prefix: topic_prefix.into(),
        };

        let mut rng = rand::thread_rng();
        let u1 = data.add_user(&format!("{}@email.local", rng.gen_range(10..10_000_000_000u64)))?;
        let u2 = data.add_user(&format!("{}@email.local", rng.gen_range(10..10_000_000_000u64)))?;

        let seed = [
            ("item", Some(u1), true),
            ("item", Some(u1), false),
            ("item", Some(u1), false),
            ("item", Some(u2), true),
            ("item", Some(u2), true),
            ("item", Some(u2), true),
            ("item", None, true),
            ("item", None, true),
            ("other item", Some(u2), false),
        ];
        for (prefix, owner, public) in seed {
            let title = format!("{prefix} {}", rng.gen_range(10..10_000_000_000u64));
            data.add_item(&title, "", owner, public)?;
        }

        info!(users = data.users.len(), items = data.items.len(), "Demo data generated");
        Ok(data)
    }

    pub fn add_user(&self, email: &str) -> Result<i64> {
        let initial = rand::thread_rng().gen_range(0..100);
        let fields = row(json!({
            "email": email,
            "is_active": true,
            "item_count": 0,
            "created_at": Utc::now().to_rfc3339(),
            "initial_topic_value": initial,
        }));
        // the topic embeds the id, so it is filled in before the row is visible
        let id = self.users.insert_with(fields, |id, user| {
            let topic = format!("{}user-{id}", self.topic_prefix);
            user.insert("topic_value".to_string(), Value::String(topic));
        })?;
        id.as_i64().ok_or_else(|| anyhow!("non-integer user id {id}"))
    }

    pub fn add_item(
        &self,
        title: &str,
        description: &str,
        owner: Option<i64>,
        public: bool,
    ) -> Result<Value> {
        let owner_email = match owner {
            Some(owner) => {
                let mut email = None;
                let found = self.users.modify(&owner.to_string(), |user| {
                    let count = user.get("item_count").and_then(Value::as_i64).unwrap_or(0);
                    user.insert("item_count".to_string(), Value::from(count + 1));
                    email = user.get("email").cloned();
                });
                if !found {
                    bail!("unknown owner {owner}");
                }
                email.unwrap_or(Value::Null)
            }
            None => Value::Null,
        };
        let id = self.items.insert(row(json!({
            "title": title,
            "description": description,
            "owner_id": owner,
            "owner_email": owner_email,
            "public": public,
        })))?;
        Ok(id)
    }
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// Complete demo configuration.
pub fn admin_config(data: &DemoData) -> AdminConfig {
    AdminConfig::new("Simple Admin Table example")
        .with_version("dev")
        .with_dashboard(|user: &User| {
            Ok(format!(
                "# Dashboard\n\nWelcome {} to Simple Example of AdminTable\n\n\
                 Checkout input form at [test_form](./#forms/test_form?field1=prefilled%20value)\n\n",
                user.email
            ))
        })
        .resource(users_resource(data))
        .resource(items_resource(data))
        .resource(public_items_resource(data))
        .page(
            Page::new(
                "Custom HTML page",
                TextSource::generated(|_| {
                    "<h1>Dashboard</h1><p>Welcome to the custom html page</p>".to_string()
                }),
            )
            .with_navigation("Custom Pages")
            .html(),
        )
        .page(
            Page::new(
                "Custom Markdown page",
                "# Dashboard\n\nWelcome to the markdown page",
            )
            .with_navigation("Custom Pages")
            .public(),
        )
        .page(
            Page::new(
                "Iframe page",
                r#"<iframe src="https://www.rust-lang.org" style="width: 100%; height: 100%; border: none;"></iframe>"#,
            )
            .with_navigation("Custom Pages")
            .html(),
        )
        .navigation_icon("Users", "user")
        .navigation_icon("Custom Pages", "book")
        .input_form(
            InputForm::new(
                "test_form",
                "Public form",
                FormSchema::new("Public form")
                    .field(ParamSpec::str("field1").with_description("String Field"))
                    .field(ParamSpec::int("integer_value").with_description("Integer Field"))
                    .field(ParamSpec::str("hidden_field").optional()),
                FormCallback::new(|data: Map<String, Value>| {
                    async move {
                        info!(form = "test_form", data = %serde_json::Value::Object(data), "Public form called");
                        Ok(CallbackReturn::None)
                    }
                    .boxed()
                }),
            )
            .with_description(TextSource::generated(|_| {
                "> Form description in markdown format".to_string()
            }))
            .public(),
        )
        .input_form(
            InputForm::new(
                "test_form_private",
                "Private form",
                FormSchema::new("Private form")
                    .field(ParamSpec::str("field1").with_description("String Field")),
                FormCallback::new(|data: Map<String, Value>| {
                    async move {
                        Ok(CallbackReturn::Message(format!(
                            "Successfully submitted form with data: {}",
                            Value::Object(data)
                        )))
                    }
                    .boxed()
                }),
            )
            .with_description("This form should be visible only to logged-in users"),
        )
}

fn items_link() -> LinkTable {
    LinkTable {
        reference: "item_count".to_string(),
        resource: ITEMS.to_string(),
        filter_col: "owner_id".to_string(),
        filter_op: FilterOp::Eq,
        filter_ref: "id".to_string(),
    }
}

fn json_field() -> FieldSpec {
    FieldSpec::computed("[[json]]JSON Field", |_| {
        Ok(json!(r#"{"key": "value", "key2": "value2", "sub": {"key": "value"}}"#))
    })
    .described("This field will show formated JSON data")
}

fn users_resource(data: &DemoData) -> Resource {
    let list = ListView::new(vec![
        "email".into(),
        ("Active", "Active Filed description information", "is_active").into(),
        ("Items", "item_count").into(),
        ("Items Link", items_link()).into(),
        json_field(),
    ])
    .with_description("List of all users")
    .with_default_sort("email", SortDirection::Desc);

    let detail = DetailView::new(vec![
        "email".into(),
        ("Active", "is_active").into(),
        ("Items", "item_count").into(),
        ("Items Link", items_link()).into(),
        ("Created At", "created_at").into(),
        FieldSpec::computed("Custom Field", |entry| {
            let email = entry.get("email").map(render_value).unwrap_or_default();
            let line = format!("Custom field with email: {email}").repeat(10);
            Ok(json!(format!("{line}\n").repeat(20)))
        })
        .described("This field has been computed"),
        FieldSpec::computed("[[html]]HTML Field", |_| {
            let items: String = (0..10).map(|x| format!("<li> Item {x}</li>\n")).collect();
            Ok(json!(format!("<h2>Title</h2><ul>{items}</ul>")))
        })
        .described("This filed will open popup with rendered html content"),
        FieldSpec::computed("[[markdown]]Markdown Field", |_| {
            let items: Vec<String> = (0..10).map(|x| format!(" - Item: {x}")).collect();
            Ok(json!(format!("## Custom Markdown Field\n\n{}", items.join("\n"))))
        })
        .described("This filed will open popup with rendered html content"),
        json_field(),
        FieldSpec::computed("[[json]]Another JSON Field", |_| {
            Ok(json!({"key": "value", "key2": "value2", "sub": {"key": "value"}}))
        })
        .described("This field will show formated JSON data"),
        (
            "Live Value",
            "This field is automatically updated using the live data hub",
            LiveValue {
                topic_ref: "topic_value".to_string(),
                initial_ref: Some("initial_topic_value".to_string()),
                history: true,
            },
        )
            .into(),
        FieldSpec::computed("Custom link", |entry| {
            let id = entry.get("id").cloned().unwrap_or(Value::Null);
            Ok(json!({
                "type": "link",
                "kind": "table",
                "resource": ITEMS,
                "value": "Custom link to my items",
                "filter": {"col": "owner_id", "op": "eq", "val": id},
            }))
        }),
    ])
    .with_title(r#"Details of user "${email}""#)
    .with_description(TextSource::generated(|entry| {
        let email = entry
            .and_then(|e| e.get("email"))
            .map(render_value)
            .unwrap_or_default();
        format!("Details of user {email}")
    }))
    .with_action(custom_user_action())
    .with_action(another_action())
    .with_action(
        ActionSpec::new("hello", |_, _| async { Err(anyhow!("World")) }.boxed())
            .with_description("Always fails")
            .with_param(ParamSpec::bool("b1"))
            .with_param(ParamSpec::bool("b2"))
            .with_param(ParamSpec::str("string1"))
            .with_param(ParamSpec::str("string2"))
            .with_param(ParamSpec::str("string3")),
    )
    .with_action(create_item(data.clone()))
    .with_table(SubTable::new(ITEMS, ITEMS, "owner_id", FilterOp::Eq, "id"))
    .with_graph(
        GraphSpec::new("random_graph_data", |_, range| {
            let chart = random_graph(range);
            async move { chart }.boxed()
        })
        .with_description("Random values over the selected days"),
    );

    let store = data.clone();
    let create = CreateView::new(
        FormSchema::new("CreateUser")
            .field(ParamSpec::str("email").with_description("user email"))
            .field(ParamSpec::str("username")),
        FormCallback::new(move |form: Map<String, Value>| {
            let store = store.clone();
            async move {
                let email = form.get("email").map(render_value).unwrap_or_default();
                if email.trim().is_empty() {
                    bail!("email must not be empty");
                }
                let id = store.add_user(&email)?;
                Ok(CallbackReturn::Value(json!({ "id": id })))
            }
            .boxed()
        }),
    );

    Resource::new(USERS, data.users.clone())
        .with_display("All Users")
        .with_navigation("Users")
        .with_list(list)
        .with_detail(detail)
        .with_create(create)
}

fn custom_user_action() -> ActionSpec {
    ActionSpec::new("custom_user_action", |entry: Row, params| {
        async move {
            let email = entry.get("email").map(render_value).unwrap_or_default();
            let string_param = params.get("string_param").map(render_value).unwrap_or_default();
            let int_param = params.get("int_param").map(render_value).unwrap_or_default();
            let bool_param = params.get("bool_param").map(render_value).unwrap_or_default();
            Ok(CallbackReturn::Message(format!(
                "performed action on {email} with params: {string_param}, {int_param}, {bool_param}"
            )))
        }
        .boxed()
    })
    .with_description(
        "Performs various actions on the user :wink:\n\
         Try to pass \"hello\" into the `string_param` and see what happens",
    )
    .with_param(ParamSpec::str("string_param").with_description("first param of the method"))
    .with_param(ParamSpec::int("int_param"))
    .with_param(ParamSpec::bool("bool_param"))
}

fn another_action() -> ActionSpec {
    ActionSpec::new("another_action", |entry: Row, _| {
        async move {
            let id = entry.get("id").map(render_value).unwrap_or_default();
            Ok(CallbackReturn::redirect_list(
                ITEMS,
                vec![AppliedFilter::new("owner_id", FilterOp::Eq, id)],
            ))
        }
        .boxed()
    })
    .with_description("Shows the items of this user")
    .with_param(ParamSpec::bool("bool_param"))
}

fn create_item(data: DemoData) -> ActionSpec {
    ActionSpec::new("create_item", move |entry: Row, params| {
        let data = data.clone();
        async move {
            let owner = entry
                .get("id")
                .and_then(Value::as_i64)
                .ok_or_else(|| anyhow!("entry has no integer id"))?;
            let title = params.get("title").map(render_value).unwrap_or_default();
            let description = params.get("description").map(render_value).unwrap_or_default();
            let public = params.get("public").and_then(Value::as_bool).unwrap_or(false);
            let id = data.add_item(&title, &description, Some(owner), public)?;
            Ok(CallbackReturn::refresh().with_message(format!("Created item {id}")))
        }
        .boxed()
    })
    .with_description("Creates new item")
    .with_param(ParamSpec::str("title"))
    .with_param(ParamSpec::str("description"))
    .with_param(ParamSpec::bool("public").optional())
}

/// Two series over the days of `range`, defaulting to the last ten days.
fn random_graph(range: GraphRange) -> Result<GraphData> {
    let GraphRange::Date { from, to } = range else {
        bail!("random_graph_data is plotted over dates");
    };
    let now = Utc::now();
    let from = from.unwrap_or(now - Duration::days(10));
    let to = to.unwrap_or(now);
    let (from, to) = if from <= to { (from, to) } else { (to, from) };
    let days = (to - from).num_days();
    Ok(activity_chart(from, days).into_graph())
}

fn activity_chart(start: DateTime<Utc>, days: i64) -> LineChart {
    let mut rng = rand::thread_rng();
    let data = (0..days)
        .map(|x| {
            row(json!({
                "date": (start + Duration::days(x)).to_rfc3339(),
                "Blue param": 150 - x * 10,
                "Red something": 50 + x * 2 + rng.gen_range(-10..=15) * 10,
            }))
        })
        .collect();
    LineChart::new(
        data,
        vec![
            row(json!({"name": "Blue param", "color": "indigo.6"})),
            row(json!({"name": "Red something", "color": "red.6"})),
        ],
        "date",
    )
}

fn items_fields() -> Vec<FieldSpec> {
    vec![
        "id".into(),
        "title".into(),
        ("Is Public", "public").into(),
        ("Description", "description").into(),
        (
            "Owner",
            LinkDetail {
                reference: "owner_email".to_string(),
                resource: USERS.to_string(),
                id_ref: "owner_id".to_string(),
            },
        )
            .into(),
    ]
}

fn items_resource(data: &DemoData) -> Resource {
    Resource::new(ITEMS, data.items.clone())
        .with_navigation("Users")
        .hidden()
        .with_list(ListView::new(items_fields()))
}

fn public_items_resource(data: &DemoData) -> Resource {
    let description = TextSource::generated(|_| {
        let chart = activity_chart(Utc::now(), 100).into_graph();
        let chart = serde_json::to_string(&chart).unwrap_or_default();
        format!("## Some really cool graph\n```chart\n{chart}\n```\n")
    });
    Resource::new(PUBLIC_ITEMS, data.items.clone())
        .with_navigation("Users")
        .with_list(
            ListView::new(items_fields())
                .with_description(description)
                .with_hidden_filter(AppliedFilter::new("public", FilterOp::Eq, "true")),
        )
}
