//! Tool declarations and handlers
//!
//! Every tool is declared once in [`tool_definitions`] with a JSON-schema
//! input contract and implemented by a named handler in [`HANDLERS`].
//! [`ToolRegistry::new`] compiles the schemas and refuses to start when a
//! declaration and the handler table disagree.

use anyhow::{anyhow, bail};
use futures::future::BoxFuture;
use futures::FutureExt;
use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

use super::resources::category_counts;
use super::{require_user, Gateway};
use crate::analytics::LearningTab;
use crate::catalog::{content_types, UserContext};
use crate::error::{CatalogError, Result};
use crate::progress::ProgressUpdate;
use crate::search::SearchFilters;
use crate::viewtype::ActionResult;

/// Tool definition with its input schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Tool envelope; `success: false` is a business outcome, not an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    pub fn ok(message: impl Into<String>, data: impl Serialize) -> Result<Self> {
        Ok(Self {
            success: true,
            message: message.into(),
            data: Some(serde_json::to_value(data)?),
        })
    }

    fn from_action(action: ActionResult, data: Option<Value>) -> Self {
        Self {
            data: if action.success { data } else { None },
            success: action.success,
            message: action.message,
        }
    }
}

fn item_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "itemId": {
                "type": "string",
                "minLength": 1,
                "description": description
            }
        },
        "required": ["itemId"]
    })
}

fn no_arguments() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn tool(name: &str, description: &str, parameters: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

/// Declared tools, in listing order
pub fn tool_definitions() -> Vec<Tool> {
    vec![
        tool(
            "search_catalog",
            "Search published catalog items. Every supplied filter must match. \
                Results are sorted and paginated; `hasMore` tells whether another page exists.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Text matched against title, description, tags and author" },
                    "category": { "type": "string" },
                    "contentTypeId": { "type": "integer", "minimum": 0 },
                    "contentType": { "type": "string", "description": "Content-type label, e.g. \"Video and Audio\"" },
                    "difficulty": { "type": "string", "enum": ["beginner", "intermediate", "advanced"] },
                    "author": { "type": "string" },
                    "tags": { "type": "array", "items": { "type": "string" } },
                    "viewType": { "type": "integer", "enum": [1, 2, 3] },
                    "sortBy": {
                        "type": "string",
                        "description": "title, rating, enrollment, createdAt, duration or viewType (default createdAt)"
                    },
                    "sortOrder": { "type": "string", "enum": ["asc", "desc"] },
                    "limit": { "type": "integer", "minimum": 0 },
                    "offset": { "type": "integer", "minimum": 0 }
                }
            }),
        ),
        tool("get_catalog_item", "Get one catalog item by id.", item_id_schema("Catalog item id")),
        tool(
            "add_to_my_learning",
            "Add an Add-to-My-Learning item (ViewType 2) to My Learning.",
            item_id_schema("Catalog item id"),
        ),
        tool(
            "add_to_cart",
            "Add an Add-to-Cart item (ViewType 3) with a valid price to the cart.",
            item_id_schema("Catalog item id"),
        ),
        tool(
            "get_direct_view_url",
            "Get the viewer link of a Direct View item (ViewType 1).",
            item_id_schema("Catalog item id"),
        ),
        tool("get_my_learning", "List catalog items currently in My Learning.", no_arguments()),
        tool("get_cart_items", "List catalog items currently in the cart.", no_arguments()),
        tool(
            "remove_from_my_learning",
            "Remove an item from My Learning.",
            item_id_schema("Catalog item id"),
        ),
        tool("remove_from_cart", "Remove an item from the cart.", item_id_schema("Catalog item id")),
        tool(
            "get_catalog_categories",
            "List categories of published items with item counts.",
            no_arguments(),
        ),
        tool("get_content_types", "List the content-type registry.", no_arguments()),
        tool(
            "get_viewtype_stats",
            "ViewType distribution plus a consistency report of the catalog.",
            no_arguments(),
        ),
        tool(
            "get_my_learning_detailed",
            "The caller's learning items with derived tabs and statistics. Requires a user context.",
            json!({
                "type": "object",
                "properties": {
                    "tab": {
                        "type": "string",
                        "enum": ["not-started", "in-progress", "registered", "completed", "pending-review", "due-dates"]
                    }
                }
            }),
        ),
        tool(
            "start_learning",
            "Start an item for the caller and return its launch URL. Requires a user context.",
            item_id_schema("Catalog item id"),
        ),
        tool(
            "continue_learning",
            "Resume a started item. Requires a user context.",
            item_id_schema("Catalog item id"),
        ),
        tool(
            "update_learning_progress",
            "Report progress on an item. Requires a user context.",
            json!({
                "type": "object",
                "properties": {
                    "itemId": { "type": "string", "minLength": 1 },
                    "progress": { "type": "integer", "minimum": 0, "maximum": 100 },
                    "status": {
                        "type": "string",
                        "enum": [
                            "not attempted", "incomplete", "registered", "completed", "grade",
                            "attended", "notattended", "passed", "failed"
                        ]
                    },
                    "timeSpent": { "type": "integer", "minimum": 0, "description": "Minutes spent in this session" },
                    "score": { "type": "number", "minimum": 0 }
                },
                "required": ["itemId", "progress"]
            }),
        ),
        tool(
            "get_learning_url",
            "Launch URL of an item for the caller. Requires a user context.",
            item_id_schema("Catalog item id"),
        ),
        tool(
            "get_learning_analytics",
            "Overview, weekly progress, breakdowns, completion trend and recommendations. \
                Requires a user context.",
            no_arguments(),
        ),
        tool(
            "get_learning_due_dates",
            "The caller's due-dated items grouped by urgency. Requires a user context.",
            no_arguments(),
        ),
        tool(
            "get_learning_calendar",
            "Items due in a month, grouped by day. Defaults to the current month. \
                Requires a user context.",
            json!({
                "type": "object",
                "properties": {
                    "month": { "type": "integer", "minimum": 1, "maximum": 12 },
                    "year": { "type": "integer", "minimum": 1970, "maximum": 9999 }
                }
            }),
        ),
    ]
}

/// Tool handler; arguments arrive already validated against the schema
pub type Handler = for<'a> fn(&'a Gateway, Value, Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemArgs {
    item_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressArgs {
    item_id: String,
    #[serde(flatten)]
    update: ProgressUpdate,
}

#[derive(Debug, Default, Deserialize)]
struct TabArgs {
    tab: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CalendarArgs {
    month: Option<u32>,
    year: Option<i32>,
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| CatalogError::InvalidArguments(e.to_string()))
}

fn search_catalog<'a>(gw: &'a Gateway, args: Value, user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let filters: SearchFilters = parse_args(args)?;
        let results = gw.catalog().search(&filters, user)?;
        ToolResult::ok(
            format!("Found {} items (showing {})", results.total, results.items.len()),
            results,
        )
    }
    .boxed()
}

fn get_catalog_item<'a>(gw: &'a Gateway, args: Value, _user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let ItemArgs { item_id } = parse_args(args)?;
        let item = gw.catalog().get_item(&item_id)?;
        ToolResult::ok(item.title.clone(), item)
    }
    .boxed()
}

fn add_to_my_learning<'a>(gw: &'a Gateway, args: Value, _user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let ItemArgs { item_id } = parse_args(args)?;
        let action = gw.catalog().add_to_my_learning(&item_id)?;
        Ok(ToolResult::from_action(action, Some(json!({ "itemId": item_id }))))
    }
    .boxed()
}

fn add_to_cart<'a>(gw: &'a Gateway, args: Value, _user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let ItemArgs { item_id } = parse_args(args)?;
        let action = gw.catalog().add_to_cart(&item_id)?;
        Ok(ToolResult::from_action(action, Some(json!({ "itemId": item_id }))))
    }
    .boxed()
}

fn get_direct_view_url<'a>(gw: &'a Gateway, args: Value, _user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let ItemArgs { item_id } = parse_args(args)?;
        let link = gw.catalog().get_direct_view_url(&item_id)?;
        ToolResult::ok(link.url.clone(), link)
    }
    .boxed()
}

fn get_my_learning<'a>(gw: &'a Gateway, _args: Value, _user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let items = gw.catalog().my_learning_items()?;
        ToolResult::ok(format!("{} items in My Learning", items.len()), items)
    }
    .boxed()
}

fn get_cart_items<'a>(gw: &'a Gateway, _args: Value, _user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let items = gw.catalog().cart_items()?;
        ToolResult::ok(format!("{} items in cart", items.len()), items)
    }
    .boxed()
}

fn remove_from_my_learning<'a>(gw: &'a Gateway, args: Value, _user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let ItemArgs { item_id } = parse_args(args)?;
        let action = gw.catalog().remove_from_my_learning(&item_id)?;
        Ok(ToolResult::from_action(action, Some(json!({ "itemId": item_id }))))
    }
    .boxed()
}

fn remove_from_cart<'a>(gw: &'a Gateway, args: Value, _user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let ItemArgs { item_id } = parse_args(args)?;
        let action = gw.catalog().remove_from_cart(&item_id)?;
        Ok(ToolResult::from_action(action, Some(json!({ "itemId": item_id }))))
    }
    .boxed()
}

fn get_catalog_categories<'a>(gw: &'a Gateway, _args: Value, _user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let categories = category_counts(gw.catalog())?;
        ToolResult::ok(format!("{} categories", categories.len()), categories)
    }
    .boxed()
}

fn get_content_types<'a>(_gw: &'a Gateway, _args: Value, _user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let types = content_types::all();
        ToolResult::ok(format!("{} content types", types.len()), types)
    }
    .boxed()
}

fn get_viewtype_stats<'a>(gw: &'a Gateway, _args: Value, _user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let stats = gw.catalog().view_type_stats()?;
        let validation = gw.catalog().validation_report()?;
        ToolResult::ok(
            format!("{} items, {} consistency issues", stats.total, validation.issues.len()),
            json!({ "stats": stats, "validation": validation }),
        )
    }
    .boxed()
}

fn get_my_learning_detailed<'a>(gw: &'a Gateway, args: Value, user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let user = require_user(user, "get_my_learning_detailed")?;
        let TabArgs { tab } = parse_args(args)?;
        let tab = match tab {
            Some(name) => Some(
                LearningTab::parse(&name)
                    .ok_or_else(|| CatalogError::InvalidArguments(format!("unknown tab: {}", name)))?,
            ),
            None => None,
        };
        let detailed = gw.analytics().my_learning_detailed(user, tab).await?;
        ToolResult::ok(format!("{} learning items", detailed.items.len()), detailed)
    }
    .boxed()
}

fn start_learning<'a>(gw: &'a Gateway, args: Value, user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let user = require_user(user, "start_learning")?;
        let ItemArgs { item_id } = parse_args(args)?;
        let launch = gw.analytics().tracker().start_learning(user, &item_id).await?;
        ToolResult::ok("Learning started", launch)
    }
    .boxed()
}

fn continue_learning<'a>(gw: &'a Gateway, args: Value, user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let user = require_user(user, "continue_learning")?;
        let ItemArgs { item_id } = parse_args(args)?;
        let launch = gw.analytics().tracker().continue_learning(user, &item_id).await?;
        ToolResult::ok("Learning resumed", launch)
    }
    .boxed()
}

fn update_learning_progress<'a>(gw: &'a Gateway, args: Value, user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let user = require_user(user, "update_learning_progress")?;
        let ProgressArgs { item_id, update } = parse_args(args)?;
        let item = gw
            .analytics()
            .tracker()
            .update_learning_progress(user, &item_id, &update)
            .await?;
        ToolResult::ok(
            format!("Progress {}% ({})", item.progress, item.learning_status.as_str()),
            item,
        )
    }
    .boxed()
}

fn get_learning_url<'a>(gw: &'a Gateway, args: Value, user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let user = require_user(user, "get_learning_url")?;
        let ItemArgs { item_id } = parse_args(args)?;
        let url = gw.analytics().tracker().get_learning_url(user, &item_id).await?;
        ToolResult::ok(url.clone(), json!({ "itemId": item_id, "url": url }))
    }
    .boxed()
}

fn get_learning_analytics<'a>(gw: &'a Gateway, _args: Value, user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let user = require_user(user, "get_learning_analytics")?;
        let report = gw.analytics().get_learning_analytics(user).await?;
        ToolResult::ok(
            format!("{} learning items analysed", report.overview.total),
            report,
        )
    }
    .boxed()
}

fn get_learning_due_dates<'a>(gw: &'a Gateway, _args: Value, user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let user = require_user(user, "get_learning_due_dates")?;
        let buckets = gw.analytics().get_learning_due_dates(user).await?;
        ToolResult::ok(
            format!("{} items with due dates, {} overdue", buckets.total, buckets.overdue.len()),
            buckets,
        )
    }
    .boxed()
}

fn get_learning_calendar<'a>(gw: &'a Gateway, args: Value, user: Option<&'a UserContext>) -> BoxFuture<'a, Result<ToolResult>> {
    async move {
        let user = require_user(user, "get_learning_calendar")?;
        let CalendarArgs { month, year } = parse_args(args)?;
        let calendar = gw.analytics().get_learning_calendar(month, year, user).await?;
        ToolResult::ok(
            format!("{} items due in {}/{}", calendar.total, calendar.month, calendar.year),
            calendar,
        )
    }
    .boxed()
}

/// Handler for every declared tool
pub const HANDLERS: &[(&str, Handler)] = &[
    ("search_catalog", search_catalog),
    ("get_catalog_item", get_catalog_item),
    ("add_to_my_learning", add_to_my_learning),
    ("add_to_cart", add_to_cart),
    ("get_direct_view_url", get_direct_view_url),
    ("get_my_learning", get_my_learning),
    ("get_cart_items", get_cart_items),
    ("remove_from_my_learning", remove_from_my_learning),
    ("remove_from_cart", remove_from_cart),
    ("get_catalog_categories", get_catalog_categories),
    ("get_content_types", get_content_types),
    ("get_viewtype_stats", get_viewtype_stats),
    ("get_my_learning_detailed", get_my_learning_detailed),
    ("start_learning", start_learning),
    ("continue_learning", continue_learning),
    ("update_learning_progress", update_learning_progress),
    ("get_learning_url", get_learning_url),
    ("get_learning_analytics", get_learning_analytics),
    ("get_learning_due_dates", get_learning_due_dates),
    ("get_learning_calendar", get_learning_calendar),
];

struct RegisteredTool {
    schema: JSONSchema,
    handler: Handler,
}

/// Declared tools with compiled schemas and bound handlers
pub struct ToolRegistry {
    definitions: Vec<Tool>,
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> anyhow::Result<Self> {
        Self::build(tool_definitions(), HANDLERS)
    }

    /// Bind `definitions` to `handlers`; both sides must name the same tools
    pub fn build(definitions: Vec<Tool>, handlers: &[(&str, Handler)]) -> anyhow::Result<Self> {
        let bound: HashMap<&str, Handler> = handlers.iter().copied().collect();
        let mut tools = HashMap::new();

        for definition in &definitions {
            let handler = *bound
                .get(definition.name.as_str())
                .ok_or_else(|| anyhow!("Tool {} is declared but has no handler", definition.name))?;
            let schema = JSONSchema::compile(&definition.parameters)
                .map_err(|e| anyhow!("Invalid schema for tool {}: {}", definition.name, e))?;
            if tools
                .insert(definition.name.clone(), RegisteredTool { schema, handler })
                .is_some()
            {
                bail!("Tool {} is declared twice", definition.name);
            }
        }
        if let Some((name, _)) = handlers.iter().find(|(name, _)| !tools.contains_key(*name)) {
            bail!("Handler {} has no tool declaration", name);
        }

        Ok(Self { definitions, tools })
    }

    pub fn definitions(&self) -> &[Tool] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Validate `args` against the tool's schema and return its handler
    pub fn prepare(&self, name: &str, args: &Value) -> Result<Handler> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| CatalogError::UnknownTool(name.to_string()))?;
        if let Err(errors) = tool.schema.validate(args) {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(CatalogError::InvalidArguments(format!(
                "{}: {}",
                name,
                messages.join("; ")
            )));
        }
        Ok(tool.handler)
    }
}
