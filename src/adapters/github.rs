//! Live project source backed by the GitHub GraphQL API (ProjectV2).

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::ports::{
    BoardRef, Comment, Field, FieldOption, ItemContent, ItemEdge, ProjectSource, SourceError,
};
use crate::snapshot::ItemState;

const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";
const USER_AGENT: &str = concat!("boardwatch/", env!("CARGO_PKG_VERSION"));

/// GitHub GraphQL project source.
///
/// The pivot-field name is fixed at construction so item queries can ask
/// the provider for exactly that field's value.
pub struct GithubSource {
    client: Client,
    token: String,
    pivot_field: String,
}

impl GithubSource {
    /// Creates a source using the given API token and pivot-field name.
    #[must_use]
    pub fn new(token: &str, pivot_field: &str) -> Self {
        Self {
            client: Client::new(),
            token: token.to_string(),
            pivot_field: pivot_field.to_string(),
        }
    }

    fn execute(&self, query: &str, variables: Value) -> Result<Value, SourceError> {
        let response = self
            .client
            .post(GITHUB_GRAPHQL_URL)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&json!({ "query": query, "variables": variables }))
            .send()?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
            return Err(SourceError::RateLimited);
        }
        if !status.is_success() {
            return Err(SourceError::Api(format!("GraphQL endpoint returned {status}")));
        }

        let body: GraphQlResponse = response.json()?;
        if let Some(errors) = body.errors {
            if errors.iter().any(|e| e.error_type.as_deref() == Some("RATE_LIMITED")) {
                return Err(SourceError::RateLimited);
            }
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(SourceError::Api(messages.join("; ")));
        }
        body.data.ok_or_else(|| SourceError::Api("response carried no data".to_string()))
    }

    fn fetch_page(
        &self,
        query: &str,
        board: &BoardRef,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Vec<ItemEdge>, SourceError> {
        let data = self.execute(
            query,
            json!({
                "board": board.id,
                "cursor": cursor,
                "pageSize": page_size,
                "pivot": self.pivot_field,
            }),
        )?;
        parse_item_edges(&data)
    }
}

/// Splits a board URL into its owner login and project number.
fn parse_board_url(url: &str) -> Result<(String, u64), SourceError> {
    let bad = |reason: &str| SourceError::BadBoardUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let rest = url.strip_prefix("https://").ok_or_else(|| bad("must be an HTTPS URL"))?;
    let mut segments = rest.split('/');
    let host = segments.next().unwrap_or("");
    if host != "github.com" {
        return Err(bad("must be on github.com"));
    }
    let path: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
    if path.len() < 3 || path[path.len() - 2] != "projects" {
        return Err(bad("no project number found in URL"));
    }
    let number = path[path.len() - 1]
        .parse::<u64>()
        .map_err(|_| bad("project number is not numeric"))?;
    let owner = path[path.len() - 3].to_string();
    Ok((owner, number))
}

impl ProjectSource for GithubSource {
    fn resolve_board(&self, url: &str) -> Result<BoardRef, SourceError> {
        let (owner, number) = parse_board_url(url)?;
        let data = self.execute(
            r"query($owner: String!, $number: Int!) {
                organization(login: $owner) {
                    projectV2(number: $number) { id number title url }
                }
            }",
            json!({ "owner": owner, "number": number }),
        )?;

        let project = &data["organization"]["projectV2"];
        if project.is_null() {
            return Err(SourceError::BadBoardUrl {
                url: url.to_string(),
                reason: format!("no project {number} in organization {owner}"),
            });
        }
        let wire: WireBoard = serde_json::from_value(project.clone())
            .map_err(|e| SourceError::Api(format!("malformed project payload: {e}")))?;
        Ok(BoardRef {
            id: wire.id,
            number: wire.number,
            owner,
            title: wire.title,
            html_url: wire.url,
        })
    }

    fn fetch_fields(&self, board: &BoardRef) -> Result<Vec<Field>, SourceError> {
        let data = self.execute(
            r"query($board: ID!) {
                node(id: $board) {
                    ... on ProjectV2 {
                        fields(first: 25) {
                            nodes {
                                ... on ProjectV2FieldCommon { id name }
                                ... on ProjectV2SingleSelectField { id name options { id name } }
                            }
                        }
                    }
                }
            }",
            json!({ "board": board.id }),
        )?;
        parse_fields(&data)
    }

    fn fetch_items_page(
        &self,
        board: &BoardRef,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Vec<ItemEdge>, SourceError> {
        self.fetch_page(
            r"query($board: ID!, $cursor: String, $pageSize: Int!, $pivot: String!) {
                node(id: $board) {
                    ... on ProjectV2 {
                        items(first: $pageSize, after: $cursor) {
                            edges {
                                cursor
                                node {
                                    content {
                                        ... on Issue {
                                            id number title url bodyUrl state
                                        }
                                    }
                                    fieldValueByName(name: $pivot) {
                                        ... on ProjectV2ItemFieldSingleSelectValue { optionId }
                                    }
                                }
                            }
                        }
                    }
                }
            }",
            board,
            cursor,
            page_size,
        )
    }

    fn fetch_items_with_comments_page(
        &self,
        board: &BoardRef,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Vec<ItemEdge>, SourceError> {
        self.fetch_page(
            r"query($board: ID!, $cursor: String, $pageSize: Int!, $pivot: String!) {
                node(id: $board) {
                    ... on ProjectV2 {
                        items(first: $pageSize, after: $cursor) {
                            edges {
                                cursor
                                node {
                                    content {
                                        ... on Issue {
                                            id number title url bodyUrl state
                                            labels(first: 20) { nodes { name } }
                                            comments(first: 100) {
                                                nodes {
                                                    id body url createdAt updatedAt
                                                    author { login }
                                                }
                                            }
                                        }
                                    }
                                    fieldValueByName(name: $pivot) {
                                        ... on ProjectV2ItemFieldSingleSelectValue { optionId }
                                    }
                                }
                            }
                        }
                    }
                }
            }",
            board,
            cursor,
            page_size,
        )
    }
}

// --- Wire types ---

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[derive(Deserialize)]
struct WireBoard {
    id: String,
    number: u64,
    title: String,
    url: String,
}

#[derive(Deserialize)]
struct WireField {
    id: Option<String>,
    name: Option<String>,
    options: Option<Vec<WireOption>>,
}

#[derive(Deserialize)]
struct WireOption {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct WireEdge {
    cursor: String,
    node: WireItem,
}

#[derive(Deserialize)]
struct WireItem {
    content: Option<WireContent>,
    #[serde(rename = "fieldValueByName")]
    field_value: Option<WireFieldValue>,
}

#[derive(Deserialize)]
struct WireFieldValue {
    #[serde(rename = "optionId")]
    option_id: Option<String>,
}

#[derive(Deserialize)]
struct WireContent {
    // Draft entries come back as an empty object.
    id: Option<String>,
    number: Option<u64>,
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "bodyUrl")]
    body_url: Option<String>,
    state: Option<String>,
    labels: Option<WireLabels>,
    comments: Option<WireComments>,
}

#[derive(Deserialize)]
struct WireLabels {
    nodes: Vec<WireLabel>,
}

#[derive(Deserialize)]
struct WireLabel {
    name: String,
}

#[derive(Deserialize)]
struct WireComments {
    nodes: Vec<WireComment>,
}

#[derive(Deserialize)]
struct WireComment {
    id: String,
    body: String,
    url: String,
    #[serde(rename = "createdAt")]
    created_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "updatedAt")]
    updated_at: chrono::DateTime<chrono::Utc>,
    author: Option<WireAuthor>,
}

#[derive(Deserialize)]
struct WireAuthor {
    login: String,
}

fn parse_fields(data: &Value) -> Result<Vec<Field>, SourceError> {
    let nodes = data["node"]["fields"]["nodes"]
        .as_array()
        .ok_or_else(|| SourceError::Api("malformed fields payload".to_string()))?;
    let mut fields = Vec::new();
    for node in nodes {
        let wire: WireField = serde_json::from_value(node.clone())
            .map_err(|e| SourceError::Api(format!("malformed field payload: {e}")))?;
        let (Some(id), Some(name)) = (wire.id, wire.name) else { continue };
        let options = wire.options.map(|options| {
            options
                .into_iter()
                .map(|option| FieldOption { id: option.id, name: option.name })
                .collect()
        });
        fields.push(Field { id, name, options });
    }
    Ok(fields)
}

fn parse_item_edges(data: &Value) -> Result<Vec<ItemEdge>, SourceError> {
    let edges = data["node"]["items"]["edges"]
        .as_array()
        .ok_or_else(|| SourceError::Api("malformed items payload".to_string()))?;
    let mut result = Vec::new();
    for edge in edges {
        let wire: WireEdge = serde_json::from_value(edge.clone())
            .map_err(|e| SourceError::Api(format!("malformed item payload: {e}")))?;
        result.push(to_item_edge(wire));
    }
    Ok(result)
}

fn to_item_edge(wire: WireEdge) -> ItemEdge {
    let content = wire.node.content.and_then(|content| {
        // Drafts and inaccessible content deserialize as an empty object.
        let (Some(id), Some(number), Some(title), Some(url)) =
            (content.id, content.number, content.title, content.url)
        else {
            return None;
        };
        let state = match content.state.as_deref() {
            Some(state) if state.eq_ignore_ascii_case("closed") => ItemState::Closed,
            _ => ItemState::Open,
        };
        Some((
            ItemContent {
                id,
                number,
                html_url: content.body_url.unwrap_or_else(|| url.clone()),
                url,
                title,
                state,
            },
            content.labels,
            content.comments,
        ))
    });

    match content {
        None => ItemEdge {
            cursor: wire.cursor,
            content: None,
            pivot_option_id: None,
            labels: Vec::new(),
            comments: Vec::new(),
        },
        Some((item, labels, comments)) => ItemEdge {
            cursor: wire.cursor,
            content: Some(item),
            pivot_option_id: wire.node.field_value.and_then(|value| value.option_id),
            labels: labels.map(|l| l.nodes.into_iter().map(|n| n.name).collect()).unwrap_or_default(),
            comments: comments
                .map(|c| {
                    c.nodes
                        .into_iter()
                        .map(|node| Comment {
                            id: node.id,
                            author: node
                                .author
                                .map_or_else(|| "ghost".to_string(), |author| author.login),
                            body: node.body,
                            html_url: node.url,
                            created_at: node.created_at,
                            updated_at: node.updated_at,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        },
    }
}
