use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type alias for node identifiers
pub type NodeId = Uuid;

/// Type alias for connection identifiers
pub type ConnectionId = Uuid;

/// Type alias for embedding vectors
pub type Embedding = Vec<f32>;

/// Maximum title length, counted in characters.
pub const MAX_TITLE_CHARS: usize = 500;

/// A knowledge item in the graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier. UUIDv7 for time-sortability.
    pub id: NodeId,

    /// Free-form category: book, note, article, quote, idea, ...
    /// Not a closed set.
    #[serde(rename = "type")]
    pub kind: String,

    pub title: String,

    /// The text the embedding is computed from.
    pub content: String,

    /// Where this came from (URL, book, person). Optional.
    pub source: Option<String>,

    pub tags: Vec<String>,

    /// Empty when the content cleaned to an empty string.
    pub embedding: Embedding,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a node. Everything the caller controls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewNode {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A materialized similarity edge between two nodes.
///
/// Stored once per discovered pair, pointing from the node being inserted to
/// the older node. Traversable from either endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    pub similarity_score: f32,
    pub created_at: DateTime<Utc>,
}

/// A neighbor reached through a connection, with the connection's score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedNode {
    pub node: Node,
    pub similarity_score: f32,
}

/// A node together with the nodes it is connected to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeWithConnections {
    pub node: Node,
    pub connections: Vec<ConnectedNode>,
}

/// Full snapshot of the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

/// A ranked search hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub node: Node,
    pub similarity: f32,
}

impl NewNode {
    /// Create an input with no source and no tags
    pub fn new(kind: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            content: content.into(),
            source: None,
            tags: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Check the shape of the input before anything is embedded or written.
    pub fn validate(&self) -> Result<(), String> {
        if self.kind.trim().is_empty() {
            return Err("Type must not be empty".to_string());
        }

        if self.title.trim().is_empty() {
            return Err("Title must not be empty".to_string());
        }

        let title_len = self.title.chars().count();
        if title_len > MAX_TITLE_CHARS {
            return Err(format!(
                "Title exceeds {} characters ({})",
                MAX_TITLE_CHARS, title_len
            ));
        }

        if self.content.trim().is_empty() {
            return Err("Content must not be empty".to_string());
        }

        Ok(())
    }
}

impl Node {
    /// Build a node from validated input, assigning id and timestamp
    pub fn new(input: NewNode, embedding: Embedding) -> Self {
        Node {
            id: Uuid::now_v7(),
            kind: input.kind,
            title: input.title,
            content: input.content,
            source: input.source,
            tags: input.tags,
            embedding,
            created_at: Utc::now(),
        }
    }

    pub fn has_embedding(&self) -> bool {
        !self.embedding.is_empty()
    }
}

impl Connection {
    /// Create a new connection from the inserted node to an existing one
    pub fn new(from: NodeId, to: NodeId, similarity_score: f32) -> Self {
        Connection {
            id: Uuid::now_v7(),
            from_node_id: from,
            to_node_id: to,
            similarity_score,
            created_at: Utc::now(),
        }
    }

    /// Whether `id` is either endpoint
    pub fn touches(&self, id: NodeId) -> bool {
        self.from_node_id == id || self.to_node_id == id
    }

    /// The endpoint that is not `id`. Returns `None` if `id` is not an endpoint.
    pub fn opposite(&self, id: NodeId) -> Option<NodeId> {
        if self.from_node_id == id {
            Some(self.to_node_id)
        } else if self.to_node_id == id {
            Some(self.from_node_id)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.from_node_id == self.to_node_id {
            return Err("Self-connections are not allowed".to_string());
        }
        if !self.similarity_score.is_finite() {
            return Err(format!(
                "Similarity score {} is not finite",
                self.similarity_score
            ));
        }
        Ok(())
    }
}
