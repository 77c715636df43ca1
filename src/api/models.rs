use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One result row, keyed by column name exactly as the service returns it.
pub type Row = serde_json::Map<String, Value>;

// Authentication models
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in_minutes: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// Statement execution models
#[derive(Debug, Serialize)]
pub struct ExecuteRequest {
    pub query: String,
}

/// What `/execute` returned: a result set for SELECT-like statements, or a
/// mutation acknowledgement for everything else.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StatementOutcome {
    ResultSet {
        columns: Vec<String>,
        rows: Vec<Row>,
    },
    Mutation {
        message: String,
        rows_affected: i64,
    },
}

#[derive(Debug, Deserialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
}

/// Column metadata as returned by `/table/{name}`. Servers differ on which
/// key carries the column label, so all three known spellings are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDescriptor {
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
}

impl ColumnDescriptor {
    /// Resolves the display label: first present of `column_name`, `name`,
    /// `column`. Returns `None` when the descriptor carries none of them.
    pub fn label(&self) -> Option<&str> {
        self.column_name
            .as_deref()
            .or(self.name.as_deref())
            .or(self.column.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TablePreviewResponse {
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub sample: Vec<Row>,
}

/// Structured failure body: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
