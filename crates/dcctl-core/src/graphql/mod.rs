//! Remote operation layer.
//!
//! Every remote call goes through a [`QueryExecutor`], which ships a named
//! GraphQL document plus JSON variables and hands back the `data` object.
//! Typed decoding happens here so executors stay transport-only.

pub mod model;
pub mod operations;
mod result;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::transport::TransportError;

pub use operations::Operation;
pub use result::ErrorPayload;

/// A single GraphQL request as sent on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest {
    pub query: &'static str,
    #[serde(rename = "operationName")]
    pub operation_name: &'static str,
    pub variables: Value,
}

impl GraphQlRequest {
    pub fn new(operation: &Operation, variables: Value) -> Self {
        Self {
            query: operation.query,
            operation_name: operation.name,
            variables,
        }
    }
}

/// Executes remote operations.
///
/// Implementations must not retry. Dropping the returned future cancels the
/// request.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run `request` and return the response's `data` object.
    async fn execute(&self, request: GraphQlRequest) -> Result<Value, TransportError>;
}

/// Run `operation` and decode its `data` object into `R`.
pub async fn execute<R: DeserializeOwned>(
    executor: &dyn QueryExecutor,
    operation: &Operation,
    variables: Value,
) -> Result<R, TransportError> {
    tracing::debug!(operation = operation.name, "executing remote operation");
    let data = executor
        .execute(GraphQlRequest::new(operation, variables))
        .await?;
    serde_json::from_value(data).map_err(|source| TransportError::Decode {
        operation: operation.name.to_string(),
        source,
    })
}
