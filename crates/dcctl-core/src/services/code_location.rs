//! Code locations, typed and as raw documents.
//!
//! The platform exposes locations only through its workspace document, so
//! every read fetches the whole document and picks entries out of it.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use super::ensure_absent;
use crate::document;
use crate::error::{Error, Result};
use crate::graphql::model::{
    AddOrUpdateLocationData, AddOrUpdateLocationFromDocumentData, AddOrUpdateLocationResult,
    DeleteLocationData, DeleteLocationResult, LocationsDocument, LocationsDocumentData,
};
use crate::graphql::{self, Operation, QueryExecutor, operations};
use crate::transport::TransportError;
use crate::types::CodeLocation;

const WHAT: &str = "CodeLocation";

pub struct CodeLocationService {
    executor: Arc<dyn QueryExecutor>,
}

impl CodeLocationService {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// Raw workspace entries, as the platform stores them.
    async fn documents(&self) -> Result<Vec<Map<String, Value>>> {
        let data: LocationsDocumentData = graphql::execute(
            &*self.executor,
            &operations::LIST_CODE_LOCATIONS,
            json!({}),
        )
        .await?;

        let workspace: LocationsDocument = match data.locations_as_document.document {
            Value::Null => LocationsDocument::default(),
            raw => decode(&operations::LIST_CODE_LOCATIONS, raw)?,
        };

        workspace
            .locations
            .into_iter()
            .map(|entry| decode(&operations::LIST_CODE_LOCATIONS, entry))
            .collect()
    }

    async fn document_for(&self, name: &str) -> Result<Map<String, Value>> {
        self.documents()
            .await?
            .into_iter()
            .find(|entry| document::identity_of(entry).is_ok_and(|id| id == name))
            .ok_or_else(|| Error::not_found(WHAT, "name", name))
    }

    pub async fn list(&self) -> Result<Vec<CodeLocation>> {
        self.documents()
            .await?
            .into_iter()
            .map(|entry| decode(&operations::LIST_CODE_LOCATIONS, Value::Object(entry)))
            .collect()
    }

    pub async fn get_by_name(&self, name: &str) -> Result<CodeLocation> {
        let entry = self.document_for(name).await?;
        decode(&operations::LIST_CODE_LOCATIONS, Value::Object(entry))
    }

    pub async fn create(&self, location: &CodeLocation) -> Result<CodeLocation> {
        location.validate()?;
        ensure_absent(
            self.get_by_name(&location.name).await,
            WHAT,
            "name",
            &location.name,
        )?;

        self.add_or_update(location).await?;
        tracing::debug!(name = %location.name, "created code location");
        self.get_by_name(&location.name).await
    }

    /// Replace an existing location. A missing one is `NotFound`.
    pub async fn update(&self, location: &CodeLocation) -> Result<CodeLocation> {
        location.validate()?;
        self.get_by_name(&location.name).await?;

        self.add_or_update(location).await?;
        tracing::debug!(name = %location.name, "updated code location");
        self.get_by_name(&location.name).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        self.document_for(name).await?;

        let data: DeleteLocationData = graphql::execute(
            &*self.executor,
            &operations::DELETE_CODE_LOCATION,
            json!({ "locationName": name }),
        )
        .await?;

        match data.delete_location {
            DeleteLocationResult::Success(_) => {
                tracing::debug!(name, "deleted code location");
                Ok(())
            }
            DeleteLocationResult::Python(e) | DeleteLocationResult::Unauthorized(e) => {
                Err(e.into_error())
            }
            DeleteLocationResult::Unrecognized(typename) => Err(Error::unexpected(
                operations::DELETE_CODE_LOCATION.name,
                typename,
            )),
        }
    }

    // -- document variants --------------------------------------------------

    /// The stored document for `name`, in canonical form.
    pub async fn get_document_by_name(&self, name: &str) -> Result<String> {
        let entry = self.document_for(name).await?;
        Ok(document::canonical(&Value::Object(entry)))
    }

    /// Create a location from a raw document, returning the stored document.
    pub async fn create_from_document(&self, doc: &str) -> Result<String> {
        let parsed = document::parse(doc)?;
        let name = document::identity_of(&parsed)?;
        ensure_absent(self.document_for(&name).await, WHAT, "name", &name)?;

        self.add_or_update_document(parsed).await?;
        tracing::debug!(name, "created code location from document");
        self.get_document_by_name(&name).await
    }

    pub async fn update_from_document(&self, doc: &str) -> Result<String> {
        let parsed = document::parse(doc)?;
        let name = document::identity_of(&parsed)?;
        self.document_for(&name).await?;

        self.add_or_update_document(parsed).await?;
        tracing::debug!(name, "updated code location from document");
        self.get_document_by_name(&name).await
    }

    pub async fn delete_from_document(&self, doc: &str) -> Result<()> {
        let name = document::extract_identity(doc)?;
        self.delete(&name).await
    }

    async fn add_or_update(&self, location: &CodeLocation) -> Result<()> {
        let data: AddOrUpdateLocationData = graphql::execute(
            &*self.executor,
            &operations::ADD_OR_UPDATE_CODE_LOCATION,
            json!({ "location": selector(location) }),
        )
        .await?;
        classify(
            &operations::ADD_OR_UPDATE_CODE_LOCATION,
            data.add_or_update_location,
        )
    }

    async fn add_or_update_document(&self, doc: Map<String, Value>) -> Result<()> {
        let data: AddOrUpdateLocationFromDocumentData = graphql::execute(
            &*self.executor,
            &operations::ADD_OR_UPDATE_CODE_LOCATION_FROM_DOCUMENT,
            json!({ "document": doc }),
        )
        .await?;
        classify(
            &operations::ADD_OR_UPDATE_CODE_LOCATION_FROM_DOCUMENT,
            data.add_or_update_location_from_document,
        )
    }
}

fn classify(operation: &Operation, result: AddOrUpdateLocationResult) -> Result<()> {
    match result {
        AddOrUpdateLocationResult::WorkspaceEntry(_) => Ok(()),
        AddOrUpdateLocationResult::InvalidLocation(e)
        | AddOrUpdateLocationResult::Python(e)
        | AddOrUpdateLocationResult::Unauthorized(e) => Err(e.into_error()),
        AddOrUpdateLocationResult::Unrecognized(typename) => {
            Err(Error::unexpected(operation.name, typename))
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(operation: &Operation, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| {
        Error::from(TransportError::Decode {
            operation: operation.name.to_string(),
            source,
        })
    })
}

/// `LocationSelector` input for the typed add-or-update mutation.
fn selector(location: &CodeLocation) -> Value {
    let location = location.normalized();
    let git = location.git.as_ref();
    json!({
        "name": location.name,
        "image": location.image,
        "moduleName": location.code_source.module_name,
        "packageName": location.code_source.package_name,
        "pythonFile": location.code_source.python_file,
        "workingDirectory": location.working_directory,
        "executablePath": location.executable_path,
        "attribute": location.attribute,
        "commitHash": git.map(|g| g.commit_hash.as_str()),
        "url": git.map(|g| g.url.as_str()),
        "agentQueue": location.agent_queue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GitRef;

    #[test]
    fn selector_uses_camel_case_and_nulls_absent_fields() {
        let location = CodeLocation {
            working_directory: Some(String::new()),
            ..CodeLocation::from_image("etl", "registry/etl:1", "etl.defs")
        };
        let vars = selector(&location);
        assert_eq!(vars["name"], "etl");
        assert_eq!(vars["image"], "registry/etl:1");
        assert_eq!(vars["moduleName"], "etl.defs");
        assert!(vars["workingDirectory"].is_null());
        assert!(vars["commitHash"].is_null());
    }

    #[test]
    fn selector_flattens_git_ref() {
        let location = CodeLocation {
            name: "etl".to_string(),
            git: Some(GitRef {
                commit_hash: "abc".to_string(),
                url: "https://github.com/acme/etl".to_string(),
            }),
            ..CodeLocation::default()
        };
        let vars = selector(&location);
        assert_eq!(vars["commitHash"], "abc");
        assert_eq!(vars["url"], "https://github.com/acme/etl");
    }
}
