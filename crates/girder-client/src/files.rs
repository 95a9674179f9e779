//! REST clients for the file-store collaborator and the startup
//! model/tool catalogs.

use reqwest::{Client, Response};
use serde_json::json;
use thiserror::Error;

use girder_wire::{ErrorBody, ItemKind, ModelCatalog, ToolCatalog, WorkspaceItem, WorkspaceListing};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The file-store answered with a structured `{error}` body; the
    /// message is relayed verbatim to the panel that made the call.
    #[error("{0}")]
    Api(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Directories first, then case-sensitive name order — the listing order
/// the original client rendered.
pub fn sort_items(items: &mut [WorkspaceItem]) {
    items.sort_by(|a, b| {
        let rank = |item: &WorkspaceItem| match item.kind {
            ItemKind::Directory => 0,
            ItemKind::File => 1,
        };
        rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name))
    });
}

async fn into_api_result(response: Response) -> Result<Response, WorkspaceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("request failed ({status})"));
    Err(WorkspaceError::Api(message))
}

/// Client for the workspace browser endpoints. The task id doubles as
/// the root workspace path.
#[derive(Clone)]
pub struct WorkspaceApi {
    client: Client,
    base_url: String,
}

impl WorkspaceApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn list_items(&self, path: &str) -> Result<Vec<WorkspaceItem>, WorkspaceError> {
        let response = self
            .client
            .get(format!("{}/api/workspace/items", self.base_url))
            .query(&[("path", path)])
            .send()
            .await?;
        let response = into_api_result(response).await?;
        let mut items = response.json::<WorkspaceListing>().await?.items;
        sort_items(&mut items);
        Ok(items)
    }

    pub async fn delete_item(&self, path: &str) -> Result<(), WorkspaceError> {
        let response = self
            .client
            .delete(format!("{}/api/workspace/items", self.base_url))
            .query(&[("path", path)])
            .send()
            .await?;
        into_api_result(response).await?;
        Ok(())
    }

    pub async fn create_folder(&self, path: &str) -> Result<(), WorkspaceError> {
        let response = self
            .client
            .post(format!("{}/api/workspace/folders", self.base_url))
            .json(&json!({ "path": path }))
            .send()
            .await?;
        into_api_result(response).await?;
        Ok(())
    }

    pub async fn rename_item(&self, old_path: &str, new_path: &str) -> Result<(), WorkspaceError> {
        let response = self
            .client
            .put(format!("{}/api/workspace/items", self.base_url))
            .json(&json!({ "old_path": old_path, "new_path": new_path }))
            .send()
            .await?;
        into_api_result(response).await?;
        Ok(())
    }

    pub async fn upload(
        &self,
        workspace_path: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), WorkspaceError> {
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string()),
            )
            .text("workspace_id", workspace_path.to_string());
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;
        into_api_result(response).await?;
        Ok(())
    }

    /// Raw-bytes preview URL for images and other binary assets.
    pub fn raw_url(&self, path: &str, filename: &str) -> String {
        format!(
            "{}/api/workspace/raw?path={}/{}",
            self.base_url, path, filename
        )
    }
}

/// Startup-time configuration endpoints. Consumed once; failures are the
/// caller's to log, not fatal.
#[derive(Clone)]
pub struct ConfigApi {
    client: Client,
    base_url: String,
}

impl ConfigApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn models(&self) -> Result<ModelCatalog, WorkspaceError> {
        let response = self
            .client
            .get(format!("{}/api/models", self.base_url))
            .send()
            .await?;
        let response = into_api_result(response).await?;
        Ok(response.json().await?)
    }

    pub async fn tools(&self) -> Result<ToolCatalog, WorkspaceError> {
        let response = self
            .client
            .get(format!("{}/api/tools", self.base_url))
            .send()
            .await?;
        let response = into_api_result(response).await?;
        Ok(response.json().await?)
    }
}
