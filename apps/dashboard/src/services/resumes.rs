use futures_util::future::join_all;
use uuid::Uuid;

use crate::api_client::ApiClient;
use crate::errors::ApiError;
use crate::models::{ResumeDraft, ResumeRecord};

/// CRUD over resume records.
#[derive(Clone)]
pub struct ResumeService {
    api: ApiClient,
}

impl ResumeService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<ResumeRecord>, ApiError> {
        self.api.get_json("/resumes").await
    }

    pub async fn get(&self, id: Uuid) -> Result<ResumeRecord, ApiError> {
        self.api.get_json(&format!("/resumes/{id}")).await
    }

    /// Fetches several records concurrently. Each result is independent.
    pub async fn get_many(&self, ids: &[Uuid]) -> Vec<Result<ResumeRecord, ApiError>> {
        join_all(ids.iter().map(|id| self.get(*id))).await
    }

    pub async fn create(&self, draft: &ResumeDraft) -> Result<ResumeRecord, ApiError> {
        self.api.post_json("/resumes", draft).await
    }

    pub async fn update(&self, id: Uuid, draft: &ResumeDraft) -> Result<ResumeRecord, ApiError> {
        self.api.put_json(&format!("/resumes/{id}"), draft).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.api.delete(&format!("/resumes/{id}")).await
    }
}
