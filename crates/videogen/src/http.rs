//! HTTP Generation Provider
//!
//! `POST {base}/v1/generate` starts a job and answers `{job_id}`;
//! `GET {base}/v1/jobs/{job_id}` reports
//! `{status, output_video_uri, error_message}`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{GenerationProvider, JobHandle, JobStatus, ProviderConfig, ProviderError};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    photo_uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    job_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    status: String,
    output_video_uri: Option<String>,
    error_message: Option<String>,
}

/// Provider backed by the generation HTTP API
pub struct HttpGenerationProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpGenerationProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            return Err(ProviderError::Response(format!(
                "Generation API returned {}: {}",
                status, body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Response(format!("Invalid response body: {e}")))
    }
}

#[async_trait::async_trait]
impl GenerationProvider for HttpGenerationProvider {
    async fn submit(
        &self,
        photo_ref: &str,
        prompt: Option<&str>,
    ) -> Result<JobHandle, ProviderError> {
        let url = format!("{}/v1/generate", self.base_url);
        let body = GenerateRequest {
            photo_uri: photo_ref,
            prompt: prompt.filter(|p| !p.trim().is_empty()),
        };

        let response = self
            .authorize(self.http.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let parsed: GenerateResponse = Self::read_json(response).await?;
        let job_id = parsed
            .job_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::Response("Generation API did not return a job_id".to_string()))?;

        tracing::info!(job_id = %job_id, "Generation job submitted");
        Ok(JobHandle(job_id))
    }

    async fn poll(&self, job: &JobHandle) -> Result<JobStatus, ProviderError> {
        let url = format!("{}/v1/jobs/{}", self.base_url, job);

        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let parsed: JobResponse = Self::read_json(response).await?;

        match parsed.status.as_str() {
            "SUCCEEDED" => match parsed.output_video_uri.filter(|u| !u.is_empty()) {
                Some(asset_ref) => Ok(JobStatus::Succeeded { asset_ref }),
                None => Err(ProviderError::Response(format!(
                    "Job {} succeeded but did not provide output_video_uri",
                    job
                ))),
            },
            "FAILED" => Ok(JobStatus::Failed {
                reason: parsed
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            }),
            "PENDING" | "RUNNING" => Ok(JobStatus::Running),
            other => {
                tracing::warn!(job_id = %job, status = %other, "Unknown job status, still waiting");
                Ok(JobStatus::Running)
            }
        }
    }
}
