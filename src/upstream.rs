use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::models::ScoreEntry;

/// Thin client over the remote score endpoint. The upstream owns the data;
/// this service only reads lists and forwards submissions.
#[derive(Clone)]
pub(crate) struct ScoreApiClient {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl ScoreApiClient {
    pub(crate) fn new(url: String, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build score API client")?;
        Ok(Self { client, url, token })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, query: &[(&str, &str)]) -> Result<T> {
        let mut request = self.client.get(&self.url).query(query);
        if let Some(token) = &self.token {
            request = request.header("x-token", token);
        }

        let response = request.send().await.context("score API request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("score API fetch failed ({})", response.status()));
        }

        response.json().await.context("invalid score API response")
    }

    pub(crate) async fn get_leaderboard(&self) -> Result<Vec<ScoreEntry>> {
        let payload: LeaderboardResponse = self.get(&[]).await?;
        Ok(payload.leaderboard.unwrap_or_default())
    }

    pub(crate) async fn get_all_scores(&self) -> Result<Vec<ScoreEntry>> {
        let payload: AllScoresResponse = self.get(&[("all", "true")]).await?;
        Ok(payload.all_scores.unwrap_or_default())
    }

    pub(crate) async fn submit(&self, name: &str, score: i64) -> Result<()> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "name": name, "score": score }));

        if let Some(token) = &self.token {
            request = request.header("x-token", token);
        }

        let response = request.send().await.context("score submission failed")?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "score submission rejected ({})",
                response.status()
            ));
        }

        Ok(())
    }
}

#[derive(Deserialize)]
struct LeaderboardResponse {
    leaderboard: Option<Vec<ScoreEntry>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllScoresResponse {
    all_scores: Option<Vec<ScoreEntry>>,
}
