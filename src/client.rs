//! HTTP client for the challenge server

use crate::cli::ServerSettings;
use crate::metrics::{DecisionEvent, RankedSnapshot, RankingEntry};
use anyhow::{Context, Result};
use futures::future::join_all;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fetches run decisions and per-round rankings for a team
pub struct ChallengeClient {
    http: reqwest::Client,
    settings: ServerSettings,
}

impl ChallengeClient {
    pub fn new(settings: ServerSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, settings })
    }

    /// URL of a run's decisions
    pub fn run_url(&self, team_token: &str, run: u32) -> String {
        format!("{}{}/{}", self.settings.results_url, team_token, run)
    }

    /// URL of a run's ranking at one round
    pub fn ranking_url(&self, team_token: &str, run: u32, round: u32) -> String {
        format!(
            "{}{}/{}/{}",
            self.settings.rankings_url, team_token, run, round
        )
    }

    /// Fetch the decisions of a run
    pub async fn fetch_run(&self, team_token: &str, run: u32) -> Result<Vec<DecisionEvent>> {
        let url = self.run_url(team_token, run);
        info!("Connecting to {}", url);

        let events: Vec<DecisionEvent> = self.get_json(&url).await?;
        info!("{} entries in the run", events.len());

        Ok(events)
    }

    /// Fetch the ranking submitted at one round
    pub async fn fetch_ranking(
        &self,
        team_token: &str,
        run: u32,
        round: u32,
    ) -> Result<RankedSnapshot> {
        let url = self.ranking_url(team_token, run, round);
        let entries: Vec<RankingEntry> = self.get_json(&url).await?;
        debug!("Round {}: rank size {}", round, entries.len());

        Ok(RankedSnapshot::from_entries(round, entries))
    }

    /// Fetch the rankings of several rounds concurrently.
    ///
    /// Results come back in the order of `rounds`, each with its own outcome.
    pub async fn fetch_rankings(
        &self,
        team_token: &str,
        run: u32,
        rounds: &[u32],
    ) -> Vec<(u32, Result<RankedSnapshot>)> {
        let fetches = rounds.iter().map(|&round| async move {
            let ranking = self
                .fetch_ranking(team_token, run, round)
                .await
                .context(format!("Failed to fetch ranking for round {}", round));
            (round, ranking)
        });

        join_all(fetches).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let attempts = self.settings.retries.max(1);
        let mut attempt = 1;

        loop {
            match self.try_get_json(url).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    warn!(
                        "Request to {} failed (attempt {}/{}): {}",
                        url, attempt, attempts, e
                    );
                    tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .context(format!("Request to {} failed", url))?
            .error_for_status()
            .context(format!("Server rejected request to {}", url))?;

        debug!("Response {} from {}", response.status(), url);

        response
            .json::<T>()
            .await
            .context(format!("Failed to decode response from {}", url))
    }
}
