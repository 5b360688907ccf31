use std::sync::Arc;

use futures::FutureExt;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::{AppError, AppResult, FetchError},
    models::{MediaItem, MediaKind},
    services::{
        aggregator::{self, SubQuery},
        catalog,
        providers::CatalogProvider,
    },
};

pub const EMPTY_HISTORY_MESSAGE: &str = "Please provide at least one movie.";
pub const NO_RECOMMENDATIONS_MESSAGE: &str = "Could not generate recommendations.";

/// A hosted text-completion model
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends `prompt` and returns the model's text answer
    async fn complete(&self, prompt: &str) -> AppResult<String>;

    fn name(&self) -> &'static str;
}

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts joined
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.api_url, self.model);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Recommendation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Recommendation API returned status {}: {}",
                status, body
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Invalid recommendation response: {}", e)))?;

        parsed
            .into_text()
            .ok_or_else(|| AppError::ExternalApi(NO_RECOMMENDATIONS_MESSAGE.to_string()))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Renders the fixed recommendation prompt for a viewing history
pub fn render_prompt(viewing_history: &[String]) -> String {
    let mut prompt = String::from(
        "You are a movie expert. Based on the user's viewing history, you will suggest some movies that they might like.\n\nHere is the user's viewing history:\n",
    );
    for title in viewing_history {
        prompt.push_str("- ");
        prompt.push_str(title);
        prompt.push('\n');
    }
    prompt.push_str(
        "\nSuggest some movies that the user might like, based on their viewing history. Only list the movie title.",
    );
    prompt
}

/// Extracts one title per non-empty line
///
/// Strips list markers (`-`, `*`, `1.`, `2)`), markdown emphasis and surrounding quotes.
/// Repeated titles are kept once, compared case-insensitively.
pub fn parse_titles(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let line = line.trim_start_matches(['-', '*', '•']).trim_start();
            let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
            let line = if digits > 0 && line[digits..].starts_with(['.', ')']) {
                line[digits + 1..].trim_start()
            } else {
                line
            };
            let title = line.trim_matches(|c: char| c == '*' || c == '"' || c == '_').trim();

            if title.is_empty() {
                None
            } else {
                Some(title.to_string())
            }
        })
        .filter(|title| seen.insert(title.to_lowercase()))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct Recommendations {
    /// Titles as suggested by the model
    pub titles: Vec<String>,
    /// Catalog matches for those titles; suggestions with no film match are absent
    pub items: Vec<MediaItem>,
}

/// Suggests films for a viewing history and resolves them against the catalog
pub async fn get_recommendations(
    client: &dyn CompletionClient,
    provider: Arc<dyn CatalogProvider>,
    viewing_history: Vec<String>,
) -> AppResult<Recommendations> {
    let history: Vec<String> = viewing_history
        .into_iter()
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .collect();

    if history.is_empty() {
        return Err(AppError::InvalidInput(EMPTY_HISTORY_MESSAGE.to_string()));
    }

    let prompt = render_prompt(&history);
    let answer = client.complete(&prompt).await?;
    let titles = parse_titles(&answer);

    tracing::info!(
        client = client.name(),
        history = history.len(),
        suggestions = titles.len(),
        "Generated recommendations"
    );

    if titles.is_empty() {
        return Err(AppError::ExternalApi(NO_RECOMMENDATIONS_MESSAGE.to_string()));
    }

    let sub_queries: Vec<SubQuery> = titles
        .iter()
        .cloned()
        .map(|title| {
            let provider = provider.clone();
            let query: SubQuery = async move {
                let found = catalog::first_match(provider.as_ref(), &title, &[MediaKind::Film]).await;
                Ok::<_, FetchError>(found.into_iter().collect::<Vec<_>>())
            }
            .boxed();
            query
        })
        .collect();

    let items = aggregator::aggregate(sub_queries).await;

    Ok(Recommendations { titles, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockCatalogProvider;

    fn film(id: u64, title: &str) -> MediaItem {
        MediaItem {
            id,
            kind: MediaKind::Film,
            title: title.to_string(),
            poster_path: Some(format!("/{id}.jpg")),
            backdrop_path: None,
            vote_average: 8.0,
            popularity: 50.0,
            release_date: None,
            overview: None,
            genres: vec![],
        }
    }

    #[test]
    fn test_prompt_lists_history() {
        let prompt = render_prompt(&["Inception".to_string(), "Heat".to_string()]);
        assert!(prompt.starts_with("You are a movie expert."));
        assert!(prompt.contains("viewing history:\n- Inception\n- Heat\n"));
        assert!(prompt.ends_with("Only list the movie title."));
    }

    #[test]
    fn test_parse_titles_strips_markers() {
        let text = "1. Interstellar\n2) **The Prestige**\n- \"Memento\"\n\n* Tenet\n• interstellar\n";
        assert_eq!(
            parse_titles(text),
            vec!["Interstellar", "The Prestige", "Memento", "Tenet"]
        );
    }

    #[test]
    fn test_parse_titles_keeps_leading_numbers_in_names() {
        assert_eq!(parse_titles("2001: A Space Odyssey\n12 Angry Men"), vec![
            "2001: A Space Odyssey",
            "12 Angry Men"
        ]);
    }

    #[test]
    fn test_gemini_response_text() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Heat\n"},{"text":"Ronin"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("Heat\nRonin"));

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.into_text(), None);
    }

    #[tokio::test]
    async fn test_empty_history_is_rejected_before_calling_the_model() {
        let mut client = MockCompletionClient::new();
        client.expect_complete().never();
        let provider = MockCatalogProvider::new();

        let result = get_recommendations(&client, Arc::new(provider), vec!["  ".to_string()]).await;

        match result {
            Err(AppError::InvalidInput(msg)) => assert_eq!(msg, EMPTY_HISTORY_MESSAGE),
            other => panic!("expected invalid input, got {:?}", other.map(|r| r.titles)),
        }
    }

    #[tokio::test]
    async fn test_titles_resolve_through_film_search() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .withf(|prompt| prompt.contains("- Heat"))
            .times(1)
            .returning(|_| Ok("Ronin\nNo Such Film\nCollateral".to_string()));
        client.expect_name().return_const("mock");

        let mut provider = MockCatalogProvider::new();
        provider
            .expect_search()
            .withf(|_, kind, _| *kind == MediaKind::Film)
            .returning(|query, _, _| match query {
                "Ronin" => Ok(vec![film(8195, "Ronin"), film(1, "Ronin 2")]),
                "Collateral" => Ok(vec![film(1538, "Collateral")]),
                _ => Ok(vec![]),
            });

        let recs = get_recommendations(&client, Arc::new(provider), vec!["Heat".to_string()])
            .await
            .unwrap();

        assert_eq!(recs.titles, vec!["Ronin", "No Such Film", "Collateral"]);
        let ids: Vec<u64> = recs.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![8195, 1538]);
    }

    #[tokio::test]
    async fn test_blank_answer_is_an_error() {
        let mut client = MockCompletionClient::new();
        client.expect_complete().returning(|_| Ok("\n  \n".to_string()));
        client.expect_name().return_const("mock");

        let result =
            get_recommendations(&client, Arc::new(MockCatalogProvider::new()), vec!["Heat".to_string()]).await;
        assert!(matches!(result, Err(AppError::ExternalApi(msg)) if msg == NO_RECOMMENDATIONS_MESSAGE));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let mut client = MockCompletionClient::new();
        client
            .expect_complete()
            .returning(|_| Err(AppError::ExternalApi("quota exceeded".to_string())));

        let result =
            get_recommendations(&client, Arc::new(MockCatalogProvider::new()), vec!["Heat".to_string()]).await;
        tokio_test::assert_err!(result);
    }
}
