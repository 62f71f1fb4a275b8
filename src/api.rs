use crate::errors::FetchError;
use crate::models::{Article, DayCounts, PermalinkResponse, Poem, PoemScope, SavedPoem};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Inclusive publication window for an article query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleRange {
    pub from: NaiveDateTime,
    pub until: NaiveDateTime,
}

impl ArticleRange {
    /// `[date 00:00:00, date 23:59:59]`.
    pub fn for_date(date: NaiveDate) -> Self {
        let from = date.and_time(NaiveTime::MIN);
        Self {
            from,
            until: from + Duration::seconds(86_399),
        }
    }

    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("from", self.from.format(QUERY_TIME_FORMAT).to_string()),
            ("until", self.until.format(QUERY_TIME_FORMAT).to_string()),
        ]
    }
}

#[async_trait]
pub trait RabbitApi: Send + Sync {
    async fn calendar(&self, year: i32) -> Result<DayCounts, FetchError>;

    async fn articles(&self, range: ArticleRange) -> Result<Vec<Article>, FetchError>;

    async fn poem(&self, scope: PoemScope) -> Result<Option<Poem>, FetchError>;

    async fn save_poem(&self, poem: &Poem) -> Result<PermalinkResponse, FetchError>;

    async fn saved_poem(&self, hash: &str) -> Result<SavedPoem, FetchError>;
}

/// A backend call a view wants made on its behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    Calendar { year: i32 },
    Articles(ArticleRange),
    Poem(PoemScope),
    SavePoem(Poem),
    SavedPoem { hash: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse {
    Calendar(DayCounts),
    Articles(Vec<Article>),
    Poem(Option<Poem>),
    Permalink(PermalinkResponse),
    SavedPoem(SavedPoem),
}

impl ApiRequest {
    pub async fn send<A: RabbitApi + ?Sized>(&self, api: &A) -> Result<ApiResponse, FetchError> {
        match self {
            ApiRequest::Calendar { year } => api.calendar(*year).await.map(ApiResponse::Calendar),
            ApiRequest::Articles(range) => api.articles(*range).await.map(ApiResponse::Articles),
            ApiRequest::Poem(scope) => api.poem(*scope).await.map(ApiResponse::Poem),
            ApiRequest::SavePoem(poem) => api.save_poem(poem).await.map(ApiResponse::Permalink),
            ApiRequest::SavedPoem { hash } => {
                api.saved_poem(hash).await.map(ApiResponse::SavedPoem)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
}

impl HttpApi {
    pub fn new(base: Url, timeout: std::time::Duration) -> Result<Self, FetchError> {
        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidRequest(format!("{base} cannot be a base url")));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::network)?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                FetchError::InvalidRequest(format!("{} cannot be a base url", self.base))
            })?;
            path.pop_if_empty().push("api").extend(segments);
        }
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FetchError> {
        let status = response.status();
        let body = response.text().await.map_err(FetchError::network)?;
        if !status.is_success() {
            return Err(FetchError::status(status, &body));
        }
        serde_json::from_str(&body).map_err(FetchError::decode)
    }
}

#[async_trait]
impl RabbitApi for HttpApi {
    async fn calendar(&self, year: i32) -> Result<DayCounts, FetchError> {
        let url = self.endpoint(&["calendar", &year.to_string()])?;
        let response = self.client.get(url).send().await.map_err(FetchError::network)?;
        Self::read_json(response).await
    }

    async fn articles(&self, range: ArticleRange) -> Result<Vec<Article>, FetchError> {
        if range.until < range.from {
            return Err(FetchError::InvalidRequest(
                "article range ends before it starts".to_string(),
            ));
        }
        let url = self.endpoint(&["article"])?;
        let response = self
            .client
            .get(url)
            .query(&range.query())
            .send()
            .await
            .map_err(FetchError::network)?;
        Self::read_json(response).await
    }

    async fn poem(&self, scope: PoemScope) -> Result<Option<Poem>, FetchError> {
        let url = self.endpoint(&["poem"])?;
        let response = self
            .client
            .get(url)
            .query(&[("scope", scope.as_str())])
            .send()
            .await
            .map_err(FetchError::network)?;
        Self::read_json(response).await
    }

    async fn save_poem(&self, poem: &Poem) -> Result<PermalinkResponse, FetchError> {
        if poem.hash.trim().is_empty() {
            return Err(FetchError::InvalidRequest("poem hash must not be empty".to_string()));
        }
        let url = self.endpoint(&["saved_poem", &poem.hash])?;
        let response = self
            .client
            .post(url)
            .json(poem)
            .send()
            .await
            .map_err(FetchError::network)?;
        Self::read_json(response).await
    }

    async fn saved_poem(&self, hash: &str) -> Result<SavedPoem, FetchError> {
        if hash.trim().is_empty() {
            return Err(FetchError::InvalidRequest("poem hash must not be empty".to_string()));
        }
        let url = self.endpoint(&["saved_poem", hash])?;
        let response = self.client.get(url).send().await.map_err(FetchError::network)?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    type Gate = oneshot::Sender<Result<ApiResponse, FetchError>>;

    /// Backend whose calls block until the test releases them, in any order.
    #[derive(Debug, Default)]
    pub struct GatedApi {
        gates: Mutex<Vec<(ApiRequest, Option<Gate>)>>,
        pub calls: AtomicUsize,
    }

    impl GatedApi {
        async fn wait(&self, request: ApiRequest) -> Result<ApiResponse, FetchError> {
            let (tx, rx) = oneshot::channel();
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gates.lock().expect("gates").push((request, Some(tx)));
            rx.await
                .unwrap_or_else(|_| Err(FetchError::Network("gate dropped".to_string())))
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.gates
                .lock()
                .expect("gates")
                .iter()
                .map(|(request, _)| request.clone())
                .collect()
        }

        /// Returns false when the call already completed or its caller went away.
        pub fn release(&self, index: usize, result: Result<ApiResponse, FetchError>) -> bool {
            let gate = self
                .gates
                .lock()
                .expect("gates")
                .get_mut(index)
                .and_then(|(_, gate)| gate.take());
            gate.is_some_and(|gate| gate.send(result).is_ok())
        }
    }

    fn unexpected(response: ApiResponse) -> FetchError {
        FetchError::Decode(format!("unexpected response {response:?}"))
    }

    #[async_trait]
    impl RabbitApi for GatedApi {
        async fn calendar(&self, year: i32) -> Result<DayCounts, FetchError> {
            match self.wait(ApiRequest::Calendar { year }).await? {
                ApiResponse::Calendar(counts) => Ok(counts),
                other => Err(unexpected(other)),
            }
        }

        async fn articles(&self, range: ArticleRange) -> Result<Vec<Article>, FetchError> {
            match self.wait(ApiRequest::Articles(range)).await? {
                ApiResponse::Articles(articles) => Ok(articles),
                other => Err(unexpected(other)),
            }
        }

        async fn poem(&self, scope: PoemScope) -> Result<Option<Poem>, FetchError> {
            match self.wait(ApiRequest::Poem(scope)).await? {
                ApiResponse::Poem(poem) => Ok(poem),
                other => Err(unexpected(other)),
            }
        }

        async fn save_poem(&self, poem: &Poem) -> Result<PermalinkResponse, FetchError> {
            match self.wait(ApiRequest::SavePoem(poem.clone())).await? {
                ApiResponse::Permalink(permalink) => Ok(permalink),
                other => Err(unexpected(other)),
            }
        }

        async fn saved_poem(&self, hash: &str) -> Result<SavedPoem, FetchError> {
            match self
                .wait(ApiRequest::SavedPoem {
                    hash: hash.to_string(),
                })
                .await?
            {
                ApiResponse::SavedPoem(saved) => Ok(saved),
                other => Err(unexpected(other)),
            }
        }
    }
}
