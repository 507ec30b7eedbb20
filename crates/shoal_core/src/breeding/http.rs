use super::{Breeder, BreedingRequest, OffspringRecord};
use crate::error::BreedingError;
use async_trait::async_trait;
use shoal_data::Genome;
use std::time::Duration;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct HttpBreederConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
    /// Attempts in total, including the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl HttpBreederConfig {
    #[must_use]
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        Self {
            endpoint: endpoint.into(),
            request_timeout: Duration::from_secs(10),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Posts the breeding pool to a remote service as JSON.
pub struct HttpBreeder {
    client: reqwest::Client,
    config: HttpBreederConfig,
}

impl HttpBreeder {
    #[must_use]
    pub fn new(config: HttpBreederConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn attempt(&self, request: &BreedingRequest) -> Result<Vec<Genome>, BreedingError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .timeout(self.config.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BreedingError::Status(status.as_u16()));
        }
        let body = response.bytes().await.map_err(classify)?;
        parse_offspring(&body)
    }
}

fn classify(err: reqwest::Error) -> BreedingError {
    if err.is_timeout() {
        BreedingError::Timeout
    } else {
        BreedingError::transport(err.to_string())
    }
}

/// Decodes a response body: a non-empty JSON array of `{"genome": ...}`.
pub fn parse_offspring(body: &[u8]) -> Result<Vec<Genome>, BreedingError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| BreedingError::malformed(e.to_string()))?;
    if !value.is_array() {
        return Err(BreedingError::malformed("expected a JSON array"));
    }
    let records: Vec<OffspringRecord> =
        serde_json::from_value(value).map_err(|e| BreedingError::malformed(e.to_string()))?;
    if records.is_empty() {
        return Err(BreedingError::EmptyResponse);
    }
    Ok(records.into_iter().map(|r| r.genome.sanitized()).collect())
}

/// Doubling backoff after the `attempt`-th failure, capped at `MAX_BACKOFF`.
fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    initial
        .saturating_mul(2_u32.saturating_pow(attempt))
        .min(MAX_BACKOFF)
}

#[async_trait]
impl Breeder for HttpBreeder {
    async fn breed(&self, request: &BreedingRequest) -> Result<Vec<Genome>, BreedingError> {
        if request.parents.is_empty() {
            return Err(BreedingError::invalid_request("no parents"));
        }
        let attempts = self.config.max_attempts.max(1);
        let mut last_error = BreedingError::transport("no attempt made");

        for attempt in 0..attempts {
            match self.attempt(request).await {
                Ok(offspring) => return Ok(offspring),
                Err(err) if err.is_transient() && attempt + 1 < attempts => {
                    let backoff = backoff_delay(self.config.initial_backoff, attempt);
                    tracing::warn!(
                        endpoint = %self.config.endpoint,
                        attempt = attempt + 1,
                        error = %err,
                        "Breeding request failed, retrying in {:?}",
                        backoff
                    );
                    last_error = err;
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves the canned responses in order, one per connection.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                read_request(&mut socket).await;
                let reply = format!(
                    "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (format!("http://{addr}/breed"), hits)
    }

    /// Reads headers and a `content-length` body so closing the socket does
    /// not reset the connection under the client.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let Ok(n) = socket.read(&mut buf).await else {
                return;
            };
            if n == 0 {
                return;
            }
            data.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&data);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if data.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    fn breeder(endpoint: String) -> HttpBreeder {
        HttpBreeder::new(HttpBreederConfig {
            initial_backoff: Duration::from_millis(1),
            ..HttpBreederConfig::new(endpoint)
        })
    }

    fn request() -> BreedingRequest {
        BreedingRequest::new(
            vec![Genome::new(0.1, 0.2, 0.3), Genome::new(0.4, 0.5, 0.6)],
            &SimulationConfig::default(),
        )
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let initial = Duration::from_millis(500);
        assert_eq!(backoff_delay(initial, 0), initial);
        assert_eq!(backoff_delay(initial, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(initial, 40), MAX_BACKOFF);
        assert_eq!(backoff_delay(Duration::MAX, 3), MAX_BACKOFF);
    }

    #[test]
    fn test_parse_offspring() {
        let kids = parse_offspring(br#"[{"genome":{"color":0.1,"speed":0.2,"size":1.5}}]"#)
            .expect("parse");
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].size, 1.0);
    }

    #[test]
    fn test_parse_rejects_non_array_and_empty() {
        assert!(matches!(
            parse_offspring(br#"{"genome":{}}"#),
            Err(BreedingError::Malformed(_))
        ));
        assert!(matches!(
            parse_offspring(b"not json"),
            Err(BreedingError::Malformed(_))
        ));
        assert_eq!(parse_offspring(b"[]"), Err(BreedingError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_successful_round_trip() {
        let (endpoint, hits) =
            serve(vec![(200, r#"[{"genome":{"color":0.5,"speed":0.5,"size":0.5}}]"#)]).await;
        let kids = breeder(endpoint).breed(&request()).await.expect("breed");
        assert_eq!(kids, vec![Genome::new(0.5, 0.5, 0.5)]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let (endpoint, hits) = serve(vec![
            (503, "{}"),
            (200, r#"[{"genome":{"color":0.5,"speed":0.5,"size":0.5}}]"#),
        ])
        .await;
        let kids = breeder(endpoint).breed(&request()).await.expect("breed");
        assert_eq!(kids.len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (endpoint, hits) = serve(vec![(400, "{}"), (200, "[]")]).await;
        let err = breeder(endpoint).breed(&request()).await.unwrap_err();
        assert_eq!(err, BreedingError::Status(400));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_pool_is_rejected_locally() {
        let mut req = request();
        req.parents.clear();
        let err = breeder("http://127.0.0.1:9/breed".into())
            .breed(&req)
            .await
            .unwrap_err();
        assert!(matches!(err, BreedingError::InvalidRequest(_)));
    }
}
