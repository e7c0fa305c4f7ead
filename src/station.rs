use crate::error::FetchError;
use reqwest::Client;
use serde::{Deserialize, Deserializer};

/// One playable entry from the radio directory.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Station {
    #[serde(rename = "stationuuid")]
    pub id: String,
    pub name: String,
    #[serde(rename = "url_resolved")]
    pub url: String,
    #[serde(rename = "favicon", default, deserialize_with = "empty_as_none")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub language: Option<String>,
}

// The directory sends "" (and occasionally null) for unknown fields.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Single GET against the directory; the list comes back as-is.
pub async fn fetch_stations(client: &Client, url: &str) -> Result<Vec<Station>, FetchError> {
    tracing::info!("fetching stations from {}", url);

    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status()));
    }

    let body = resp.bytes().await?;
    let stations: Vec<Station> = serde_json::from_slice(&body)?;

    tracing::info!("directory returned {} stations", stations.len());
    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SAMPLE: &str = r#"[
        {
            "stationuuid": "a1",
            "name": "Radio City",
            "url_resolved": "http://stream.example/city.mp3",
            "favicon": "",
            "tags": "bollywood,hindi",
            "language": "hindi",
            "votes": 42
        },
        {
            "stationuuid": "b2",
            "name": "AIR FM Gold",
            "url_resolved": "http://stream.example/gold.aac",
            "favicon": "http://img.example/gold.png",
            "tags": null
        }
    ]"#;

    /// Serves exactly one HTTP response on a random local port.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf).await;
            let resp = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = sock.write_all(resp.as_bytes()).await;
            let _ = sock.shutdown().await;
        });
        format!("http://{}/json/stations/bycountryexact/India", addr)
    }

    #[test]
    fn test_decode_directory_record() {
        let stations: Vec<Station> = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(stations.len(), 2);

        let city = &stations[0];
        assert_eq!(city.id, "a1");
        assert_eq!(city.url, "http://stream.example/city.mp3");
        assert_eq!(city.icon, None);
        assert_eq!(city.tags.as_deref(), Some("bollywood,hindi"));
        assert_eq!(city.language.as_deref(), Some("hindi"));

        let gold = &stations[1];
        assert_eq!(gold.icon.as_deref(), Some("http://img.example/gold.png"));
        assert_eq!(gold.tags, None);
        assert_eq!(gold.language, None);
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let url = serve_once("200 OK", SAMPLE).await;
        let stations = fetch_stations(&Client::new(), &url).await.unwrap();
        let names: Vec<_> = stations.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Radio City", "AIR FM Gold"]);
    }

    #[tokio::test]
    async fn test_fetch_bad_status() {
        let url = serve_once("503 Service Unavailable", "[]").await;
        let err = fetch_stations(&Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(s) if s.as_u16() == 503));
    }

    #[tokio::test]
    async fn test_fetch_garbage_body() {
        let url = serve_once("200 OK", "<html>nope</html>").await;
        let err = fetch_stations(&Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, FetchError::Json(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/json/stations/bycountryexact/India", addr);
        let err = fetch_stations(&Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }
}
