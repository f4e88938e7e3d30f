use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network support is disabled in this build")]
    Disabled,
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

#[cfg(feature = "network")]
pub fn fetch_url(url: &str) -> Result<String, FetchError> {
    let transport = |e: reqwest::Error| FetchError::Transport {
        url: url.to_string(),
        reason: e.to_string(),
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(transport)?;
    let response = client.get(url).send().map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    response.text().map_err(transport)
}

#[cfg(not(feature = "network"))]
pub fn fetch_url(_url: &str) -> Result<String, FetchError> {
    Err(FetchError::Disabled)
}
