use crate::constants::{NAME, VERSION};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, InvalidHeaderValue, USER_AGENT};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

pub fn generate_headers() -> Result<HeaderMap<HeaderValue>, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();

    headers.insert(USER_AGENT, format!("{NAME}/{VERSION}").parse()?);
    headers.insert(ACCEPT, "application/json".parse()?);

    Ok(headers)
}

/// Shared client for outbound API calls. Request timeouts are set per call
/// since uploads need far longer than the connect phase.
pub fn build_client() -> Result<Client, reqwest::Error> {
    let headers = generate_headers().unwrap_or_default();

    ClientBuilder::new()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(30))
        .build()
}
