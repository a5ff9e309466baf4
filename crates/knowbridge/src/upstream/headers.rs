//! Browser profile headers.
//!
//! The knowledge service only answers requests that resemble its own web
//! widget, so every request carries this header set.

use reqwest::header::{
    ACCEPT_LANGUAGE, DNT, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER, USER_AGENT,
};

use super::error::{UpstreamError, UpstreamResult};
use crate::config::UpstreamConfig;

/// Build the default header set from configuration.
pub fn browser_headers(config: &UpstreamConfig) -> UpstreamResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    headers.insert(USER_AGENT, header_value("user-agent", &config.user_agent)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        header_value("accept-language", &config.accept_language)?,
    );
    headers.insert(REFERER, header_value("referer", &config.referer)?);
    headers.insert(ORIGIN, header_value("origin", &config.origin)?);
    headers.insert(
        HeaderName::from_static("x-request-origin"),
        header_value("x-request-origin", &config.request_origin)?,
    );
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-site"),
    );

    Ok(headers)
}

fn header_value(name: &'static str, value: &str) -> UpstreamResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| UpstreamError::InvalidHeader {
        name,
        message: e.to_string(),
    })
}
