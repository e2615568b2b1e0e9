//! ReqwestTransport - 本番用の HttpTransport

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{LivebarError, Result};
use crate::ports::{HttpRequest, HttpResponse, HttpTransport, Method};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_timeout(user_agent, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| LivebarError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }
        builder
    }
}

fn transport_error(e: reqwest::Error) -> LivebarError {
    if e.is_timeout() {
        LivebarError::Timeout(e.to_string())
    } else {
        LivebarError::Network(e.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self
            .build_request(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_query_and_form() {
        let transport = ReqwestTransport::new("livebar-test").unwrap();
        let request = HttpRequest::post("https://example.test/api")
            .header("Authorization", "bearer abc")
            .query(&[("a".to_string(), "1 2".to_string())])
            .form(vec![("text".to_string(), "x&y".to_string())]);

        let built = transport.build_request(&request).build().unwrap();

        assert_eq!(built.method(), reqwest::Method::POST);
        assert_eq!(built.url().as_str(), "https://example.test/api?a=1+2");
        assert_eq!(built.headers()["authorization"], "bearer abc");
        let body = built.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"text=x%26y");
    }
}
