use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::EmployeeListing;

pub const EMPLOYEE_LISTING_API_ENDPOINT: &str =
    "https://nubela.co/proxycurl/api/linkedin/company/employees/";
pub const PERSON_PROFILE_API_ENDPOINT: &str = "https://nubela.co/proxycurl/api/v2/linkedin";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("Response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response shape from {url}: {message}")]
    Shape { url: String, message: String },
}

// --- Provider trait ---

/// Remote source of LinkedIn company and profile data.
pub trait Provider {
    fn employee_listing(
        &self,
        company_url: &str,
        employment_status: &str,
    ) -> Result<EmployeeListing, ProviderError>;

    fn profile_details(&self, profile_url: &str) -> Result<Map<String, Value>, ProviderError>;
}

// --- Nubela (Proxycurl) provider ---

#[derive(Debug)]
pub struct NubelaClient {
    api_key: String,
    client: reqwest::blocking::Client,
}

impl NubelaClient {
    /// `timeout` of `None` lets a request wait indefinitely.
    pub fn new(api_key: &str, timeout: Option<Duration>) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ProviderError::Request {
                url: "<client setup>".to_string(),
                source,
            })?;
        Ok(Self {
            api_key: api_key.to_string(),
            client,
        })
    }

    fn employee_listing_request(
        &self,
        company_url: &str,
        employment_status: &str,
    ) -> reqwest::blocking::RequestBuilder {
        self.client
            .get(EMPLOYEE_LISTING_API_ENDPOINT)
            .bearer_auth(&self.api_key)
            .query(&[("employment_status", employment_status), ("url", company_url)])
    }

    fn profile_request(&self, profile_url: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .get(PERSON_PROFILE_API_ENDPOINT)
            .bearer_auth(&self.api_key)
            .query(&[("url", profile_url)])
    }

    fn fetch(&self, request: reqwest::blocking::RequestBuilder, url: &str) -> Result<Value, ProviderError> {
        debug!("Fetching {}", url);

        let response = request.send().map_err(|source| ProviderError::Request {
            url: url.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        response.json().map_err(|source| ProviderError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl Provider for NubelaClient {
    fn employee_listing(
        &self,
        company_url: &str,
        employment_status: &str,
    ) -> Result<EmployeeListing, ProviderError> {
        let request = self.employee_listing_request(company_url, employment_status);
        let body = self.fetch(request, company_url)?;
        parse_employee_listing(body, company_url)
    }

    fn profile_details(&self, profile_url: &str) -> Result<Map<String, Value>, ProviderError> {
        let request = self.profile_request(profile_url);
        let body = self.fetch(request, profile_url)?;
        parse_profile(body, profile_url)
    }
}

pub fn parse_employee_listing(body: Value, url: &str) -> Result<EmployeeListing, ProviderError> {
    serde_json::from_value(body).map_err(|e| ProviderError::Shape {
        url: url.to_string(),
        message: e.to_string(),
    })
}

pub fn parse_profile(body: Value, url: &str) -> Result<Map<String, Value>, ProviderError> {
    match body {
        Value::Object(profile) => Ok(profile),
        other => Err(ProviderError::Shape {
            url: url.to_string(),
            message: format!("expected a JSON object, got {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn client() -> NubelaClient {
        NubelaClient::new("test-key", None).unwrap()
    }

    fn local_client() -> NubelaClient {
        NubelaClient {
            api_key: "test-key".to_string(),
            client: reqwest::blocking::Client::builder().no_proxy().build().unwrap(),
        }
    }

    /// Answers a single request with a canned response and returns its URL.
    fn serve_once(status_line: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn test_fetch_decodes_json_body() {
        let client = local_client();
        let url = serve_once("200 OK", r#"{"employees": [], "next_page": null}"#);

        let body = client.fetch(client.client.get(&url), &url).unwrap();
        assert_eq!(body, json!({"employees": [], "next_page": null}));
    }

    #[test]
    fn test_fetch_error_status_keeps_body() {
        let client = local_client();
        let url = serve_once("403 Forbidden", r#"{"description": "Out of credits"}"#);

        let err = client.fetch(client.client.get(&url), &url).unwrap_err();
        match err {
            ProviderError::Status { status, body, .. } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert!(body.contains("Out of credits"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_rejects_non_json_body() {
        let client = local_client();
        let url = serve_once("200 OK", "<html>maintenance</html>");

        let err = client.fetch(client.client.get(&url), &url).unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));
    }

    #[test]
    fn test_employee_listing_request() {
        let request = client()
            .employee_listing_request("https://www.linkedin.com/company/acme", "current")
            .build()
            .unwrap();

        let url = request.url();
        assert_eq!(url.host_str(), Some("nubela.co"));
        assert_eq!(url.path(), "/proxycurl/api/linkedin/company/employees/");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("employment_status".to_string(), "current".to_string())));
        assert!(pairs.contains(&(
            "url".to_string(),
            "https://www.linkedin.com/company/acme".to_string()
        )));
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer test-key"
        );
    }

    #[test]
    fn test_profile_request() {
        let request = client()
            .profile_request("https://www.linkedin.com/in/ada")
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/proxycurl/api/v2/linkedin");
        let pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![("url".to_string(), "https://www.linkedin.com/in/ada".to_string())]
        );
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer test-key"
        );
    }

    #[test]
    fn test_parse_employee_listing_missing_employees() {
        let err = parse_employee_listing(json!({"code": 403, "description": "Out of credits"}), "u")
            .unwrap_err();
        assert!(matches!(err, ProviderError::Shape { .. }));
        assert!(err.to_string().contains("employees"));
    }

    #[test]
    fn test_parse_employee_listing_requires_profile_url() {
        let err = parse_employee_listing(json!({"employees": [{"name": "no url"}]}), "u").unwrap_err();
        assert!(matches!(err, ProviderError::Shape { .. }));
    }

    #[test]
    fn test_parse_profile_rejects_non_object() {
        assert!(parse_profile(json!({"full_name": "Ada"}), "u").is_ok());
        let err = parse_profile(json!(["not", "a", "profile"]), "u").unwrap_err();
        assert!(matches!(err, ProviderError::Shape { .. }));
    }
}
