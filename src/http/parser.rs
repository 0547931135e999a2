//! Request file parsing
//!
//! ```text
//! # comment
//! POST https://api.test/users HTTP/1.1
//! Content-Type: application/json
//!
//! {"name": "tpie"}
//! ```

use crate::http::HttpRequest;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static REQUEST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)\s+(\S+)(?:\s+HTTP/[\d.]+)?\s*$").expect("request line pattern is valid")
});

/// Errors raised while parsing a request file
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Request file contains no request line")]
    MissingRequestLine,

    #[error("Invalid request line '{0}'")]
    InvalidRequestLine(String),

    #[error("Invalid header line '{0}'")]
    InvalidHeader(String),
}

/// Turns request file text into an [`HttpRequest`]
pub trait HttpFileParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<HttpRequest, ParseError>;
}

/// Parser for the plain `.http` layout
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHttpFileParser;

impl HttpFileParser for PlainHttpFileParser {
    fn parse(&self, raw: &str) -> Result<HttpRequest, ParseError> {
        let mut lines = raw
            .lines()
            .take_while(|line| !line.trim_start().starts_with("###"));

        let request_line = lines
            .by_ref()
            .map(str::trim)
            .find(|line| !line.is_empty() && !is_comment(line))
            .ok_or(ParseError::MissingRequestLine)?;

        let captures = REQUEST_LINE
            .captures(request_line)
            .ok_or_else(|| ParseError::InvalidRequestLine(request_line.to_string()))?;
        let method = captures[1].to_ascii_uppercase();
        let url = captures[2].to_string();

        let mut headers = Vec::new();
        for line in lines.by_ref() {
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            if is_comment(line) {
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .filter(|(name, _)| !name.trim().is_empty())
                .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        let body: Vec<&str> = lines.collect();
        let body = body.join("\n");
        let body = body.trim_end();

        Ok(HttpRequest {
            method,
            url,
            headers,
            body: (!body.trim().is_empty()).then(|| body.to_string()),
        })
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("//")
}
