//! Blocking HTTP/1.1 client for the scoring service.

use crate::wire::AnalysisRequest;
use crate::wire::AnalysisResult;
use crate::wire::ScoredAnalysis;
use el_core::EngineError;
use el_core::EngineResult;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;
use url::Url;

const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "ecolens/0.1";

/// Remote analysis boundary. Implementations block; the orchestrator keeps
/// them off the driving thread.
pub trait ScoringClient: Send + Sync {
    fn analyze(&self, request: &AnalysisRequest) -> EngineResult<ScoredAnalysis>;
}

pub(crate) trait IoStream: Read + Write {}
impl<T> IoStream for T where T: Read + Write {}

pub(crate) type BoxedIoStream = Box<dyn IoStream>;

/// Scoring client speaking HTTP/1.1 directly over TCP, with rustls for
/// https endpoints. One connection per request; transport-level timeouts
/// are handled here, not by callers.
#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    base: Url,
    timeout: Duration,
}

impl HttpScoringClient {
    pub fn new(base_url: &str) -> EngineResult<Self> {
        let base = Url::parse(base_url).map_err(|error| {
            EngineError::new(
                "score.base_url_invalid",
                format!("failed to parse service URL `{base_url}`: {error}"),
            )
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(EngineError::new(
                "score.base_scheme_unsupported",
                format!("service URL scheme `{}` is not supported", base.scheme()),
            ));
        }

        if base.host_str().is_none() {
            return Err(EngineError::new(
                "score.base_host_missing",
                "service URL must include a host",
            ));
        }

        Ok(Self {
            base,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// `GET /health`; Ok for any 2xx answer.
    pub fn health_check(&self) -> EngineResult<()> {
        let (status, _body) = self.execute("GET", "/health", None)?;
        if (200..=299).contains(&status) {
            return Ok(());
        }

        Err(EngineError::new(
            "score.service_status",
            format!("health endpoint answered with status {status}"),
        ))
    }

    fn execute(
        &self,
        method: &str,
        endpoint: &str,
        body: Option<&str>,
    ) -> EngineResult<(u16, String)> {
        let host = self.base.host_str().unwrap_or_default().to_owned();
        let port = self.base.port_or_known_default().ok_or_else(|| {
            EngineError::new(
                "score.base_port_missing",
                "unable to determine service port",
            )
        })?;

        let mut stream = self.open_stream(&host, port)?;
        let target = format!("{}{endpoint}", self.base.path().trim_end_matches('/'));
        let request = encode_request(method, &target, &authority(&self.base), body);
        stream.write_all(request.as_bytes()).map_err(|error| {
            EngineError::new(
                "score.write_failed",
                format!("failed to send {method} {target}: {error}"),
            )
        })?;
        stream.flush().map_err(|error| {
            EngineError::new(
                "score.write_failed",
                format!("failed to flush {method} {target}: {error}"),
            )
        })?;

        let mut raw = Vec::new();
        stream
            .take(MAX_RESPONSE_BYTES as u64 + 1)
            .read_to_end(&mut raw)
            .map_err(|error| {
                EngineError::new(
                    "score.read_failed",
                    format!("failed to read response for {method} {target}: {error}"),
                )
            })?;
        if raw.len() > MAX_RESPONSE_BYTES {
            return Err(EngineError::new(
                "score.response_too_large",
                format!("response exceeds {MAX_RESPONSE_BYTES} bytes"),
            ));
        }

        parse_response(&raw)
    }

    fn open_stream(&self, host: &str, port: u16) -> EngineResult<BoxedIoStream> {
        let query = format!("{host}:{port}");
        let addresses: Vec<SocketAddr> = query
            .to_socket_addrs()
            .map_err(|error| {
                EngineError::new(
                    "score.resolve_failed",
                    format!("failed to resolve `{query}`: {error}"),
                )
            })?
            .collect();

        let mut last_error: Option<EngineError> = None;
        let mut connected: Option<TcpStream> = None;
        for address in addresses {
            match TcpStream::connect_timeout(&address, self.timeout) {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(error) => {
                    last_error = Some(EngineError::new(
                        "score.connect_failed",
                        format!("failed to connect to `{address}`: {error}"),
                    ));
                }
            }
        }

        let stream = match connected {
            Some(stream) => stream,
            None => {
                return Err(last_error.unwrap_or_else(|| {
                    EngineError::new(
                        "score.no_addresses",
                        format!("resolver returned no addresses for `{query}`"),
                    )
                }));
            }
        };

        stream.set_nodelay(true).map_err(|error| {
            EngineError::new(
                "score.socket_configure_failed",
                format!("failed to enable TCP_NODELAY: {error}"),
            )
        })?;
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(|error| {
                EngineError::new(
                    "score.socket_configure_failed",
                    format!("failed to set read timeout: {error}"),
                )
            })?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(|error| {
                EngineError::new(
                    "score.socket_configure_failed",
                    format!("failed to set write timeout: {error}"),
                )
            })?;

        if self.base.scheme() == "https" {
            return tls_upgrade(stream, host);
        }

        Ok(Box::new(stream))
    }
}

impl ScoringClient for HttpScoringClient {
    fn analyze(&self, request: &AnalysisRequest) -> EngineResult<ScoredAnalysis> {
        let encoded = request.to_json()?;
        let (status, body) = self.execute("POST", "/analyze", Some(&encoded))?;
        let body = success_body(status, body)?;
        let result = AnalysisResult::from_json(&body)?;
        Ok(ScoredAnalysis {
            result,
            raw_body: body,
        })
    }
}

#[cfg(feature = "tls-rustls")]
fn tls_upgrade(stream: TcpStream, host: &str) -> EngineResult<BoxedIoStream> {
    crate::tls::connect(stream, host)
}

#[cfg(not(feature = "tls-rustls"))]
fn tls_upgrade(_stream: TcpStream, _host: &str) -> EngineResult<BoxedIoStream> {
    Err(EngineError::new(
        "score.tls_unavailable",
        "https service URLs require the `el-score/tls-rustls` feature",
    ))
}

fn authority(base: &Url) -> String {
    let host = base.host_str().unwrap_or_default();
    match base.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    }
}

fn encode_request(method: &str, target: &str, authority: &str, body: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{method} {target} HTTP/1.1\r\n"));
    out.push_str(&format!("Host: {authority}\r\n"));
    out.push_str(&format!("User-Agent: {USER_AGENT}\r\n"));
    out.push_str("Accept: application/json\r\n");
    out.push_str("Connection: close\r\n");
    if let Some(body) = body {
        out.push_str("Content-Type: application/json\r\n");
        out.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    out.push_str("\r\n");
    if let Some(body) = body {
        out.push_str(body);
    }
    out
}

/// Any non-2xx status is one uniform failure; the body is not inspected.
fn success_body(status: u16, body: String) -> EngineResult<String> {
    if (200..=299).contains(&status) {
        return Ok(body);
    }

    Err(EngineError::new(
        "score.service_status",
        format!("scoring service answered with status {status}"),
    ))
}

fn parse_response(raw: &[u8]) -> EngineResult<(u16, String)> {
    let head_end = raw
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|index| index + 4)
        .ok_or_else(|| {
            EngineError::new(
                "score.head_terminator_missing",
                "response head terminator not found",
            )
        })?;

    let head = std::str::from_utf8(&raw[..head_end]).map_err(|error| {
        EngineError::new(
            "score.head_invalid_utf8",
            format!("response head is not valid UTF-8: {error}"),
        )
    })?;

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    let status = parse_status_line(status_line)?;

    let mut content_length: Option<usize> = None;
    let mut chunked = false;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            let parsed = value.parse::<usize>().map_err(|error| {
                EngineError::new(
                    "score.content_length_invalid",
                    format!("invalid Content-Length `{value}`: {error}"),
                )
            })?;
            content_length = Some(parsed);
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value
                .split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("chunked"));
            if !chunked {
                return Err(EngineError::new(
                    "score.transfer_encoding_unsupported",
                    format!("unsupported transfer encoding `{value}`"),
                ));
            }
        }
    }

    let remainder = &raw[head_end..];
    let body_bytes = if chunked {
        decode_chunked(remainder)?
    } else if let Some(length) = content_length {
        if remainder.len() < length {
            return Err(EngineError::new(
                "score.body_truncated",
                format!(
                    "connection closed after {} of {length} body bytes",
                    remainder.len()
                ),
            ));
        }
        remainder[..length].to_vec()
    } else {
        // Connection: close delimits the body.
        remainder.to_vec()
    };

    let body = String::from_utf8(body_bytes).map_err(|error| {
        EngineError::new(
            "score.body_invalid_utf8",
            format!("response body is not valid UTF-8: {error}"),
        )
    })?;

    Ok((status, body))
}

fn parse_status_line(line: &str) -> EngineResult<u16> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !matches!(version, "HTTP/1.0" | "HTTP/1.1") {
        return Err(EngineError::new(
            "score.status_line_invalid",
            format!("unsupported response version in `{line}`"),
        ));
    }

    let code_text = parts.next().unwrap_or_default();
    let code = code_text.parse::<u16>().map_err(|error| {
        EngineError::new(
            "score.status_line_invalid",
            format!("invalid status code `{code_text}`: {error}"),
        )
    })?;

    if !(100..=599).contains(&code) {
        return Err(EngineError::new(
            "score.status_line_invalid",
            format!("status code `{code}` is out of range"),
        ));
    }

    Ok(code)
}

fn decode_chunked(raw: &[u8]) -> EngineResult<Vec<u8>> {
    let mut decoded = Vec::new();
    let mut offset = 0_usize;

    loop {
        let line_end = raw[offset..]
            .windows(2)
            .position(|window| window == b"\r\n")
            .map(|index| offset + index)
            .ok_or_else(|| {
                EngineError::new(
                    "score.chunk_invalid",
                    "chunk size line is missing its terminator",
                )
            })?;

        let size_line = std::str::from_utf8(&raw[offset..line_end]).map_err(|error| {
            EngineError::new(
                "score.chunk_invalid",
                format!("chunk size line is not valid UTF-8: {error}"),
            )
        })?;
        let size_token = size_line.split(';').next().unwrap_or_default().trim();
        let chunk_size = usize::from_str_radix(size_token, 16).map_err(|error| {
            EngineError::new(
                "score.chunk_invalid",
                format!("invalid chunk size `{size_token}`: {error}"),
            )
        })?;

        if chunk_size == 0 {
            return Ok(decoded);
        }

        let data_start = line_end + 2;
        let data_end = data_start + chunk_size;
        if raw.len() < data_end + 2 {
            return Err(EngineError::new(
                "score.chunk_invalid",
                "connection closed inside a chunk",
            ));
        }
        if raw[data_end..data_end + 2] != *b"\r\n" {
            return Err(EngineError::new(
                "score.chunk_invalid",
                "chunk data is missing its trailing CRLF",
            ));
        }

        decoded.extend_from_slice(&raw[data_start..data_end]);
        offset = data_end + 2;
    }
}
