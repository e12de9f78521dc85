use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, ServiceError};

pub(crate) fn get_json(agent: &ureq::Agent, url: &str) -> Result<Value> {
    debug!(%url, "GET");
    read_json(agent.get(url).call(), url)
}

pub(crate) fn post_json<B: Serialize>(agent: &ureq::Agent, url: &str, body: &B) -> Result<Value> {
    debug!(%url, "POST");
    read_json(agent.post(url).send_json(body), url)
}

/// Like [`post_json`] but hands back a non-2xx reply whose body carries a
/// `success` flag, for endpoints that explain refusals in the body. Any other
/// non-2xx is an outage.
pub(crate) fn post_json_any_status<B: Serialize>(
    agent: &ureq::Agent,
    url: &str,
    body: &B,
) -> Result<Value> {
    debug!(%url, "POST");
    match agent.post(url).send_json(body) {
        Ok(response) => body_json(response, url),
        Err(ureq::Error::Status(code, response)) => {
            let body: Option<Value> = response.into_json().ok();
            match body {
                Some(body) if body.get("success").is_some() => Ok(body),
                body => Err(status_error(code, body.as_ref(), url)),
            }
        }
        Err(e) => Err(transport_error(e, url)),
    }
}

fn read_json(result: Result<ureq::Response, ureq::Error>, url: &str) -> Result<Value> {
    match result {
        Ok(response) => body_json(response, url),
        Err(ureq::Error::Status(404, _)) => Err(ServiceError::NotFound(url.to_string())),
        Err(ureq::Error::Status(code, response)) => {
            let body: Option<Value> = response.into_json().ok();
            Err(status_error(code, body.as_ref(), url))
        }
        Err(e) => Err(transport_error(e, url)),
    }
}

fn body_json(response: ureq::Response, url: &str) -> Result<Value> {
    response
        .into_json()
        .map_err(|e| ServiceError::MalformedResponse(format!("{url}: body is not JSON: {e}")))
}

fn status_error(code: u16, body: Option<&Value>, url: &str) -> ServiceError {
    let message = body
        .and_then(|b| b.get("error").or_else(|| b.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {code}"));
    warn!(%url, status = code, %message, "request failed");
    ServiceError::ServiceUnavailable {
        status: Some(code),
        message,
    }
}

fn transport_error(e: ureq::Error, url: &str) -> ServiceError {
    warn!(%url, error = %e, "request failed");
    ServiceError::unavailable(e.to_string())
}

pub(crate) fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Reads a field that the collaborators send either as a string or as a number.
pub(crate) fn string_like(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn de_string_like<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = <Value as serde::Deserialize>::deserialize(deserializer)?;
    string_like(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected string or number, got {value}")))
}

/// A one-shot HTTP server for exercising the clients against real sockets.
#[cfg(test)]
pub(crate) mod canned {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    /// Request line and body as the server saw them.
    #[derive(Debug)]
    pub(crate) struct Seen {
        pub line: String,
        pub body: String,
    }

    pub(crate) struct CannedServer {
        pub url: String,
        seen: mpsc::Receiver<Seen>,
    }

    impl CannedServer {
        /// Serves one connection per reply, in order, then stops listening.
        pub(crate) fn start(replies: Vec<(u16, &'static str)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());
            let (tx, seen) = mpsc::channel();

            thread::spawn(move || {
                for (status, reply) in replies {
                    let Ok((stream, _)) = listener.accept() else {
                        return;
                    };
                    let mut reader = BufReader::new(stream);
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();

                    let mut content_length = 0;
                    loop {
                        let mut header = String::new();
                        if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
                            break;
                        }
                        if let Some((name, value)) = header.split_once(':') {
                            if name.eq_ignore_ascii_case("content-length") {
                                content_length = value.trim().parse().unwrap();
                            }
                        }
                    }
                    let mut body = vec![0; content_length];
                    reader.read_exact(&mut body).unwrap();
                    let _ = tx.send(Seen {
                        line: line.trim_end().to_string(),
                        body: String::from_utf8_lossy(&body).into_owned(),
                    });

                    let mut stream = reader.into_inner();
                    write!(
                        stream,
                        "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                        reply.len()
                    )
                    .unwrap();
                    stream.flush().unwrap();
                }
            });

            Self { url, seen }
        }

        /// The next request the server handled.
        pub(crate) fn next_request(&self) -> Seen {
            self.seen.recv_timeout(Duration::from_secs(5)).unwrap()
        }
    }
}
