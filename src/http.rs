use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Duration,
    pub(crate) attempts: usize,
    pub(crate) retry_delay: Duration,
}

impl RetryPolicy {
    /// Reads are safe to repeat.
    pub(crate) const READ: Self = Self {
        connect_timeout: Duration::from_secs(5),
        read_timeout: Duration::from_secs(30),
        attempts: 3,
        retry_delay: Duration::from_secs(1),
    };

    /// Mutations go out exactly once.
    pub(crate) const ONCE: Self = Self {
        connect_timeout: Duration::from_secs(5),
        read_timeout: Duration::from_secs(30),
        attempts: 1,
        retry_delay: Duration::ZERO,
    };
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct HttpRequest<'a> {
    pub(crate) method: Method,
    pub(crate) url: &'a str,
    pub(crate) headers: &'a [(&'a str, &'a str)],
    pub(crate) query: &'a [(&'a str, &'a str)],
}

fn should_retry_http_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}

pub(crate) fn send_with_retries(
    request: &HttpRequest<'_>,
    policy: &RetryPolicy,
) -> Result<String, String> {
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(policy.connect_timeout)
            .timeout_read(policy.read_timeout)
            .timeout_write(policy.read_timeout)
            .build();

        let mut call = agent.request(request.method.as_str(), request.url);
        for (name, value) in request.headers {
            call = call.set(name, value);
        }
        for (key, value) in request.query {
            call = call.query(key, value);
        }

        match call.call() {
            Ok(response) => match response.into_string() {
                Ok(body) => return Ok(body),
                Err(err) => {
                    return Err(format!("request failed: response decode failed: {err}"));
                }
            },
            Err(ureq::Error::Status(status, response)) => {
                let response_body = response.into_string().ok().unwrap_or_default();
                let body = response_body.trim();
                let status_error = if body.is_empty() {
                    format!("HTTP status {status}")
                } else {
                    let truncated = body.chars().take(240).collect::<String>();
                    format!("HTTP status {status} ({truncated})")
                };

                if should_retry_http_status(status) && attempt < attempts {
                    thread::sleep(policy.retry_delay);
                    continue;
                }

                if should_retry_http_status(status) && attempts > 1 {
                    return Err(format!(
                        "{} {} failed after {attempts} attempt(s): {status_error}",
                        request.method.as_str(),
                        request.url
                    ));
                }

                return Err(format!(
                    "{} {} failed: {status_error}",
                    request.method.as_str(),
                    request.url
                ));
            }
            Err(ureq::Error::Transport(err)) => {
                let transport_error = format!("transport error: {err}");
                if attempt < attempts {
                    thread::sleep(policy.retry_delay);
                    continue;
                }
                return Err(format!(
                    "{} {} failed after {attempts} attempt(s): {transport_error}",
                    request.method.as_str(),
                    request.url
                ));
            }
        }
    }

    Err("request failed: exhausted attempts without a concrete error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    struct TestServer {
        base_url: String,
        heads: Arc<Mutex<Vec<String>>>,
        shutdown_tx: mpsc::Sender<()>,
        join_handle: Option<std::thread::JoinHandle<()>>,
    }

    impl TestServer {
        fn spawn(responses: Vec<(u16, &'static str)>) -> Self {
            let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind test server");
            listener.set_nonblocking(true).expect("set nonblocking");
            let addr = listener.local_addr().expect("local addr");

            let heads = Arc::new(Mutex::new(Vec::new()));
            let heads_clone = Arc::clone(&heads);
            let mut queue = VecDeque::from(responses);
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

            let join_handle = std::thread::spawn(move || {
                loop {
                    if shutdown_rx.try_recv().is_ok() {
                        break;
                    }
                    match listener.accept() {
                        Ok((mut stream, _)) => {
                            let head = read_request_head(&mut stream).unwrap_or_default();
                            heads_clone.lock().expect("lock heads").push(head);
                            let (status, body) = queue.pop_front().unwrap_or((200, "ok"));
                            let _ = write_response(&mut stream, status, body);
                        }
                        Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                            std::thread::sleep(Duration::from_millis(5));
                        }
                        Err(_) => break,
                    }
                }
            });

            Self {
                base_url: format!("http://{addr}"),
                heads,
                shutdown_tx,
                join_handle: Some(join_handle),
            }
        }

        fn request_heads(&self) -> Vec<String> {
            self.heads.lock().expect("lock heads").clone()
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            let _ = self.shutdown_tx.send(());
            if let Some(handle) = self.join_handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn read_request_head(stream: &mut TcpStream) -> std::io::Result<String> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(Duration::from_millis(200)))?;
        let mut buf = [0_u8; 1024];
        let mut data = Vec::new();
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => {
                    data.extend_from_slice(&buf[..read]);
                    if data.windows(4).any(|window| window == b"\r\n\r\n") {
                        break;
                    }
                }
                Err(err)
                    if err.kind() == std::io::ErrorKind::WouldBlock
                        || err.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn write_response(stream: &mut TcpStream, status: u16, body: &str) -> std::io::Result<()> {
        let payload = body.as_bytes();
        write!(
            stream,
            "HTTP/1.1 {status} Status\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            payload.len()
        )?;
        stream.write_all(payload)?;
        stream.flush()
    }

    fn fast_policy(attempts: usize) -> RetryPolicy {
        RetryPolicy {
            connect_timeout: Duration::from_millis(200),
            read_timeout: Duration::from_millis(500),
            attempts,
            retry_delay: Duration::from_millis(1),
        }
    }

    fn get<'a>(url: &'a str) -> HttpRequest<'a> {
        HttpRequest {
            method: Method::Get,
            url,
            headers: &[],
            query: &[],
        }
    }

    #[test]
    fn retries_retryable_statuses_until_success() {
        let server = TestServer::spawn(vec![(500, "server-error"), (429, "throttled"), (200, "ok")]);

        let result = send_with_retries(&get(&server.base_url), &fast_policy(3));

        assert_eq!(result.expect("should eventually succeed"), "ok");
        assert_eq!(server.request_heads().len(), 3);
    }

    #[test]
    fn does_not_retry_hard_client_errors() {
        let server = TestServer::spawn(vec![(404, "not-found")]);

        let result = send_with_retries(&get(&server.base_url), &fast_policy(5));

        let err = result.expect_err("404 should not be retried");
        assert!(
            err.contains("HTTP status 404"),
            "unexpected error message: {err}"
        );
        assert_eq!(server.request_heads().len(), 1);
    }

    #[test]
    fn single_attempt_policy_reports_server_error_without_retrying() {
        let server = TestServer::spawn(vec![(503, "down"), (200, "ok")]);

        let result = send_with_retries(&get(&server.base_url), &fast_policy(1));

        let err = result.expect_err("503 should surface on a single attempt");
        assert!(
            err.contains("HTTP status 503") && !err.contains("attempt(s)"),
            "unexpected error message: {err}"
        );
        assert_eq!(server.request_heads().len(), 1);
    }

    #[test]
    fn sends_method_headers_and_query() {
        let server = TestServer::spawn(vec![(200, "")]);
        let url = format!("{}/playlists/42", server.base_url);
        let request = HttpRequest {
            method: Method::Delete,
            url: &url,
            headers: &[("X-Plex-Token", "secret")],
            query: &[("type", "video")],
        };

        send_with_retries(&request, &fast_policy(1)).expect("delete should succeed");

        let heads = server.request_heads();
        let head = heads.first().expect("one request").to_lowercase();
        assert!(
            head.starts_with("delete /playlists/42?type=video "),
            "unexpected request line: {head}"
        );
        assert!(head.contains("x-plex-token: secret"), "missing token: {head}");
    }
}
