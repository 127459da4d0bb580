/*!
Tests for the isahc transport against local listeners.

No outside network: a closed port stands in for a dead proxy, a listener
that never answers for a stalled one, and a one-shot HTTP responder for a
reachable target.
*/

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use proxywatch::core::network::proxy_probe::{
    IsahcProbeTransport, ProbeRequest, ProbeTimeouts, ProbeTransport, ProxyProbe, TransportError,
};
use proxywatch::core::network::types::HealthCheckOutcome;
use serial_test::serial;

/// Port with nothing listening on it
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Serves one request with `body`, then closes
fn one_shot_server(body: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request_head(&mut stream);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    port
}

fn read_request_head(stream: &mut TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}

fn request(url: String, proxy: Option<String>, timeouts: ProbeTimeouts) -> ProbeRequest {
    ProbeRequest { url, proxy, timeouts }
}

#[tokio::test]
async fn test_refused_socks_proxy_is_unreachable() {
    let proxy = format!("socks5h://127.0.0.1:{}", closed_port());

    let result = IsahcProbeTransport::new()
        .get(request("http://example.com/ip".to_string(), Some(proxy), ProbeTimeouts::from_secs(2, 3)))
        .await;

    assert!(matches!(result, Err(TransportError::Unreachable(_))), "got {:?}", result.map(|r| r.status_code));
}

#[tokio::test]
async fn test_refused_http_proxy_is_unreachable() {
    let proxy = format!("http://127.0.0.1:{}", closed_port());

    let result = IsahcProbeTransport::new()
        .get(request("https://example.com/ip".to_string(), Some(proxy), ProbeTimeouts::from_secs(2, 3)))
        .await;

    assert!(matches!(result, Err(TransportError::Unreachable(_))), "got {:?}", result.map(|r| r.status_code));
}

#[tokio::test]
async fn test_silent_proxy_times_out() {
    // accepted by the kernel backlog, never answered
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let proxy = format!("socks5h://127.0.0.1:{}", listener.local_addr().unwrap().port());
    let started = Instant::now();

    let result = IsahcProbeTransport::new()
        .get(request("http://example.com/ip".to_string(), Some(proxy), ProbeTimeouts::from_secs(1, 2)))
        .await;

    assert!(matches!(result, Err(TransportError::TimedOut)), "got {:?}", result.map(|r| r.status_code));
    assert!(started.elapsed() < Duration::from_secs(5));
    drop(listener);
}

#[tokio::test]
async fn test_direct_request_reads_body() {
    let port = one_shot_server("1.2.3.4\n");

    let outcome = ProxyProbe::new().test(None, &format!("http://127.0.0.1:{}/ip", port)).await;

    assert_eq!(outcome, HealthCheckOutcome::success("1.2.3.4"));
}

#[tokio::test]
#[serial]
async fn test_direct_mode_ignores_environment_proxy() {
    let port = one_shot_server("203.0.113.7");
    let dead_proxy = format!("http://127.0.0.1:{}", closed_port());
    let saved = std::env::var("http_proxy").ok();
    std::env::set_var("http_proxy", &dead_proxy);

    let result = IsahcProbeTransport::new()
        .get(request(format!("http://127.0.0.1:{}/ip", port), None, ProbeTimeouts::from_secs(2, 3)))
        .await;

    match saved {
        Some(value) => std::env::set_var("http_proxy", value),
        None => std::env::remove_var("http_proxy"),
    }

    let response = result.unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, b"203.0.113.7");
}
