//! Integration tests for the tickerdeck CLI.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::process::Command;
use std::thread;

const STOCKS: &str = r#"{
    "GOOG": {"price": 205.75, "change": 1.0, "changePercent": 0.49, "isUp": true, "previousClose": 204.75},
    "MSFT": {"price": 440.5, "change": 2.5, "changePercent": 0.57, "isUp": true, "previousClose": 438.0},
    "NVDA": {"price": 120.0, "change": -1.25, "changePercent": -1.03, "isUp": false, "previousClose": 121.25},
    "TSLA": {"price": 250.0, "change": 3.0, "changePercent": 1.2, "isUp": true, "previousClose": 247.0}
}"#;

/// Get the path to the tickerdeck binary.
fn tickerdeck_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tickerdeck"));
    cmd.env_remove("TICKERDECK_URL")
        .env_remove("TICKERDECK_DELAY")
        .env_remove("TICKERDECK_CONFIG")
        .env_remove("TICKERDECK_LOG");
    cmd
}

/// Serve every request with the same canned response.
fn canned_backend(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get address");

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut buf = [0u8; 4096];
            let mut request = Vec::new();
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(reply.as_bytes());
        }
    });

    format!("http://{}", addr)
}

#[test]
fn test_help_flag() {
    let output = tickerdeck_bin()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tickerdeck"));
    assert!(stdout.contains("--url"));
    assert!(stdout.contains("--delay"));
    assert!(stdout.contains("--panel"));
    assert!(stdout.contains("--config"));
}

#[test]
fn test_version_flag() {
    let output = tickerdeck_bin()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tickerdeck"));
    assert!(stdout.contains("0.") || stdout.contains("1."));
}

#[test]
fn test_invalid_delay() {
    let output = tickerdeck_bin()
        .args(["-b", "-d", "invalid"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_infinite_delay_is_rejected() {
    let output = tickerdeck_bin()
        .args(["-b", "-n", "1", "-d", "inf"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a valid delay"));
}

#[test]
fn test_invalid_panel() {
    let output = tickerdeck_bin()
        .args(["-b", "-p", "charts"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_missing_config_file_prints_sample() {
    let output = tickerdeck_bin()
        .args(["-b", "-n", "1", "-c", "/nonexistent/tickerdeck.toml"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read config file"));
    assert!(stderr.contains("[general]"));
}

#[test]
fn test_batch_prints_watchlist_in_order() {
    let url = canned_backend("200 OK", STOCKS);
    let output = tickerdeck_bin()
        .args(["-b", "-n", "1", "-u", &url])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TICKERDECK"));
    assert!(stdout.contains("Last updated: "));
    assert!(stdout.contains("$440.50"));
    assert!(stdout.contains("+2.50 (+0.57%)"));
    assert!(stdout.contains("-1.25 (-1.03%)"));
    assert!(stdout.contains("Prev Close: $438.00"));
    // Symbols outside the watchlist are not shown.
    assert!(!stdout.contains("TSLA"));

    let msft = stdout.find("MSFT").expect("MSFT missing");
    let goog = stdout.find("GOOG").expect("GOOG missing");
    let nvda = stdout.find("NVDA").expect("NVDA missing");
    assert!(msft < goog && goog < nvda);
}

#[test]
fn test_batch_reports_backend_error() {
    let url = canned_backend("500 Internal Server Error", r#"{"error": "boom"}"#);
    let output = tickerdeck_bin()
        .args(["-b", "-n", "1", "-u", &url])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Error loading stock data. Please try again."));
    assert!(!stdout.contains("SYMBOL"));
}
