//! Blocking JSON API over a plain `TcpListener`.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};

pub mod api;
pub mod routes;

/// Largest request accepted, headers included.
const MAX_REQUEST_BYTES: usize = 1 << 20;

/// Serve the JSON API on `bind_addr`, one connection at a time.
pub fn run_server(bind_addr: &str) -> io::Result<()> {
    let listener = TcpListener::bind(bind_addr)?;
    tracing::info!(%bind_addr, data_dir = %api::data_dir().display(), "buildcalc server listening");

    for stream in listener.incoming() {
        match stream {
            Ok(mut stream) => {
                if let Err(err) = handle_connection(&mut stream) {
                    tracing::warn!(%err, "request error");
                }
            }
            Err(err) => tracing::warn!(%err, "connection failed"),
        }
    }

    Ok(())
}

/// A parsed request: method, path and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Split a request into its parts, together with the byte length the full
/// request will have. `Ok(None)` until the header block is complete; a declared
/// length past [`MAX_REQUEST_BYTES`] is rejected.
pub fn parse_request(bytes: &[u8]) -> io::Result<Option<(RawRequest, usize)>> {
    let Some(header_end) = find_header_end(bytes) else {
        return Ok(None);
    };
    let head = String::from_utf8_lossy(&bytes[..header_end]);
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or("GET").to_string();
    let path = request_line.next().unwrap_or("/").to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    let expected = body_start
        .checked_add(content_length)
        .filter(|expected| *expected <= MAX_REQUEST_BYTES)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("declared content length {content_length} is too large"),
            )
        })?;
    let available = bytes.len().saturating_sub(body_start);
    let body = String::from_utf8_lossy(&bytes[body_start..body_start + available.min(content_length)]);
    Ok(Some((
        RawRequest {
            method,
            path,
            body: body.into_owned(),
        },
        expected,
    )))
}

fn find_header_end(bytes: &[u8]) -> Option<usize> {
    bytes.windows(4).position(|window| window == b"\r\n\r\n")
}

fn handle_connection(stream: &mut TcpStream) -> io::Result<()> {
    let mut received = Vec::new();
    let mut chunk = [0_u8; 8_192];
    let request = loop {
        let read = stream.read(&mut chunk)?;
        received.extend_from_slice(&chunk[..read]);
        match parse_request(&received)? {
            Some((request, expected)) if received.len() >= expected || read == 0 => break request,
            None if read == 0 => return Ok(()),
            _ if received.len() > MAX_REQUEST_BYTES => {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "request too large"));
            }
            _ => {}
        }
    };

    tracing::debug!(method = %request.method, path = %request.path, "request");
    let response = routes::route_request(&request.method, &request.path, &request.body).to_http_string();
    stream.write_all(response.as_bytes())?;
    stream.flush()?;
    Ok(())
}
