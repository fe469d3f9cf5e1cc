//! Blocking HTTP clients for the media-library server and the acquisition
//! services, plus the traits the reconciliation pipeline consumes.

pub mod arr;
pub mod plex;

use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::Error;
use crate::model::{Instance, ItemIdentity, ItemKind};

pub use arr::ArrClient;
pub use plex::PlexClient;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY_BYTES: u64 = 2048;

/// One item the acquisition service tracks, with the file it considers
/// authoritative when it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalItem {
    pub identity: ItemIdentity,
    pub file_path: Option<PathBuf>,
    pub has_file: bool,
}

/// A library item flagged as duplicated, as reported by the library server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItem {
    pub title: String,
    pub identity: ItemIdentity,
    pub renditions: Vec<Rendition>,
}

/// One playable version of a library item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendition {
    pub video_resolution: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub path: PathBuf,
    pub size_bytes: Option<u64>,
}

/// Media-library server queries.
pub trait LibraryService {
    /// Verify the server is reachable at all.
    fn check_connection(&self) -> Result<(), Error>;

    /// Items in `section` flagged as having duplicate copies. Episode sections
    /// are expanded to one item per duplicated episode.
    fn list_duplicates(&self, section: &str, kind: ItemKind) -> Result<Vec<LibraryItem>, Error>;
}

/// Acquisition-service queries.
pub trait AcquisitionService {
    fn list_canonical_items(&self, instance: &Instance) -> Result<Vec<CanonicalItem>, Error>;
}

/// Return a shared HTTP agent with consistent timeouts.
pub(crate) fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .build()
    })
}

/// Send a prepared request and decode a JSON body, mapping every failure to
/// `ServiceUnavailable` for `service`.
pub(crate) fn call_json<T: DeserializeOwned>(
    request: ureq::Request,
    service: &str,
) -> Result<T, Error> {
    let url = request.url().to_string();
    let response = match request.call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, response)) => {
            let body = read_error_body(response);
            return Err(Error::unavailable(
                service,
                format!("HTTP {} from {}: {}", code, url, body),
            ));
        }
        Err(ureq::Error::Transport(err)) => {
            return Err(Error::unavailable(service, err.to_string()));
        }
    };

    response
        .into_json::<T>()
        .map_err(|e| Error::unavailable(service, format!("invalid response from {}: {}", url, e)))
}

fn read_error_body(response: ureq::Response) -> String {
    let mut body = String::new();
    let _ = response
        .into_reader()
        .take(MAX_ERROR_BODY_BYTES)
        .read_to_string(&mut body);
    body.trim().to_string()
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve one canned response per connection, in order, and report each
    /// request line back through the returned receiver.
    pub fn serve(responses: Vec<String>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for response in responses {
                if let Ok((mut stream, _)) = listener.accept() {
                    let mut buf = [0u8; 4096];
                    let read = stream.read(&mut buf).unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..read]).into_owned();
                    let _ = tx.send(request.lines().next().unwrap_or_default().to_string());
                    let _ = stream.write_all(response.as_bytes());
                }
            }
        });
        (format!("http://{}", addr), rx)
    }

    pub fn json_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }
}
