//! libcurl-backed fetch primitive.
//!
//! Keeps one easy handle per host so repeated probes reuse the TLS session,
//! the connection and the DNS answer: we want to measure the mirror, not the
//! handshake or our resolver. A handle is checked out for the whole transfer,
//! which also means two fetches to the same host never share a handle.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use curl::easy::Easy;

use super::{Fetch, ProbeError, Sample};

/// Blocking HTTP fetcher with connect and read (stall) timeouts.
pub struct CurlFetcher {
    connect_timeout: Duration,
    read_timeout: Duration,
    handles: Mutex<HashMap<String, Easy>>,
}

impl CurlFetcher {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            handles: Mutex::new(HashMap::new()),
        }
    }

    fn checkout(&self, key: &str) -> Easy {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.remove(key).unwrap_or_else(Easy::new)
    }

    fn checkin(&self, key: String, easy: Easy) {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.insert(key, easy);
    }

    fn perform(&self, easy: &mut Easy, url: &str) -> Result<Sample, ProbeError> {
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(5)?;
        easy.connect_timeout(self.connect_timeout)?;
        // No byte for `read_timeout` aborts the transfer.
        easy.low_speed_limit(1)?;
        easy.low_speed_time(self.read_timeout)?;
        easy.dns_cache_timeout(Duration::from_secs(3600))?;

        let mut bytes = 0u64;
        let start = Instant::now();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                bytes += data.len() as u64;
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let secs = start.elapsed().as_secs_f64();

        let code = easy.response_code()?;
        if code >= 400 {
            return Err(ProbeError::Status(code));
        }
        Ok(Sample { bytes, secs })
    }
}

impl Fetch for CurlFetcher {
    fn fetch(&self, url: &str) -> Result<Sample, ProbeError> {
        let key = handle_key(url);
        let mut easy = self.checkout(&key);
        let result = self.perform(&mut easy, url);
        if result.is_ok() {
            self.checkin(key, easy);
        }
        result
    }
}

/// `scheme://host:port` of `url`, or the URL itself when it does not parse.
fn handle_key(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(u) => format!(
            "{}://{}:{}",
            u.scheme(),
            u.host_str().unwrap_or_default(),
            u.port_or_known_default().unwrap_or_default()
        ),
        Err(_) => url.to_string(),
    }
}
