use crate::adapters::HttpTranscriber;
use crate::config::Settings;
use crate::dispatch::Dispatcher;
use crate::history::{HistoryError, TaskHistory};
use crate::oracle::HttpCommandOracle;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub mod query;
pub mod routes;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {reason}")]
    Bind { address: String, reason: String },
}

/// Everything one request handler needs: the immutable settings plus the
/// store and the external collaborators, constructed once at startup.
pub struct Gateway {
    pub settings: Settings,
    pub history: TaskHistory,
    oracle: HttpCommandOracle,
    transcriber: HttpTranscriber,
    fetch_agent: ureq::Agent,
}

impl Gateway {
    pub fn new(settings: Settings) -> Result<Self, HistoryError> {
        let history = TaskHistory::open(&settings.history_db_path())?;
        let oracle = HttpCommandOracle::from_settings(&settings);
        let transcriber = HttpTranscriber::from_settings(&settings);
        let fetch_agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(settings.oracle.timeout_secs))
            .build();
        Ok(Self {
            settings,
            history,
            oracle,
            transcriber,
            fetch_agent,
        })
    }

    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(&self.settings, &self.history, &self.oracle)
    }

    pub(crate) fn transcriber(&self) -> &HttpTranscriber {
        &self.transcriber
    }

    pub(crate) fn fetch_agent(&self) -> &ureq::Agent {
        &self.fetch_agent
    }
}

pub struct GatewayServer {
    server: Arc<tiny_http::Server>,
    gateway: Arc<Gateway>,
}

impl GatewayServer {
    pub fn bind(gateway: Gateway) -> Result<Self, ServerError> {
        let address = gateway.settings.bind_address.clone();
        let server =
            tiny_http::Server::http(address.as_str()).map_err(|err| ServerError::Bind {
                address,
                reason: err.to_string(),
            })?;
        Ok(Self {
            server: Arc::new(server),
            gateway: Arc::new(gateway),
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serves requests on a fixed pool of worker threads. Each request is
    /// handled synchronously by one worker; a failing request never affects
    /// another. Blocks until the listener shuts down.
    pub fn run(self) {
        let workers = self.gateway.settings.worker_threads.max(1);
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let server = Arc::clone(&self.server);
            let gateway = Arc::clone(&self.gateway);
            handles.push(thread::spawn(move || {
                while let Ok(request) = server.recv() {
                    routes::handle_request(&gateway, request);
                }
            }));
        }
        for handle in handles {
            let _ = handle.join();
        }
    }
}
