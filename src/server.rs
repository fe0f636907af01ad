//! Person Server
//!
//! Binds the configured address and serves the person routes.

use {
    super::config::ServerConfig,
    super::health::HealthChecker,
    super::http::person_routes,
    super::logging,
    super::validator::RequestValidator,
    anyhow::{Context, Result},
    std::{future::Future, net::SocketAddr, sync::Arc},
    tokio::net::TcpListener,
    tokio_stream::wrappers::TcpListenerStream,
    tracing::debug,
};

/// The HTTP server for the person routes.
///
/// Owns the configuration, the shared validator and the health checker that
/// every request handler receives.
pub struct PersonServer {
    config: ServerConfig,
    validator: RequestValidator,
    health: Arc<HealthChecker>,
}

impl PersonServer {
    /// Create a server with the default format checks.
    pub fn new(config: ServerConfig) -> Self {
        debug!(?config, "🚀 Initializing person service");
        Self {
            config,
            validator: RequestValidator::new(),
            health: Arc::new(HealthChecker::default()),
        }
    }

    /// Replace the validator, e.g. one built with custom format checks.
    pub fn with_validator(mut self, validator: RequestValidator) -> Self {
        self.validator = validator;
        self
    }

    /// The configuration this server was created with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.socket_addr().context("Invalid address")?;
        logging::log_server_startup(&addr.to_string(), self.health.instance_id());

        TcpListener::bind(addr)
            .await
            .with_context(|| format!("Could not bind to {addr}"))
    }

    fn serve(
        &self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(SocketAddr, impl Future<Output = ()>)> {
        let addr = listener.local_addr().context("Listener has no local address")?;
        let routes = person_routes(self.validator, self.config.limits, self.health.clone());

        logging::log_server_ready(&format!("http://{addr}"));
        tracing::info!(
            endpoints = ?vec![
                "GET /",
                "POST /person/new",
                "GET /person/detail",
                "GET /person/detail/{person_id}",
                "PUT /person/{person_id}",
                "GET /health",
                "GET /schemas",
            ],
            "Available endpoints"
        );

        let server = warp::serve(routes)
            .serve_incoming_with_graceful_shutdown(TcpListenerStream::new(listener), shutdown);
        Ok((addr, server))
    }

    /// Serve until Ctrl-C.
    pub async fn start(&self) -> Result<()> {
        let listener = self.bind().await?;
        let (_, server) = self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })?;

        server.await;
        logging::log_server_shutdown();
        Ok(())
    }

    /// Serve on a background task until `shutdown` resolves, returning the
    /// bound address.
    pub async fn start_with_shutdown(
        &self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(tokio::task::JoinHandle<()>, SocketAddr)> {
        let listener = self.bind().await?;
        let (addr, server) = self.serve(listener, shutdown)?;
        let handle = tokio::spawn(async move {
            server.await;
            logging::log_server_shutdown();
        });
        Ok((handle, addr))
    }

    /// Serve on an ephemeral port in the background; abort the handle to stop.
    ///
    /// # Returns
    ///
    /// The server task and the port the OS assigned.
    pub async fn start_dynamic(mut self) -> Result<(tokio::task::JoinHandle<()>, u16)> {
        self.config.port = 0;
        let (handle, addr) = self.start_with_shutdown(std::future::pending()).await?;
        Ok((handle, addr.port()))
    }
}
