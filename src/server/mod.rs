pub mod api;

use crate::agent::LeadAgent;
use crate::cli::Args;
use log::{ info, error };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    addr: String,
    agent: Arc<LeadAgent>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, agent: Arc<LeadAgent>, args: Args) -> Self {
        Self { addr, agent, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        self.spawn_idle_pruner();

        let app = api::router(Arc::clone(&self.agent), self.args.global_requests_per_second);

        match (self.args.enable_tls, &self.args.tls_cert_path, &self.args.tls_key_path) {
            (true, Some(cert_path), Some(key_path)) => {
                let tls_config = axum_server::tls_rustls::RustlsConfig
                    ::from_pem_file(cert_path, key_path).await
                    .map_err(|e| format!("Failed to load TLS certificate/key: {}", e))?;
                info!("HTTPS server listening on https://{}", addr);
                axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
            }
            (true, _, _) => {
                return Err("ENABLE_TLS requires both TLS_CERT_PATH and TLS_KEY_PATH".into());
            }
            _ => {
                let listener = tokio::net::TcpListener
                    ::bind(addr).await
                    .map_err(|e| {
                        error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                        e
                    })?;
                info!("HTTP server listening on http://{}", addr);
                axum::serve(listener, app.into_make_service()).await?;
            }
        }

        Ok(())
    }

    fn spawn_idle_pruner(&self) {
        let agent = Arc::clone(&self.agent);
        let period = Duration::from_secs(self.args.rate_limit_window_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                agent.prune_idle_state().await;
            }
        });
    }
}
