use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use log::info;
use warp::{Filter, Reply};

use super::routes::api_routes;
use super::token_issuer::TokenIssuer;
use super::user_directory::UserDirectory;
use crate::configuration::types::ServerConfig;
use crate::error_handling::types::WebError;

/// Mock REST server for local development of the API client.
///
/// # Fields Overview
///
/// - `directory`: the in-memory user list every route reads and writes
/// - `issuer`: mints the tokens handed out by login and refresh
/// - `bind_address`, `port`: where `start` listens
pub struct MockServer {
    directory: Arc<UserDirectory>,
    issuer: TokenIssuer,
    bind_address: String,
    port: u16,
}

impl MockServer {
    pub fn new(config: &ServerConfig) -> Self {
        let directory = if config.seed_demo_users {
            UserDirectory::with_demo_users()
        } else {
            UserDirectory::default()
        };
        Self::with_directory(Arc::new(directory), config)
    }

    pub fn with_directory(directory: Arc<UserDirectory>, config: &ServerConfig) -> Self {
        Self {
            directory,
            issuer: TokenIssuer::new(config.token_ttl_secs),
            bind_address: config.bind_address.clone(),
            port: config.port,
        }
    }

    pub fn directory(&self) -> &Arc<UserDirectory> {
        &self.directory
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// The complete filter tree, usable without binding a socket.
    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone + Send + Sync + 'static
    {
        api_routes(self.directory.clone(), self.issuer.clone())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, WebError> {
        let ip = match self.bind_address.as_str() {
            "localhost" => IpAddr::V4(Ipv4Addr::LOCALHOST),
            other => other
                .parse::<IpAddr>()
                .map_err(|_| WebError::BadBindAddress(other.to_string()))?,
        };
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Serves the API until the process is stopped.
    pub async fn start(&self) -> Result<(), WebError> {
        let addr = self.socket_addr()?;
        info!(
            "Mock server listening on http://{}/api with {} user(s)",
            addr,
            self.directory.len()
        );
        warp::serve(self.routes()).run(addr).await;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_addr_accepts_localhost_and_ips() {
        let mut config = ServerConfig::default();
        config.bind_address = "localhost".into();
        config.port = 9000;
        let server = MockServer::new(&config);
        assert_eq!(
            server.socket_addr().unwrap(),
            "127.0.0.1:9000".parse().unwrap()
        );

        config.bind_address = "somewhere".into();
        assert!(matches!(
            MockServer::new(&config).socket_addr(),
            Err(WebError::BadBindAddress(_))
        ));
    }

    #[test]
    fn demo_users_follow_config() {
        let mut config = ServerConfig::default();
        assert_eq!(MockServer::new(&config).directory().len(), 3);

        config.seed_demo_users = false;
        assert!(MockServer::new(&config).directory().is_empty());
    }
}
