//! Test server management.
//!
//! Spawns in-process skiffd instances on an ephemeral port.

#![allow(dead_code)]

use skiffd::config::Config;
use skiffd::server::Server;
use tokio::task::JoinHandle;

/// A test server instance.
pub struct TestServer {
    port: u16,
    password: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a new test server with the given password, bound to an
    /// ephemeral port.
    pub async fn spawn(password: &str) -> anyhow::Result<Self> {
        let config = Config {
            port: 0,
            password: password.to_string(),
        };
        let server = Server::bind(&config).await?;
        let port = server.local_addr()?.port();
        let handle = tokio::spawn(server.run());

        Ok(Self {
            port,
            password: password.to_string(),
            handle,
        })
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// The shared connection password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Create a new test client connected to this server.
    pub async fn connect(&self, nick: &str) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address(), nick).await
    }

    /// Connect and run the full PASS/NICK/USER handshake, draining the
    /// welcome burst.
    pub async fn login(&self, nick: &str) -> anyhow::Result<super::client::TestClient> {
        let mut client = self.connect(nick).await?;
        client.login(&self.password).await?;
        Ok(client)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
