//! SNMPv2c agent.
//!
//! The agent owns one UDP socket and answers GetRequest and GetNextRequest
//! PDUs from a [`ManagedObjectTree`]. Datagrams are handled one at a time in
//! the receive loop; nothing is carried between requests.
//!
//! # Example
//!
//! ```rust,no_run
//! use fan_snmp_agent::agent::Agent;
//! use fan_snmp_agent::ber::encode_integer;
//! use fan_snmp_agent::oid;
//!
//! # async fn example() -> fan_snmp_agent::Result<()> {
//! let agent = Agent::builder()
//!     .bind("127.0.0.1:1161")
//!     .register_fn(oid!(1, 3, 6, 1, 2, 1, 1, 2, 1, 0), || Ok(encode_integer(42)))
//!     .build()
//!     .await?;
//!
//! agent.run().await
//! # }
//! ```

mod responder;
mod socket;

pub use responder::{COMMUNITY, Responder, resolve_get, resolve_get_next};

use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::UdpSocket;

use crate::error::{Error, Result};
use crate::handler::{ManagedObjectTree, ValueProvider};
use crate::oid::Oid;

/// Default SNMP agent port.
pub const DEFAULT_PORT: u16 = 161;

/// Largest UDP payload.
pub const MAX_DATAGRAM_SIZE: usize = 65535;

/// Agent socket settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Local address to listen on (default `0.0.0.0:161`).
    pub bind_addr: SocketAddr,
    /// Receive buffer per datagram (default 65535). Longer datagrams are truncated
    /// by the OS and then fail to decode.
    pub max_message_size: usize,
    /// Kernel receive buffer size hint.
    pub recv_buffer_size: Option<usize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_message_size: MAX_DATAGRAM_SIZE,
            recv_buffer_size: None,
        }
    }
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    bind_addr: Option<String>,
    config: AgentConfig,
    tree: ManagedObjectTree,
}

impl AgentBuilder {
    /// Create a new builder with default settings and no objects.
    pub fn new() -> Self {
        Self {
            bind_addr: None,
            config: AgentConfig::default(),
            tree: ManagedObjectTree::new(),
        }
    }

    /// Set the local bind address (default `0.0.0.0:161`).
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = Some(addr.into());
        self
    }

    /// Use the given socket settings.
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the per-datagram receive buffer (default 65535).
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Set the kernel receive buffer size hint.
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.config.recv_buffer_size = Some(size);
        self
    }

    /// Replace the object tree.
    pub fn tree(mut self, tree: ManagedObjectTree) -> Self {
        self.tree = tree;
        self
    }

    /// Register one provider.
    pub fn register(mut self, oid: Oid, provider: impl ValueProvider) -> Self {
        self.tree.register(oid, provider);
        self
    }

    /// Register one closure provider.
    pub fn register_fn<F>(mut self, oid: Oid, f: F) -> Self
    where
        F: Fn() -> Result<Bytes> + Send + Sync + 'static,
    {
        self.tree.register_fn(oid, f);
        self
    }

    /// Bind the socket and build the agent.
    pub async fn build(mut self) -> Result<Agent> {
        if let Some(addr) = self.bind_addr.take() {
            self.config.bind_addr = addr.parse().map_err(|_| {
                Error::io(
                    None,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("invalid bind address: {}", addr),
                    ),
                )
            })?;
        }

        let bind_addr = self.config.bind_addr;
        tracing::debug!(snmp.bind_addr = %bind_addr, "binding agent socket");

        let socket = socket::bind_udp_socket(bind_addr, self.config.recv_buffer_size)
            .map_err(|e| Error::io(Some(bind_addr), e))?;
        let local_addr = socket
            .local_addr()
            .map_err(|e| Error::io(Some(bind_addr), e))?;

        tracing::info!(
            snmp.local_addr = %local_addr,
            snmp.objects = self.tree.len(),
            "SNMP agent listening"
        );

        Ok(Agent {
            inner: Arc::new(AgentInner {
                socket,
                local_addr,
                config: self.config,
                responder: Responder::new(self.tree),
            }),
        })
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct AgentInner {
    socket: UdpSocket,
    local_addr: SocketAddr,
    config: AgentConfig,
    responder: Responder,
}

/// A bound SNMP agent. Cheap to clone.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

impl Agent {
    /// Create a builder.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// The actual bound address, useful after binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }

    /// Socket settings in effect.
    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }

    /// The request handler, for driving the agent without a socket.
    pub fn responder(&self) -> &Responder {
        &self.inner.responder
    }

    /// Serve requests forever.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve requests until `shutdown` completes.
    ///
    /// Errors on individual datagrams, including panics in value providers,
    /// are logged and never end the loop.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        let mut buf = vec![0u8; self.inner.config.max_message_size];

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(snmp.local_addr = %self.inner.local_addr, "SNMP agent stopped");
                    return Ok(());
                }
                received = self.inner.socket.recv_from(&mut buf) => match received {
                    Ok((len, source)) => self.process(&buf[..len], source).await,
                    Err(e) => {
                        tracing::error!(error = %e, "agent recv error");
                    }
                },
            }
        }
    }

    async fn process(&self, payload: &[u8], source: SocketAddr) {
        tracing::trace!(
            snmp.source = %source,
            snmp.bytes = payload.len(),
            "received datagram"
        );

        let span = tracing::debug_span!("datagram", snmp.source = %source);
        let responder = &self.inner.responder;
        let outcome = span.in_scope(|| {
            std::panic::catch_unwind(AssertUnwindSafe(|| responder.handle_datagram(payload)))
        });

        let response = match outcome {
            Ok(Some(response)) => response,
            Ok(None) => return,
            Err(_) => {
                tracing::error!(
                    snmp.source = %source,
                    "panic while handling datagram, dropped"
                );
                return;
            }
        };

        if let Err(e) = self.inner.socket.send_to(&response, source).await {
            tracing::warn!(
                snmp.source = %source,
                error = %e,
                "failed to send response"
            );
        }
    }
}
