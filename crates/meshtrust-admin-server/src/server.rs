// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admin HTTP server with two trust zones.
//!
//! The loopback listener always runs on `127.0.0.1` without TLS. The public
//! listener, when enabled, serves the same router over mutual TLS. Both stop
//! together: when the stop token fires or either listener exits, the other
//! is shut down gracefully and every error is reported.

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use meshtrust_server_config::{AdminServerConfig, PublicListenerConfig};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::AdminServerError;
use crate::tls::server_tls_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustZone {
	/// Plaintext, reachable only from the host.
	Loopback,
	/// Mutual TLS, reachable from the network.
	Public,
}

impl fmt::Display for TrustZone {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TrustZone::Loopback => write!(f, "loopback"),
			TrustZone::Public => write!(f, "public"),
		}
	}
}

type ServeResult = Result<(), AdminServerError>;

enum ListenerState {
	Serving(JoinHandle<ServeResult>),
	Exited(ServeResult),
	/// Configuration failed before anything was bound.
	NotStarted(AdminServerError),
	/// Outcome already taken.
	Reported,
}

struct Listener {
	zone: TrustZone,
	handle: Handle,
	addr: Option<SocketAddr>,
	state: ListenerState,
}

impl Listener {
	fn loopback(port: u16, router: Router) -> Self {
		let handle = Handle::new();
		let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
		let server = axum_server::bind(addr).handle(handle.clone());
		let task = tokio::spawn(async move {
			server
				.serve(router.into_make_service())
				.await
				.map_err(|source| AdminServerError::Listener {
					zone: TrustZone::Loopback,
					source,
				})
		});
		Self::serving(TrustZone::Loopback, handle, task)
	}

	fn public(addr: SocketAddr, tls: Arc<rustls::ServerConfig>, router: Router) -> Self {
		let handle = Handle::new();
		let server =
			axum_server::bind_rustls(addr, RustlsConfig::from_config(tls)).handle(handle.clone());
		let task = tokio::spawn(async move {
			server
				.serve(router.into_make_service())
				.await
				.map_err(|source| AdminServerError::Listener {
					zone: TrustZone::Public,
					source,
				})
		});
		Self::serving(TrustZone::Public, handle, task)
	}

	fn serving(zone: TrustZone, handle: Handle, task: JoinHandle<ServeResult>) -> Self {
		Self {
			zone,
			handle,
			addr: None,
			state: ListenerState::Serving(task),
		}
	}

	fn not_started(zone: TrustZone, error: AdminServerError) -> Self {
		Self {
			zone,
			handle: Handle::new(),
			addr: None,
			state: ListenerState::NotStarted(error),
		}
	}

	/// Waits until the socket is bound or the task has already given up.
	async fn await_listening(&mut self) {
		if !matches!(self.state, ListenerState::Serving(_)) {
			return;
		}
		let handle = self.handle.clone();
		let addr = tokio::select! {
			addr = handle.listening() => addr,
			_ = self.exited() => None,
		};
		self.addr = addr;
	}

	/// Resolves once the serving task has finished. Pends forever for a
	/// listener that never started.
	async fn exited(&mut self) {
		match &mut self.state {
			ListenerState::Serving(task) => {
				let outcome = join_outcome(self.zone, task.await);
				self.state = ListenerState::Exited(outcome);
			}
			ListenerState::Exited(_) => {}
			ListenerState::NotStarted(_) | ListenerState::Reported => {
				std::future::pending::<()>().await;
			}
		}
	}

	/// Shuts the listener down and returns its error, if any.
	async fn stop(&mut self, grace: Duration) -> Option<AdminServerError> {
		self.handle.graceful_shutdown(Some(grace));
		let outcome = match std::mem::replace(&mut self.state, ListenerState::Reported) {
			ListenerState::Serving(task) => join_outcome(self.zone, task.await),
			ListenerState::Exited(outcome) => outcome,
			ListenerState::NotStarted(e) => Err(e),
			ListenerState::Reported => Ok(()),
		};
		match outcome {
			Ok(()) => {
				info!(zone = %self.zone, "listener stopped");
				None
			}
			Err(e) => Some(e),
		}
	}
}

fn join_outcome(zone: TrustZone, joined: Result<ServeResult, tokio::task::JoinError>) -> ServeResult {
	joined.unwrap_or_else(|e| {
		Err(AdminServerError::Task {
			zone,
			message: e.to_string(),
		})
	})
}

/// Admin server ready to bind its listeners.
pub struct AdminServer {
	config: AdminServerConfig,
	router: Router,
}

impl AdminServer {
	pub fn new(config: AdminServerConfig, router: Router) -> Self {
		Self { config, router }
	}

	/// Binds the listeners and waits until each is accepting connections.
	///
	/// A public listener whose TLS setup fails is not started; the loopback
	/// listener keeps serving and the failure is returned from
	/// [`RunningAdminServer::serve_until`].
	#[instrument(skip_all)]
	pub async fn listen(self) -> RunningAdminServer {
		let AdminServer { config, router } = self;

		let mut local = Listener::loopback(config.local.port, router.clone());
		local.await_listening().await;
		if let Some(addr) = local.addr {
			info!(zone = %TrustZone::Loopback, %addr, "admin server listening");
		}

		let public = if config.public.enabled {
			let mut public = match public_endpoint(&config.public) {
				Ok((addr, tls)) => Listener::public(addr, tls, router),
				Err(e) => {
					error!(zone = %TrustZone::Public, error = %e, "public listener not started");
					Listener::not_started(TrustZone::Public, e)
				}
			};
			public.await_listening().await;
			if let Some(addr) = public.addr {
				info!(zone = %TrustZone::Public, %addr, "admin server listening with mutual TLS");
			}
			Some(public)
		} else {
			info!("public admin listener disabled");
			None
		};

		RunningAdminServer {
			local,
			public,
			grace: config.shutdown_grace,
		}
	}

	/// Serves until `stop` is cancelled or a listener exits.
	pub async fn start(self, stop: CancellationToken) -> Result<(), AdminServerError> {
		self.listen().await.serve_until(stop).await
	}
}

fn public_endpoint(
	config: &PublicListenerConfig,
) -> Result<(SocketAddr, Arc<rustls::ServerConfig>), AdminServerError> {
	let ip: IpAddr = config
		.interface
		.parse()
		.map_err(|_| AdminServerError::InvalidInterface(config.interface.clone()))?;
	let cert_file = config
		.tls_cert_file
		.as_deref()
		.ok_or(AdminServerError::MissingTlsSetting("tls_cert_file"))?;
	let key_file = config
		.tls_key_file
		.as_deref()
		.ok_or(AdminServerError::MissingTlsSetting("tls_key_file"))?;
	let client_certs_dir = config
		.client_certs_dir
		.as_deref()
		.ok_or(AdminServerError::MissingTlsSetting("client_certs_dir"))?;

	let tls = server_tls_config(cert_file, key_file, client_certs_dir)?;
	Ok((SocketAddr::new(ip, config.port), tls))
}

/// Admin server with its listeners bound.
pub struct RunningAdminServer {
	local: Listener,
	public: Option<Listener>,
	grace: Duration,
}

impl RunningAdminServer {
	/// Bound loopback address, `None` when binding failed.
	pub fn local_addr(&self) -> Option<SocketAddr> {
		self.local.addr
	}

	/// Bound public address, `None` when the listener is disabled or failed.
	pub fn public_addr(&self) -> Option<SocketAddr> {
		self.public.as_ref().and_then(|listener| listener.addr)
	}

	pub async fn serve_until(self, stop: CancellationToken) -> Result<(), AdminServerError> {
		let RunningAdminServer {
			mut local,
			mut public,
			grace,
		} = self;

		tokio::select! {
			_ = stop.cancelled() => info!("stopping admin server"),
			_ = local.exited() => warn!(zone = %TrustZone::Loopback, "listener exited, stopping admin server"),
			_ = optional_exited(&mut public) => warn!(zone = %TrustZone::Public, "listener exited, stopping admin server"),
		}

		let (local_error, public_error) =
			tokio::join!(local.stop(grace), optional_stop(&mut public, grace));

		let errors: Vec<AdminServerError> = [local_error, public_error].into_iter().flatten().collect();
		for e in &errors {
			error!(error = %e, "admin server error");
		}
		AdminServerError::combine(errors)
	}
}

async fn optional_exited(listener: &mut Option<Listener>) {
	match listener {
		Some(listener) => listener.exited().await,
		None => std::future::pending::<()>().await,
	}
}

async fn optional_stop(listener: &mut Option<Listener>, grace: Duration) -> Option<AdminServerError> {
	match listener {
		Some(listener) => listener.stop(grace).await,
		None => None,
	}
}
