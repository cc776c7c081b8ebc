// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Meshtrust admin server binary.

use clap::{Parser, Subcommand};
use meshtrust_admin_server::{setup_api, AdminServer, MemorySecretStore, SecretStore};
use meshtrust_server_config::LogFormat;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Meshtrust admin server - secrets, dataplane tokens and metrics.
#[derive(Parser, Debug)]
#[command(
	name = "meshtrust-admin-server",
	about = "Meshtrust control plane admin server",
	version
)]
struct Args {
	/// Configuration file (defaults to /etc/meshtrust/admin-server.toml)
	#[arg(long, env = "MESHTRUST_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("meshtrust-admin-server version: {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match args.config {
		Some(path) => meshtrust_server_config::load_config_with_file(path)?,
		None => meshtrust_server_config::load_config()?,
	};

	let (text_layer, json_layer) = match config.logging.format {
		LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
		LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
	};
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(text_layer)
		.with(json_layer)
		.init();

	tracing::info!(
		local_port = config.admin_server.local.port,
		public_enabled = config.admin_server.public.enabled,
		mode = %config.control_plane.mode,
		environment = %config.control_plane.environment,
		"starting meshtrust-admin-server"
	);

	let store: Arc<dyn SecretStore> = Arc::new(MemorySecretStore::new());
	let api = setup_api(&config, store)?;
	let server = AdminServer::new(config.admin_server.clone(), api.router());

	let stop = CancellationToken::new();
	let signal = stop.clone();
	tokio::spawn(async move {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for shutdown signal");
			return;
		}
		tracing::info!("received shutdown signal");
		signal.cancel();
	});

	server.start(stop).await?;
	tracing::info!("meshtrust-admin-server stopped");
	Ok(())
}
