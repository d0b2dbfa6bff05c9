/*
 * Copyright 2024 Google LLC
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

mod generate_crd;
mod manage;

use std::sync::Arc;

use tokio::{signal, sync::watch};

use crate::{admin, store::MemoryStore};

pub use self::{
    generate_crd::GenerateCrd,
    manage::{Manage, Providers},
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The Command-Line Interface for kxds.
#[derive(clap::Parser)]
#[clap(version, about)]
#[non_exhaustive]
pub struct Cli {
    /// Whether to spawn the admin server or not.
    #[clap(env = "KXDS_NO_ADMIN", long)]
    pub no_admin: bool,
    /// The address to bind for the admin server.
    #[clap(long, env = "KXDS_ADMIN_ADDRESS")]
    pub admin_address: Option<std::net::SocketAddr>,
    /// Whether kxds will report any results to stdout/stderr.
    #[clap(short, long, env = "KXDS_QUIET")]
    pub quiet: bool,
    /// The format of log output.
    #[clap(long, env = "KXDS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// The various kxds commands.
#[derive(Clone, clap::Subcommand)]
pub enum Commands {
    Manage(Manage),
    GenerateCrd(GenerateCrd),
}

impl Commands {
    fn runs_admin(&self) -> bool {
        matches!(self, Self::Manage(_))
    }
}

impl Cli {
    /// Drives the main kxds application lifecycle using the command line
    /// arguments.
    #[tracing::instrument(skip_all)]
    pub async fn drive(self) -> crate::Result<()> {
        let version: std::borrow::Cow<'static, str> = if cfg!(debug_assertions) {
            format!("{VERSION}+debug").into()
        } else {
            VERSION.into()
        };

        if !self.quiet {
            let env_filter = tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy();
            let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);
            match self.log_format {
                LogFormat::Json => subscriber.json().with_file(true).init(),
                LogFormat::Pretty => subscriber.pretty().init(),
            }
        }

        tracing::info!(
            version = &*version,
            commit = option_env!("GIT_COMMIT_HASH").unwrap_or("unknown"),
            "Starting kxds"
        );

        let state = admin::State::new(Arc::new(MemoryStore::new()));
        let _admin_task = (self.command.runs_admin() && !self.no_admin)
            .then(|| admin::server(state.clone(), self.admin_address));

        let (shutdown_tx, mut shutdown_rx) = watch::channel::<()>(());

        #[cfg(target_os = "linux")]
        let mut sig_term_fut = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::spawn(async move {
            #[cfg(target_os = "linux")]
            let sig_term = sig_term_fut.recv();
            #[cfg(not(target_os = "linux"))]
            let sig_term = std::future::pending();

            let signal = tokio::select! {
                _ = signal::ctrl_c() => "SIGINT",
                _ = sig_term => "SIGTERM",
            };

            tracing::info!(%signal, "shutting down from signal");
            // Don't unwrap in order to ensure that we execute
            // any subsequent shutdown tasks.
            shutdown_tx.send(()).ok();
        });

        let fut = tryhard::retry_fn(move || match self.command.clone() {
            Commands::Manage(manager) => {
                let state = state.clone();
                tokio::spawn(async move { manager.manage(state.store, state.ready).await })
            }
            Commands::GenerateCrd(generator) => {
                tokio::spawn(std::future::ready(generator.generate_crd()))
            }
        })
        .retries(3)
        .on_retry(|_, _, error| {
            let error = error.to_string();
            async move {
                tracing::warn!(%error, "error would have caused fatal crash");
            }
        });

        tokio::select! {
            result = fut => result?,
            _ = shutdown_rx.changed() => Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parse_manage() {
        let cli = Cli::try_parse_from([
            "kxds",
            "--log-format",
            "pretty",
            "manage",
            "--port",
            "9000",
            "kubernetes",
            "--namespace",
            "grpc",
        ])
        .unwrap();

        assert_eq!(LogFormat::Pretty, cli.log_format);
        match cli.command {
            Commands::Manage(manage) => {
                assert_eq!(9000, manage.port);
                assert!(matches!(
                    manage.provider,
                    Providers::Kubernetes { namespace: Some(namespace) } if namespace == "grpc"
                ));
            }
            Commands::GenerateCrd(_) => panic!("expected manage"),
        }
    }

    #[test]
    fn manage_defaults() {
        let cli = Cli::try_parse_from(["kxds", "manage", "file", "sources.yaml"]).unwrap();
        assert_eq!(LogFormat::Json, cli.log_format);
        let Commands::Manage(manage) = cli.command else {
            panic!("expected manage");
        };
        assert_eq!(manage::PORT, manage.port);
        assert_eq!("kxds", manage.id);
    }
}
