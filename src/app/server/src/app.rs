// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use dill::{Catalog, CatalogBuilder};
use internal_error::{InternalError, ResultIntoInternal};
use lectern_accounts::JwtAuthenticationConfig;
use lectern_adapter_http::CacheInvalidator;
use lectern_audit::AuditConfig;
use lectern_audit_services::AuditWorker;
use lectern_auth_web3::Web3AuthConfig;
use lectern_cache::CacheConfig;
use observability::init::{LogFormat, LoggingOptions};
use sqlx::postgres::PgPoolOptions;
use time_source::SystemTimeSourceDefault;
use tokio::sync::watch;

use crate::cli::{Cli, Command, RunArgs};
use crate::config::{
    AuthConfig,
    CacheBackendConfig,
    CacheBackendKind,
    DatabaseConfig,
    ServerConfig,
};
use crate::{HttpServer, NonceSweeper};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const BINARY_NAME: &str = "lectern-server";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn run(cli: Cli) -> Result<(), InternalError> {
    let logging_guard = observability::init::init_logging(&LoggingOptions {
        format: if cli.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        },
        verbosity_level: cli.verbose,
    });
    observability::panic_handler::set_hook_trace_panics(true);

    tracing::info!(
        version = VERSION,
        args = ?std::env::args().collect::<Vec<_>>(),
        "Initializing {BINARY_NAME}"
    );

    let result = run_command(cli).await;

    match &result {
        Ok(()) => tracing::info!("Command successful"),
        Err(err) => tracing::error!(
            error_msg = %err.reason(),
            backtrace = %err.backtrace(),
            "Command failed"
        ),
    }

    // Flush all logging sinks
    drop(logging_guard);

    result
}

async fn run_command(cli: Cli) -> Result<(), InternalError> {
    let mut config = ServerConfig::load(cli.config.as_deref())
        .int_err()?
        .with_env_overrides(|name| std::env::var(name).ok());

    match cli.command {
        Command::Run(args) => {
            apply_run_args(&mut config, &args);

            let catalog = init_dependencies(&config).await?;
            run_server(catalog, &config).await
        }
        Command::SweepNonces => {
            let catalog = init_dependencies(&config).await?;
            let removed = catalog.get_one::<NonceSweeper>().int_err()?.sweep_once().await?;

            tracing::info!(removed, "Expired nonces removed");
            Ok(())
        }
    }
}

fn apply_run_args(config: &mut ServerConfig, args: &RunArgs) {
    if let Some(address) = args.address {
        config.http.address = address;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Serving
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

async fn run_server(catalog: Catalog, config: &ServerConfig) -> Result<(), InternalError> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let audit_worker = catalog.get_one::<AuditWorker>().int_err()?;
    let audit_task = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move { audit_worker.run(shutdown_requested(shutdown_rx)).await }
    });

    let nonce_sweeper = catalog.get_one::<NonceSweeper>().int_err()?;
    let sweep_interval: Duration = config.auth.nonce_sweep_interval.into();
    let sweeper_task = tokio::spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            nonce_sweeper
                .run(sweep_interval, shutdown_requested(shutdown_rx))
                .await;
        }
    });

    let server = HttpServer::bind(catalog, &config.http).await?;
    tracing::info!(address = %server.local_addr()?, "HTTP server is listening");

    let server_result = server.run(ctrl_c_signal()).await;

    // Let background tasks finish what they hold
    let _ = shutdown_tx.send(true);
    sweeper_task.await.int_err()?;
    audit_task.await.int_err()??;

    server_result
}

async fn shutdown_requested(mut shutdown_rx: watch::Receiver<bool>) {
    // A dropped sender means shutdown as well
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}

async fn ctrl_c_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?err, "Unable to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown requested");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Catalog
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn init_dependencies(config: &ServerConfig) -> Result<Catalog, InternalError> {
    let mut b = configure_base_catalog(config)?;

    if let Some(database_url) = &config.database.url {
        configure_database_components(&mut b, database_url, &config.database)?;
    } else {
        configure_in_memory_components(&mut b);
    }

    configure_cache_components(&mut b, &config.cache).await?;

    Ok(b.build())
}

// Public only for tests
pub fn configure_base_catalog(config: &ServerConfig) -> Result<CatalogBuilder, InternalError> {
    let mut b = CatalogBuilder::new();

    b.add::<SystemTimeSourceDefault>();

    b.add_value(web3_auth_config(&config.auth)?);
    b.add_value(
        JwtAuthenticationConfig::new(config.auth.jwt_secret.clone())
            .with_access_token_lifetime(to_chrono(config.auth.access_token_lifetime.into())?),
    );
    b.add_value(CacheConfig {
        operation_timeout: config.cache.operation_timeout.into(),
    });
    b.add_value(AuditConfig {
        queue_capacity: config.audit.queue_capacity,
    });

    lectern_auth_web3_services::register_dependencies(&mut b);
    lectern_accounts_services::register_dependencies(&mut b);
    lectern_cache_services::register_dependencies(&mut b);
    lectern_audit_services::register_dependencies(&mut b);

    b.add::<CacheInvalidator>();
    b.add::<NonceSweeper>();

    // Audit trail has no durable backend yet
    b.add::<lectern_audit_inmem::InMemoryAuditEventRepository>();

    Ok(b)
}

fn web3_auth_config(auth_config: &AuthConfig) -> Result<Web3AuthConfig, InternalError> {
    Ok(Web3AuthConfig {
        nonce_ttl: to_chrono(auth_config.nonce_ttl.into())?,
        expected_domain: auth_config.expected_domain.clone(),
    })
}

fn to_chrono(duration: Duration) -> Result<chrono::Duration, InternalError> {
    chrono::Duration::from_std(duration).int_err()
}

fn configure_database_components(
    b: &mut CatalogBuilder,
    database_url: &str,
    database_config: &DatabaseConfig,
) -> Result<(), InternalError> {
    // Connections are opened on first use, so a database outage does not
    // prevent the server from starting
    let pool = PgPoolOptions::new()
        .max_connections(database_config.max_connections)
        .acquire_timeout(database_config.acquire_timeout.into())
        .connect_lazy(database_url)
        .int_err()?;

    tracing::info!(
        max_connections = database_config.max_connections,
        "Using Postgres repositories"
    );

    b.add_value(pool);
    b.add::<lectern_accounts_postgres::PostgresAccountRepository>();
    b.add::<lectern_auth_web3_postgres::PostgresWeb3AuthNonceRepository>();

    Ok(())
}

// Public only for tests
pub fn configure_in_memory_components(b: &mut CatalogBuilder) {
    tracing::warn!("No database configured, accounts and nonces are kept in memory");

    b.add::<lectern_accounts_inmem::InMemoryAccountRepository>();
    b.add::<lectern_auth_web3_inmem::InMemoryWeb3AuthNonceRepository>();
}

async fn configure_cache_components(
    b: &mut CatalogBuilder,
    cache_config: &CacheBackendConfig,
) -> Result<(), InternalError> {
    match cache_config.backend {
        CacheBackendKind::None => {
            tracing::info!("Cache disabled, response caching and rate limiting are bypassed");
        }
        CacheBackendKind::InMemory => {
            b.add::<lectern_cache_inmem::InMemoryCacheStore>();
        }
        CacheBackendKind::Redis => {
            let Some(redis_url) = &cache_config.redis_url else {
                return InternalError::bail("Redis cache backend requires cache.redisUrl");
            };

            let connection = lectern_cache_redis::connect_redis(
                redis_url,
                cache_config.connection_timeout.into(),
            )
            .await?;

            tracing::info!("Using Redis cache");

            b.add_value(connection);
            b.add::<lectern_cache_redis::RedisCacheStore>();
        }
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
