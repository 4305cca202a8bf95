//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Build the route table from the service config
//! - Register one handler per route plus an OPTIONS handler per path
//! - Wire up middleware (CORS per route, tracing, request ID, timeout)
//! - Serve until shutdown, applying rebuilds as they arrive

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::StatusCode,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServeConfig;
use crate::invoke::adapter::dispatch;
use crate::invoke::ContextProvider;
use crate::reload::{BuildEvent, FunctionLoader, HotReloader, ReloadError};
use crate::routing::{FunctionConfig, HttpMethod, RouteError, RouteTable};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("invalid route configuration: {0}")]
    Route(#[from] RouteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("reload failed: {0}")]
    Reload(#[from] ReloadError),
}

/// HTTP server for the declared functions.
pub struct HttpServer {
    router: Router,
    table: RouteTable,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServeConfig, contexts: Arc<dyn ContextProvider>) -> Result<Self, RouteError> {
        let table = RouteTable::build(&config.functions, config.stage())?;
        let router = Self::build_router(config, &table, contexts);
        Ok(Self { router, table })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServeConfig, table: &RouteTable, contexts: Arc<dyn ContextProvider>) -> Router {
        let mut router = Router::new();

        for route in table.routes() {
            let handler = {
                let route = route.clone();
                let contexts = contexts.clone();
                move |req: Request| async move { dispatch(&route, contexts.as_ref(), req).await }
            };

            let mut method_router = route.method.route(handler);
            if let Some(cors) = &route.cors {
                method_router = cors.wrap(method_router);
            }
            router = router.route(&route.pattern.router_path(), method_router);

            tracing::info!("{} - http://localhost:{}{}", route.method, config.port, route.resource);
        }

        for preflight in table.preflights() {
            let mut method_router = HttpMethod::Options.route(preflight_handler);
            if let Some(cors) = &preflight.cors {
                method_router = cors.wrap(method_router);
            }
            router = router.route(&preflight.pattern.router_path(), method_router);
        }

        if let Some(secs) = config.timeout_secs {
            router = router.layer(TimeoutLayer::new(Duration::from_secs(secs)));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// The router, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Served functions in declaration order.
    pub fn functions(&self) -> &[Arc<FunctionConfig>] {
        self.table.functions()
    }

    /// Serve on `listener` until `shutdown` fires, applying every build that
    /// arrives on `builds`. A failed build stops the server and is returned.
    pub async fn run(
        self,
        listener: TcpListener,
        builds: mpsc::UnboundedReceiver<BuildEvent>,
        loader: Arc<dyn FunctionLoader>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServeError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reloader = HotReloader::new(self.table.functions().to_vec(), loader);
        let reload = reloader.run(builds);
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .into_future();
        tokio::pin!(serve, reload);

        let mut reloading = true;
        loop {
            tokio::select! {
                res = &mut serve => {
                    res?;
                    break;
                }
                res = &mut reload, if reloading => {
                    res?;
                    reloading = false;
                }
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Preflight answer: 200 with no body.
async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}
