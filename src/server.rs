//! HTTP frontend for a `LineService`, served with axum.
//!
//! Errors of the served source are fatal: the handler running into one reports it to `serve`,
//! which stops accepting connections and returns the error to its caller.

use std::{future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    error::{Error, ServerError},
    route::{self, Response, Route},
    service::LineService,
    source::ByteSource,
};

/// Time a request may take before it is answered with `408`
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// State shared by all handlers.
struct AppState<S> {
    service: LineService<S>,
    fatal: async_channel::Sender<Error>,
}

/// Bind to `addr` and serve `service` until a fatal error occurs.
pub async fn run<S: ByteSource + 'static>(
    service: LineService<S>,
    addr: SocketAddr,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(
        "Line server listening on {}, serving {}",
        addr,
        service.filename()
    );

    serve(listener, service).await
}

/// Serve `service` on an already bound listener until a fatal error occurs.
pub async fn serve<S: ByteSource + 'static>(
    listener: TcpListener,
    service: LineService<S>,
) -> Result<(), ServerError> {
    let (fatal_tx, fatal_rx) = async_channel::bounded(1);
    let app = create_router(Arc::new(AppState {
        service,
        fatal: fatal_tx,
    }));

    tokio::select! {
        res = axum::serve(listener, app).into_future() => res.map_err(ServerError::Serve),
        Ok(err) = fatal_rx.recv() => Err(ServerError::Fatal(err)),
    }
}

fn create_router<S: ByteSource + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/", get(welcome::<S>))
        .route("/lines", get(line_count::<S>))
        .route("/lines/", get(line_count::<S>))
        .route("/lines/{line}", get(line::<S>))
        .route("/lines/{line}/", get(line::<S>))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

async fn welcome<S: ByteSource + 'static>(State(state): State<Arc<AppState<S>>>) -> Response {
    answer(state, Route::Welcome).await
}

async fn line_count<S: ByteSource + 'static>(State(state): State<Arc<AppState<S>>>) -> Response {
    answer(state, Route::LineCount).await
}

async fn line<S: ByteSource + 'static>(
    Path(line): Path<String>,
    State(state): State<Arc<AppState<S>>>,
) -> Response {
    answer(state, Route::Line(line)).await
}

async fn not_found() -> Response {
    Response::status(StatusCode::NOT_FOUND)
}

/// Answers `route` on its own task. The lookup runs to completion and reports fatal errors even
/// if the client is gone and the handler gets dropped.
async fn answer<S: ByteSource + 'static>(state: Arc<AppState<S>>, route: Route) -> Response {
    let lookup = tokio::spawn(async move {
        match route::respond(&state.service, &route).await {
            Ok(response) => response,
            Err(err) => {
                if err.is_fatal() {
                    tracing::error!(
                        "Stopping server, {} can't be served: {}",
                        state.service.filename(),
                        err
                    );
                    let _ = state.fatal.try_send(err);
                } else {
                    tracing::warn!("Failed to answer {:?}: {}", route, err);
                }
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    });

    lookup.await.unwrap_or_else(|err| {
        tracing::error!("Lookup task failed: {}", err);
        Response::status(StatusCode::INTERNAL_SERVER_ERROR)
    })
}
