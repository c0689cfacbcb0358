pub mod auth;
mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use routes::{build_router, build_state, AppState};

use anyhow::Result;
use tokio::net::TcpListener;

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
