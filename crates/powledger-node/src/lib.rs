pub mod api;
pub mod constants;
pub mod discovery;
pub mod state;
pub mod transport;

pub use api::router;
pub use state::AppState;
pub use transport::HttpTransport;
