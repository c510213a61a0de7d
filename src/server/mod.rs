mod client;
mod error;
mod handlers;
mod models;
mod state;

pub use error::ServerError;
pub use handlers::{build_router, run_server};
pub use models::{
    Density, ErrorResponse, GenerateRequest, GenerateResponse, OptionsResponse, RenderRequest,
    RenderResponse, UploadResponse,
};
pub use state::AppState;
