pub mod preview;
pub mod routes;

pub use routes::build_router;
