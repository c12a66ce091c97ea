pub mod routes;
pub mod stream_routes;
pub mod world_routes;

pub use routes::create_routes;
