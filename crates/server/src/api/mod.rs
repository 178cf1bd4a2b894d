pub mod artworks;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod sources;

pub use routes::create_router;
