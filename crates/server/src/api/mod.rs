pub mod animes;
pub mod episodes;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod resolver;
pub mod response;
pub mod routes;

pub use routes::create_router;
