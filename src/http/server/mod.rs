// HTTP server assembled from controllers and middlewares.

pub mod server;

pub use server::{HttpServer, Server};
