// Application wiring: services, HTTP server, background workers.

pub mod app;
pub mod server;

pub use app::App;
pub use server::HttpServer;
