// HTTP middlewares applied around every controller route.

pub mod compression_middleware;
pub mod cors_middleware;
pub mod middleware;
pub mod recover_middleware;
pub mod trace_middleware;

pub use compression_middleware::CompressionMiddleware;
pub use cors_middleware::CorsMiddleware;
pub use middleware::Middleware;
pub use recover_middleware::PanicRecoverMiddleware;
pub use trace_middleware::TraceMiddleware;
