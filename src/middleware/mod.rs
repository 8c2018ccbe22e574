pub mod cors;
pub mod request_logger;

pub use cors::cors_layer;
pub use request_logger::request_logger_middleware;
