mod http;

pub use http::HttpVerificationGateway;
