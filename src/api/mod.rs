mod http_server;
mod response;

pub use http_server::serve;
