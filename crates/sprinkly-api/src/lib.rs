// sprinkly-api: Async transport for the irrigation controller's flat HTTP/JSON API

pub mod auth;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod transport;

pub use auth::DevicePassword;
pub use client::{DeviceClient, JsonObject, QueryParams, Transport};
pub use endpoint::{Endpoint, ReadEndpoint, ResultCode, WriteEndpoint};
pub use error::Error;
pub use transport::TransportConfig;
