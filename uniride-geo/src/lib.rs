pub mod geocoding;
pub mod routing;

pub use geocoding::HttpGeocodingClient;
pub use routing::HttpRoutingClient;
