/// Middleware modules for the API server
///
/// - `rate_limit`: global token-bucket request limiting

pub mod rate_limit;
