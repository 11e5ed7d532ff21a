#[allow(dead_code)]
pub mod raw_http;
pub mod socket_guard;
