//! Ports - boundaries between the session engine and the outside world

pub mod outbound;
