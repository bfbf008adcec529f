//! # Resource Module
//!
//! Request and response types consumed and produced by the routing engine,
//! plus the [`ResponseStates`] table that maps state names to status codes
//! and default bodies.
//!
//! These types are transport-agnostic: a host server fills in a [`Request`]
//! from whatever it parsed off the wire and writes the resulting
//! [`Response`] back with [`Response::send`].

mod request;
mod response;
mod states;

pub use request::{parse_query_params, HeaderVec, Request, MAX_INLINE_HEADERS, REQUEST_ID_HEADER};
pub use response::{status_reason, Response};
pub use states::{normalize_state_name, ResponseState, ResponseStates};
