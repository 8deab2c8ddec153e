//! Chess arena: an HTTP game server and a terminal hot-seat game sharing one
//! engine. The server lives in the `backend` crate; this crate holds the
//! command-line front end.

pub mod hotseat;
