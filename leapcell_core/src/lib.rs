//! Client for the Leapcell table service.
//!
//! A [`Leapcell`] client hands out [`Table`] handles. Tables create, fetch and
//! delete records directly, or start a [`Query`] that accumulates a
//! [`Filter`], an [`OrderSpec`], a projection and pagination before a
//! terminal call compiles everything into a wire request and sends it
//! through a [`Transport`].

mod client;
pub mod config;
pub mod error;
mod file;
pub mod filter;
pub mod meta;
pub mod order;
mod query;
mod record;
pub mod request;
mod requester;
pub mod response;
mod table;
pub mod transport;
pub mod value;

pub use client::*;
pub use config::*;
pub use error::*;
pub use file::*;
pub use filter::*;
pub use meta::*;
pub use order::*;
pub use query::*;
pub use record::*;
pub use request::*;
pub use requester::*;
pub use table::*;
pub use transport::*;
pub use value::*;
