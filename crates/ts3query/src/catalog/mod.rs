//! Typed commands: one [`Command`] implementation per ServerQuery request
//! this crate understands, each pairing a wire name (and any fixed
//! switches) with a typed response shape.
//!
//! This replaces the reference client's interface-typed response
//! containers (`GetResponse() interface{}` filled in by reflection) with a
//! parametric one: `Command::Response` is a concrete type, decoded by a
//! concrete `decode_response`, so a caller's `.await?` already has the
//! right shape without a downcast.

pub mod channel;
pub mod client;
pub mod events;
pub mod groups;
pub mod server;

use crate::codec::ArgMap;
use crate::error::Error;

/// A single ServerQuery request and the shape of its reply.
pub trait Command {
    type Response;

    /// The command name, including any fixed switches
    /// (e.g. `"channellist -topic -flags -limits"`).
    fn wire_name(&self) -> String;

    /// Renders this command's arguments, or `None` for commands that take
    /// none beyond their name and switches.
    fn encode_args(&self) -> Option<String> {
        None
    }

    /// Builds the full command line sent to the server.
    fn wire_line(&self) -> String {
        match self.encode_args() {
            Some(args) if !args.is_empty() => format!("{} {args}", self.wire_name()),
            _ => self.wire_name(),
        }
    }

    /// Turns the payload records collected during this command's turn into
    /// its typed response.
    fn decode_response(records: Vec<ArgMap>) -> Result<Self::Response, Error>;
}

/// Marker for commands that return no payload, only a status line.
pub struct NoResponse;

/// Decodes a command's payload as exactly one record.
///
/// Used by commands where the server always returns a single-record
/// payload (e.g. `clientinfo`, `channelinfo`) rather than a list. A command
/// declared with a single-record response shape that gets zero payload
/// lines back is a catalog/response-shape mismatch, not a decoding quirk —
/// the reference server never returns an empty payload for these commands
/// on success, so this only fires when a command is wired to the wrong
/// response descriptor.
pub fn decode_single<T: crate::codec::WireDecode>(records: Vec<ArgMap>) -> Result<T, Error> {
    let map = records
        .into_iter()
        .next()
        .ok_or(Error::Catalog("expected a single-record response, got none"))?;
    Ok(T::decode(&map))
}

/// Decodes a command's payload as a list of records, each independently
/// typed. An empty payload decodes to an empty list rather than an error.
pub fn decode_list<T: crate::codec::WireDecode>(records: Vec<ArgMap>) -> Result<Vec<T>, Error> {
    Ok(records.iter().map(T::decode).collect())
}
