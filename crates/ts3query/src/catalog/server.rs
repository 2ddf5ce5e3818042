//! Session bootstrap commands: `use`, `login`.

use crate::catalog::{Command, NoResponse};
use crate::codec::{ArgMap, ArgWriter};
use crate::error::Error;

/// `use port=<port>`: selects the virtual server for the rest of the session.
pub struct UseServer {
    pub port: u16,
}

impl Command for UseServer {
    type Response = NoResponse;

    fn wire_name(&self) -> String {
        "use".to_string()
    }

    fn encode_args(&self) -> Option<String> {
        let mut w = ArgWriter::new();
        w.push_int("port", self.port as i64);
        Some(w.finish())
    }

    fn decode_response(_records: Vec<ArgMap>) -> Result<Self::Response, Error> {
        Ok(NoResponse)
    }
}

/// `login <username> <password>`.
///
/// Unlike every other command, `login` is not `key=value` encoded: its
/// wire name is built by literal concatenation of the credentials, exactly
/// as the reference server expects it. Credentials containing whitespace
/// cannot be represented this way — that limitation is inherited, not
/// introduced here.
pub struct Login {
    pub username: String,
    pub password: String,
}

impl Command for Login {
    type Response = NoResponse;

    fn wire_name(&self) -> String {
        format!("login {} {}", self.username, self.password)
    }

    fn decode_response(_records: Vec<ArgMap>) -> Result<Self::Response, Error> {
        Ok(NoResponse)
    }
}
