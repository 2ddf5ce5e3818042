//! Client-facing queries and actions: `clientlist`, `clientinfo`,
//! `sendtextmessage`.

use crate::catalog::{decode_list, decode_single, Command, NoResponse};
use crate::codec::{ArgMap, ArgWriter, WireDecode, WireEncode};
use crate::error::Error;

/// Fields present on every client record, whether from `clientlist` or
/// `clientinfo`.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientBasicInfo {
    pub id: i64,
    pub database_id: i64,
    pub nickname: String,
    pub client_type: i64,
    pub unique_identifier: String,
}

impl WireDecode for ClientBasicInfo {
    fn decode(map: &ArgMap) -> Self {
        Self {
            id: map.get_int("clid"),
            database_id: map.get_int("client_database_id"),
            nickname: map.get_string("client_nickname"),
            client_type: map.get_int("client_type"),
            unique_identifier: map.get_string("client_unique_identifier"),
        }
    }
}

/// `clientlist -uid`: every connected client, one record each.
pub struct GetClientList;

impl Command for GetClientList {
    type Response = Vec<ClientBasicInfo>;

    fn wire_name(&self) -> String {
        "clientlist -uid".to_string()
    }

    fn decode_response(records: Vec<ArgMap>) -> Result<Self::Response, Error> {
        decode_list(records)
    }
}

/// The full detail record returned by `clientinfo`.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientInfo {
    pub basic: ClientBasicInfo,
    pub version: String,
    pub platform: String,
    pub input_muted: bool,
    pub output_muted: bool,
    pub idle_time_ms: i64,
    pub channel_id: i64,
}

impl WireDecode for ClientInfo {
    fn decode(map: &ArgMap) -> Self {
        Self {
            basic: ClientBasicInfo::decode(map),
            version: map.get_string("client_version"),
            platform: map.get_string("client_platform"),
            input_muted: map.get_bool("client_input_muted"),
            output_muted: map.get_bool("client_output_muted"),
            idle_time_ms: map.get_int("client_idle_time"),
            channel_id: map.get_int("cid"),
        }
    }
}

/// `clientinfo clid=<id>`: the full detail record for one client.
pub struct GetClientInfo {
    pub clid: i64,
}

impl Command for GetClientInfo {
    type Response = ClientInfo;

    fn wire_name(&self) -> String {
        "clientinfo".to_string()
    }

    fn encode_args(&self) -> Option<String> {
        let mut w = ArgWriter::new();
        w.push_int("clid", self.clid);
        Some(w.finish())
    }

    fn decode_response(records: Vec<ArgMap>) -> Result<Self::Response, Error> {
        decode_single(records)
    }
}

/// `sendtextmessage targetmode=... target=... msg=...`: fire-and-forget,
/// no payload on success.
pub struct SendTextMessage {
    pub target_mode: i64,
    pub target: i64,
    pub msg: String,
}

impl WireEncode for SendTextMessage {
    fn encode(&self, w: &mut ArgWriter) {
        w.push_int("targetmode", self.target_mode);
        w.push_int("target", self.target);
        w.push_string("msg", &self.msg);
    }
}

impl Command for SendTextMessage {
    type Response = NoResponse;

    fn wire_name(&self) -> String {
        "sendtextmessage".to_string()
    }

    fn encode_args(&self) -> Option<String> {
        let mut w = ArgWriter::new();
        self.encode(&mut w);
        Some(w.finish())
    }

    fn decode_response(_records: Vec<ArgMap>) -> Result<Self::Response, Error> {
        Ok(NoResponse)
    }
}
