//! Server group queries and membership actions: `servergrouplist`,
//! `servergroupaddclient`, `servergroupdelclient`.

use crate::catalog::{decode_list, Command, NoResponse};
use crate::codec::{ArgMap, ArgWriter, WireDecode};
use crate::error::Error;

/// One record from `servergrouplist`.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerGroupSummary {
    pub id: i64,
    pub name: String,
    pub group_type: i64,
    pub icon_id: i64,
    pub save_db: bool,
    pub sort_id: i64,
    pub name_mode: i64,
    pub member_modify_power: i64,
    pub member_add_power: i64,
    pub member_remove_power: i64,
}

impl WireDecode for ServerGroupSummary {
    fn decode(map: &ArgMap) -> Self {
        Self {
            id: map.get_int("sgid"),
            name: map.get_string("name"),
            group_type: map.get_int("type"),
            icon_id: map.get_int("iconid"),
            save_db: map.get_bool("savedb"),
            sort_id: map.get_int("sortid"),
            name_mode: map.get_int("namemode"),
            member_modify_power: map.get_int("n_modifyp"),
            member_add_power: map.get_int("n_member_addp"),
            member_remove_power: map.get_int("n_member_removep"),
        }
    }
}

/// `servergrouplist`: every server group defined on the virtual server.
pub struct GetServerGroupList;

impl Command for GetServerGroupList {
    type Response = Vec<ServerGroupSummary>;

    fn wire_name(&self) -> String {
        "servergrouplist".to_string()
    }

    fn decode_response(records: Vec<ArgMap>) -> Result<Self::Response, Error> {
        decode_list(records)
    }
}

/// `servergroupaddclient sgid=... cldbid=...`: no payload on success.
pub struct ServerGroupAddClient {
    pub sgid: i64,
    pub client_database_id: i64,
}

impl Command for ServerGroupAddClient {
    type Response = NoResponse;

    fn wire_name(&self) -> String {
        "servergroupaddclient".to_string()
    }

    fn encode_args(&self) -> Option<String> {
        let mut w = ArgWriter::new();
        w.push_int("sgid", self.sgid);
        w.push_int("cldbid", self.client_database_id);
        Some(w.finish())
    }

    fn decode_response(_records: Vec<ArgMap>) -> Result<Self::Response, Error> {
        Ok(NoResponse)
    }
}

/// `servergroupdelclient sgid=... cldbid=...`: no payload on success.
pub struct ServerGroupDelClient {
    pub sgid: i64,
    pub client_database_id: i64,
}

impl Command for ServerGroupDelClient {
    type Response = NoResponse;

    fn wire_name(&self) -> String {
        "servergroupdelclient".to_string()
    }

    fn encode_args(&self) -> Option<String> {
        let mut w = ArgWriter::new();
        w.push_int("sgid", self.sgid);
        w.push_int("cldbid", self.client_database_id);
        Some(w.finish())
    }

    fn decode_response(_records: Vec<ArgMap>) -> Result<Self::Response, Error> {
        Ok(NoResponse)
    }
}
