//! The caller-facing handle: one typed async method per catalog command,
//! plus a generic [`Client::call`] for anything constructed directly
//! against [`crate::catalog::Command`].

use tokio_util::sync::CancellationToken;

use crate::catalog::channel::{ChannelInfo, ChannelListEntry, GetChannelInfo, GetChannelList};
use crate::catalog::client::{ClientInfo, GetClientInfo, GetClientList, SendTextMessage};
use crate::catalog::groups::{
    GetServerGroupList, ServerGroupAddClient, ServerGroupDelClient, ServerGroupSummary,
};
use crate::catalog::server::{Login, UseServer};
use crate::catalog::Command;
use crate::error::Error;
use crate::multiplexer::Handle;

/// A connected ServerQuery session.
///
/// Every method takes a [`CancellationToken`] first: cancelling it
/// abandons that call without affecting any other in-flight or queued
/// command on the same connection. Pass [`CancellationToken::new`] for a
/// call that should simply run to completion or its own timeout.
#[derive(Clone)]
pub struct Client {
    handle: Handle,
    shutdown: CancellationToken,
}

impl Client {
    pub(crate) fn new(handle: Handle, shutdown: CancellationToken) -> Self {
        Self { handle, shutdown }
    }

    /// Submits any [`Command`] and decodes its response.
    pub async fn call<C: Command>(&self, command: &C, cancel: CancellationToken) -> Result<C::Response, Error> {
        let records = self.handle.call(command.wire_line(), cancel).await?;
        C::decode_response(records)
    }

    /// Closes the connection: the Driver task exits, every queued and
    /// in-flight call fails with [`Error::Closed`], and every subscriber's
    /// channel is dropped.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub async fn use_server(&self, cancel: CancellationToken, port: u16) -> Result<(), Error> {
        self.call(&UseServer { port }, cancel).await?;
        Ok(())
    }

    pub async fn login(&self, cancel: CancellationToken, username: impl Into<String>, password: impl Into<String>) -> Result<(), Error> {
        self.call(
            &Login {
                username: username.into(),
                password: password.into(),
            },
            cancel,
        )
        .await?;
        Ok(())
    }

    pub async fn client_list(&self, cancel: CancellationToken) -> Result<Vec<crate::catalog::client::ClientBasicInfo>, Error> {
        self.call(&GetClientList, cancel).await
    }

    pub async fn client_info(&self, cancel: CancellationToken, clid: i64) -> Result<ClientInfo, Error> {
        self.call(&GetClientInfo { clid }, cancel).await
    }

    pub async fn send_text_message(
        &self,
        cancel: CancellationToken,
        target_mode: i64,
        target: i64,
        msg: impl Into<String>,
    ) -> Result<(), Error> {
        self.call(
            &SendTextMessage {
                target_mode,
                target,
                msg: msg.into(),
            },
            cancel,
        )
        .await?;
        Ok(())
    }

    pub async fn channel_list(&self, cancel: CancellationToken) -> Result<Vec<ChannelListEntry>, Error> {
        self.call(&GetChannelList, cancel).await
    }

    pub async fn channel_info(&self, cancel: CancellationToken, cid: i64) -> Result<ChannelInfo, Error> {
        self.call(&GetChannelInfo { cid }, cancel).await
    }

    pub async fn server_group_list(&self, cancel: CancellationToken) -> Result<Vec<ServerGroupSummary>, Error> {
        self.call(&GetServerGroupList, cancel).await
    }

    pub async fn server_group_add_client(
        &self,
        cancel: CancellationToken,
        sgid: i64,
        client_database_id: i64,
    ) -> Result<(), Error> {
        self.call(
            &ServerGroupAddClient {
                sgid,
                client_database_id,
            },
            cancel,
        )
        .await?;
        Ok(())
    }

    pub async fn server_group_del_client(
        &self,
        cancel: CancellationToken,
        sgid: i64,
        client_database_id: i64,
    ) -> Result<(), Error> {
        self.call(
            &ServerGroupDelClient {
                sgid,
                client_database_id,
            },
            cancel,
        )
        .await?;
        Ok(())
    }
}
