use crate::{
    config::{NAME, SPEC_VERSION, VENDOR, VERSION},
    constants::{CHANNEL_BUFFER_SIZE, DBUS_NAME, DBUS_PATH},
};
use anyhow::Context;
use stackd_util::{CloseReason, DecodeError, NotifyRequest};
use std::collections::HashMap;
use tokio::sync::{
    mpsc::{Receiver, Sender, channel},
    oneshot,
};
use zbus::{
    Connection, fdo,
    fdo::{DBusProxy, NameLostStream, RequestNameFlags, RequestNameReply},
    interface,
    message::Header,
    names::BusName,
    object_server::SignalEmitter,
};

/// Requests handed from the bus to the reactor.
#[derive(Debug)]
pub enum Input {
    Notify {
        request: NotifyRequest,
        reply: oneshot::Sender<u32>,
    },
    CloseNotification(u32),
    /// A chooser selection came back for notification `id`.
    ActionInvoked { id: u32, key: String },
}

/// The bus side of the daemon: the connection owning the service name,
/// plus the receiving end of the request channel.
pub struct Conns {
    pub connection: Connection,
    pub tx: Sender<Input>,
    pub rx: Receiver<Input>,
    pub name_lost: NameLostStream,
}

impl Conns {
    /// Connect to the session bus, serve the interface and claim the name.
    ///
    /// Failing to get the name is fatal, another notification daemon owns it.
    pub async fn new() -> anyhow::Result<Self> {
        let (tx, rx) = channel(CHANNEL_BUFFER_SIZE);

        let connection = Connection::session()
            .await
            .context("Failed to connect to the session bus")?;
        connection
            .object_server()
            .at(DBUS_PATH, Notifications(tx.clone()))
            .await
            .context("Failed to register the notification interface")?;

        let dbus = DBusProxy::new(&connection).await?;
        let name_lost = dbus.receive_name_lost().await?;
        let reply = dbus
            .request_name(
                DBUS_NAME.try_into()?,
                RequestNameFlags::DoNotQueue.into(),
            )
            .await
            .with_context(|| format!("Failed to request {DBUS_NAME}"))?;
        match reply {
            RequestNameReply::PrimaryOwner | RequestNameReply::AlreadyOwner => {}
            other => anyhow::bail!(
                "Unable to own {DBUS_NAME} ({other:?}), is another daemon running?"
            ),
        }
        tracing::info!("Serving {} at {}", DBUS_NAME, DBUS_PATH);

        Ok(Self {
            connection,
            tx,
            rx,
            name_lost,
        })
    }

    fn emitter<'a>(&'a self, client: Option<&'a str>) -> zbus::Result<SignalEmitter<'a>> {
        let emitter = SignalEmitter::new(&self.connection, DBUS_PATH)?;
        Ok(match client.map(BusName::try_from) {
            Some(Ok(destination)) => emitter.set_destination(destination),
            Some(Err(err)) => {
                tracing::debug!("Broadcasting signal, bad destination: {}", err);
                emitter
            }
            None => emitter,
        })
    }

    pub async fn notification_closed(
        &self,
        id: u32,
        reason: CloseReason,
        client: Option<&str>,
    ) -> zbus::Result<()> {
        Notifications::notification_closed(&self.emitter(client)?, id, reason as u32).await
    }

    pub async fn action_invoked(
        &self,
        id: u32,
        key: &str,
        client: Option<&str>,
    ) -> zbus::Result<()> {
        Notifications::action_invoked(&self.emitter(client)?, id, key).await
    }
}

fn invalid_args(err: DecodeError) -> fdo::Error {
    fdo::Error::InvalidArgs(err.to_string())
}

pub struct Notifications(Sender<Input>);

#[interface(name = "org.freedesktop.Notifications")]
impl Notifications {
    async fn close_notification(&self, id: u32) {
        if let Err(err) = self.0.send(Input::CloseNotification(id)).await {
            tracing::error!("Failed to send close notification: {}", err);
        }
    }

    /// "actions"	The server will provide the specified actions to the user.
    /// "body"	Supports body text.
    /// "body-markup"	Supports markup in the body text.
    async fn get_capabilities(&self) -> Vec<&'static str> {
        vec!["actions", "body", "body-markup"]
    }

    #[zbus(out_args("name", "vendor", "version", "spec_version"))]
    async fn get_server_information(
        &self,
    ) -> (&'static str, &'static str, &'static str, &'static str) {
        (NAME, VENDOR, VERSION, SPEC_VERSION)
    }

    /// expire_timeout	INT32
    ///
    /// The timeout time in milliseconds since the display of the notification at which the notification should automatically close.
    /// If -1, the notification's expiration time is dependent on the notification server's settings, and may vary for the type of notification. If 0, never expire.
    #[allow(clippy::too_many_arguments)]
    async fn notify(
        &self,
        #[zbus(header)] header: Header<'_>,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> fdo::Result<u32> {
        let client = header.sender().map(|sender| sender.as_str());
        let request = NotifyRequest::from_dbus(
            app_name,
            replaces_id,
            app_icon,
            summary,
            body,
            &actions,
            hints,
            expire_timeout,
            client,
        )
        .map_err(|err| {
            tracing::warn!("Rejected notification from {:?}: {}", app_name, err);
            invalid_args(err)
        })?;

        let (reply, id) = oneshot::channel();
        self.0
            .send(Input::Notify { request, reply })
            .await
            .map_err(|err| fdo::Error::Failed(format!("daemon is shutting down: {err}")))?;
        id.await
            .map_err(|err| fdo::Error::Failed(format!("notification was dropped: {err}")))
    }

    #[zbus(signal)]
    async fn action_invoked(
        signal_ctxt: &SignalEmitter<'_>,
        id: u32,
        action_key: &str,
    ) -> zbus::Result<()>;

    /// id	UINT32	The ID of the notification that was closed.
    /// reason	UINT32
    ///
    /// 1 - The notification expired.
    ///
    /// 2 - The notification was dismissed by the user.
    ///
    /// 3 - The notification was closed by a call to CloseNotification.
    ///
    /// 4 - Undefined/reserved reasons.
    #[zbus(signal)]
    async fn notification_closed(
        signal_ctxt: &SignalEmitter<'_>,
        id: u32,
        reason: u32,
    ) -> zbus::Result<()>;
}
