// esp/client.rs

use std::{
    ffi::{c_char, c_void, CString},
    ptr,
    sync::mpsc::{channel, Receiver, Sender, TryRecvError},
};

use anyhow::{anyhow, bail};
use esp_idf_sys::{self as sys, esp};
use log::*;
use tokio::time::Duration;

use crate::*;

const MQTT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MQTT_ACK_TIMEOUT: Duration = Duration::from_secs(5);
const MQTT_EVENT_POLL: Duration = Duration::from_millis(50);
const MQTT_KEEPALIVE_S: i32 = 25;

#[derive(Debug)]
enum MqttEvent {
    Connected,
    Disconnected,
    Published(i32),
    Failed(ConnectFailure),
}

// Runs on the esp-mqtt task. The event goes through a channel because the
// error handle (and its CONNACK code) is only valid during the callback.
unsafe extern "C" fn on_mqtt_event(
    arg: *mut c_void,
    _base: sys::esp_event_base_t,
    event_id: i32,
    data: *mut c_void,
) {
    if arg.is_null() || data.is_null() {
        return;
    }
    let tx = &*(arg as *const Sender<MqttEvent>);
    let event = &*(data as *const sys::esp_mqtt_event_t);

    let ev = if event_id == sys::esp_mqtt_event_id_t_MQTT_EVENT_CONNECTED as i32 {
        MqttEvent::Connected
    } else if event_id == sys::esp_mqtt_event_id_t_MQTT_EVENT_DISCONNECTED as i32 {
        MqttEvent::Disconnected
    } else if event_id == sys::esp_mqtt_event_id_t_MQTT_EVENT_PUBLISHED as i32 {
        MqttEvent::Published(event.msg_id)
    } else if event_id == sys::esp_mqtt_event_id_t_MQTT_EVENT_ERROR as i32 {
        let failure = match event.error_handle.as_ref() {
            Some(err) => ConnectFailure::from_connack(
                err.error_type as u32
                    == sys::esp_mqtt_error_type_t_MQTT_ERROR_TYPE_CONNECTION_REFUSED as u32,
                err.connect_return_code as u32,
            ),
            None => ConnectFailure::Transport,
        };
        MqttEvent::Failed(failure)
    } else {
        return;
    };
    tx.send(ev).ok();
}

struct Session {
    handle: sys::esp_mqtt_client_handle_t,
    // handed to the C side as the handler argument, must outlive `handle`
    _tx: Box<Sender<MqttEvent>>,
    rx: Receiver<MqttEvent>,
}

impl Session {
    fn open(settings: &BrokerSettings) -> anyhow::Result<Self> {
        let uri = CString::new(settings.url())?;
        let client_id = CString::new(settings.client_id.as_str())?;
        let username = CString::new(settings.username.as_str())?;
        let password = CString::new(settings.password.as_str())?;
        let opt = |s: &CString| -> *const c_char {
            if s.as_bytes().is_empty() {
                ptr::null()
            } else {
                s.as_ptr()
            }
        };

        let mut conf = sys::esp_mqtt_client_config_t::default();
        conf.broker.address.uri = uri.as_ptr();
        conf.credentials.client_id = client_id.as_ptr();
        conf.credentials.username = opt(&username);
        conf.credentials.authentication.password = opt(&password);
        conf.session.keepalive = MQTT_KEEPALIVE_S;
        // one attempt per wake
        conf.network.disable_auto_reconnect = true;

        // init copies the strings, the CStrings may go after this
        let handle = unsafe { sys::esp_mqtt_client_init(&conf) };
        if handle.is_null() {
            bail!("esp_mqtt_client_init failed");
        }

        let (tx, rx) = channel();
        let tx = Box::new(tx);
        let session = Session { handle, _tx: tx, rx };
        let arg = &*session._tx as *const Sender<MqttEvent> as *mut c_void;
        esp!(unsafe {
            sys::esp_mqtt_client_register_event(
                handle,
                sys::esp_mqtt_event_id_t_MQTT_EVENT_ANY,
                Some(on_mqtt_event),
                arg,
            )
        })?;
        esp!(unsafe { sys::esp_mqtt_client_start(handle) })?;
        Ok(session)
    }

    async fn wait_connack(&mut self) -> Result<(), ConnectFailure> {
        let rx = &self.rx;
        let answer = poll_until(
            MQTT_EVENT_POLL,
            WaitLimit::Deadline(MQTT_CONNECT_TIMEOUT),
            || match rx.try_recv() {
                Ok(MqttEvent::Connected) => Some(Ok(())),
                Ok(MqttEvent::Failed(f)) => Some(Err(f)),
                Ok(MqttEvent::Disconnected) => Some(Err(ConnectFailure::Transport)),
                Ok(MqttEvent::Published(_)) => None,
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(ConnectFailure::Transport)),
            },
        )
        .await;
        answer.unwrap_or(Err(ConnectFailure::NoAnswer))
    }

    async fn wait_ack(&mut self, msg_id: i32) -> anyhow::Result<()> {
        let rx = &self.rx;
        let acked = poll_until(MQTT_EVENT_POLL, WaitLimit::Deadline(MQTT_ACK_TIMEOUT), || {
            match rx.try_recv() {
                Ok(MqttEvent::Published(id)) if id == msg_id => Some(true),
                Ok(MqttEvent::Disconnected) | Err(TryRecvError::Disconnected) => Some(false),
                _ => None,
            }
        })
        .await;
        match acked {
            Ok(true) => Ok(()),
            Ok(false) => bail!("MQTT connection closed before message {msg_id} was acknowledged"),
            Err(e) => bail!("MQTT message {msg_id} not acknowledged: {e}"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // stops the task first, so no callback can see a dropped sender
        unsafe {
            sys::esp_mqtt_client_destroy(self.handle);
        }
    }
}

#[derive(Default)]
pub struct EspBroker {
    session: Option<Session>,
}

impl EspBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Broker for EspBroker {
    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn connect(&mut self, settings: &BrokerSettings) -> anyhow::Result<()> {
        let mut session = Session::open(settings)?;
        match session.wait_connack().await {
            Ok(()) => {
                self.session = Some(session);
                Ok(())
            }
            Err(f) => {
                info!("MQTT connect failure: {f:?}");
                bail!(BrokerRefused::from(f))
            }
        }
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> anyhow::Result<()> {
        let Some(session) = self.session.as_mut() else {
            bail!(NotConnected);
        };
        let topic = CString::new(topic)?;
        let len = i32::try_from(payload.len()).map_err(|_| anyhow!("MQTT payload too long"))?;

        let msg_id = unsafe {
            sys::esp_mqtt_client_publish(
                session.handle,
                topic.as_ptr(),
                payload.as_ptr() as *const c_char,
                len,
                1,
                0,
            )
        };
        if msg_id < 0 {
            bail!("MQTT publish rejected by client ({msg_id})");
        }
        session.wait_ack(msg_id).await
    }

    fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            unsafe {
                sys::esp_mqtt_client_disconnect(session.handle);
            }
            info!("MQTT disconnected.");
        }
    }
}

// EOF
