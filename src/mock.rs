// mock.rs

use std::{cell::RefCell, collections::VecDeque, net::Ipv4Addr, rc::Rc, time::Duration};

use anyhow::bail;

use crate::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    ProbeCount,
    ProbeResolution,
    ProbeRead,
    EnvBegin,
    EnvMeasure,
    NetBegin,
    NetPoll,
    NetShutdown,
    BrokerConnect,
    BrokerPublish,
    BrokerDisconnect,
    Sleep,
}

pub struct Journal {
    pub events: Vec<Event>,

    pub probe_count: usize,
    pub probe_resolution: Option<u8>,
    pub probe_raw: VecDeque<f32>,
    pub probe_fallback: f32,

    pub env_present: bool,
    pub env_samples: VecDeque<EnvSample>,
    pub env_fallback: EnvSample,

    pub net_begin_ok: bool,
    /// Poll number on which the station reports association, `None` for never.
    pub net_associate_on: Option<u32>,
    pub net_polls: u32,

    pub broker_connected: bool,
    /// CONNACK code the broker answers with.
    pub broker_refuse: Option<u8>,
    pub broker_publish_ok: bool,
    pub published: Vec<(String, String)>,

    pub slept: Vec<Duration>,
}

impl Default for Journal {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            probe_count: 1,
            probe_resolution: None,
            probe_raw: VecDeque::new(),
            probe_fallback: 22.0,
            env_present: true,
            env_samples: VecDeque::new(),
            env_fallback: EnvSample {
                temperature_c: 21.5,
                pressure_pa: 101_325.0,
                humidity_pct: 45.0,
            },
            net_begin_ok: true,
            net_associate_on: Some(1),
            net_polls: 0,
            broker_connected: false,
            broker_refuse: None,
            broker_publish_ok: true,
            published: Vec::new(),
            slept: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct Rig(Rc<RefCell<Journal>>);

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, f: impl FnOnce(&mut Journal)) {
        f(&mut self.0.borrow_mut())
    }

    pub fn get<T>(&self, f: impl FnOnce(&Journal) -> T) -> T {
        f(&self.0.borrow())
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    pub fn count(&self, ev: Event) -> usize {
        self.0.borrow().events.iter().filter(|e| **e == ev).count()
    }

    fn log(&self, ev: Event) {
        self.0.borrow_mut().events.push(ev);
    }

    pub fn probe(&self) -> MockProbe {
        MockProbe(self.clone())
    }
    pub fn env(&self) -> MockEnv {
        MockEnv(self.clone())
    }
    pub fn network(&self) -> MockNetwork {
        MockNetwork(self.clone())
    }
    pub fn broker(&self) -> MockBroker {
        MockBroker(self.clone())
    }
    pub fn sleeper(&self) -> MockSleep {
        MockSleep(self.clone())
    }
}

pub struct MockProbe(Rig);

impl ProbeSensor for MockProbe {
    fn device_count(&mut self) -> anyhow::Result<usize> {
        self.0.log(Event::ProbeCount);
        Ok(self.0.get(|j| j.probe_count))
    }

    fn set_resolution(&mut self, bits: u8) -> anyhow::Result<()> {
        self.0.log(Event::ProbeResolution);
        self.0.set(|j| j.probe_resolution = Some(bits));
        Ok(())
    }

    fn read_temperature(&mut self) -> f32 {
        self.0.log(Event::ProbeRead);
        let mut j = self.0 .0.borrow_mut();
        let fallback = j.probe_fallback;
        j.probe_raw.pop_front().unwrap_or(fallback)
    }
}

pub struct MockEnv(Rig);

impl EnvSensor for MockEnv {
    fn begin(&mut self) -> anyhow::Result<()> {
        self.0.log(Event::EnvBegin);
        if !self.0.get(|j| j.env_present) {
            bail!("no ack at 0x76");
        }
        Ok(())
    }

    fn measure(&mut self) -> EnvSample {
        self.0.log(Event::EnvMeasure);
        let mut j = self.0 .0.borrow_mut();
        let fallback = j.env_fallback;
        j.env_samples.pop_front().unwrap_or(fallback)
    }
}

pub struct MockNetwork(Rig);

impl Network for MockNetwork {
    async fn begin(&mut self, _ssid: &str, _password: &str) -> anyhow::Result<()> {
        self.0.log(Event::NetBegin);
        if !self.0.get(|j| j.net_begin_ok) {
            bail!("radio would not start");
        }
        Ok(())
    }

    fn is_associated(&mut self) -> bool {
        self.0.log(Event::NetPoll);
        let mut j = self.0 .0.borrow_mut();
        j.net_polls += 1;
        j.net_associate_on.is_some_and(|n| j.net_polls >= n)
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(192, 168, 1, 42))
    }

    async fn shutdown(&mut self) {
        self.0.log(Event::NetShutdown);
    }
}

pub struct MockBroker(Rig);

impl Broker for MockBroker {
    fn is_connected(&self) -> bool {
        self.0.get(|j| j.broker_connected)
    }

    async fn connect(&mut self, _settings: &BrokerSettings) -> anyhow::Result<()> {
        self.0.log(Event::BrokerConnect);
        if let Some(rc) = self.0.get(|j| j.broker_refuse) {
            bail!(BrokerRefused::from(ConnectFailure::from_connack(true, rc.into())));
        }
        self.0.set(|j| j.broker_connected = true);
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> anyhow::Result<()> {
        self.0.log(Event::BrokerPublish);
        if !self.0.get(|j| j.broker_publish_ok) {
            bail!("publish not acknowledged");
        }
        let body = String::from_utf8_lossy(payload).into_owned();
        self.0.set(|j| j.published.push((topic.to_string(), body)));
        Ok(())
    }

    fn disconnect(&mut self) {
        self.0.log(Event::BrokerDisconnect);
        self.0.set(|j| j.broker_connected = false);
    }
}

pub struct MockSleep(Rig);

impl DeepSleep for MockSleep {
    fn sleep_for(&mut self, duration: Duration) {
        self.0.log(Event::Sleep);
        self.0.set(|j| j.slept.push(duration));
    }
}

// EOF
