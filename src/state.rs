// state.rs

use std::{error, fmt};

use crate::Reading;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    SerialUp,
    InitProbe,
    InitEnv,
    WarmUp,
    NetworkJoin,
    BrokerConnect,
    Publish,
    Shutdown,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::SerialUp => "serial",
            Stage::InitProbe => "probe init",
            Stage::InitEnv => "environmental sensor init",
            Stage::WarmUp => "measurement",
            Stage::NetworkJoin => "WiFi join",
            Stage::BrokerConnect => "MQTT connect",
            Stage::Publish => "MQTT publish",
            Stage::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}

/// The first failure of a run, and where it happened.
#[derive(Debug)]
pub struct StageError {
    pub stage: Stage,
    pub source: anyhow::Error,
}

impl StageError {
    pub fn new(stage: Stage, source: anyhow::Error) -> Self {
        Self { stage, source }
    }

    pub fn is_init(&self) -> bool {
        matches!(self.stage, Stage::InitProbe | Stage::InitEnv)
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {:#}", self.stage, self.source)
    }
}

impl error::Error for StageError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&*self.source)
    }
}

pub trait StageResultExt<T> {
    fn at(self, stage: Stage) -> Result<T, StageError>;
}

impl<T> StageResultExt<T> for anyhow::Result<T> {
    fn at(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|e| StageError::new(stage, e))
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Published(Reading),
    /// Everything up to the broker worked but the message did not go out.
    NotPublished(Reading, anyhow::Error),
    Failed(StageError),
}

impl RunOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed(_))
    }

    pub fn reading(&self) -> Option<&Reading> {
        match self {
            RunOutcome::Published(r) | RunOutcome::NotPublished(r, _) => Some(r),
            RunOutcome::Failed(_) => None,
        }
    }
}

// EOF
