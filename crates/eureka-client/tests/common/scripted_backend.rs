//! Backend that records every call and answers from a script

use async_trait::async_trait;
use eureka_client::{
    AppUpdate, Application, Error, Instance, QuitSignal, RegistryBackend, Result, UpdateStream,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A call the client made against the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(String),
    Deregister(String),
    Heartbeat(String),
    GetInstance(String, String),
    GetApplication(String),
    Subscribe {
        app: String,
        suppress_unchanged: bool,
    },
}

/// Scripted answer for one backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    NotFound,
    Status(u16),
    Transport,
}

impl Outcome {
    fn into_result(self, app: &str, id: &str) -> Result<()> {
        match self {
            Outcome::Ok => Ok(()),
            Outcome::NotFound => Err(Error::instance_not_found(app, id)),
            Outcome::Status(code) => Err(Error::Status {
                code,
                message: format!("scripted status {code}"),
            }),
            Outcome::Transport => Err(Error::Transport("connection refused".to_string())),
        }
    }
}

/// Scripted backend.
///
/// Each operation pops its next outcome from a queue. Empty queues answer
/// `Ok`, except the existence check which answers `NotFound`.
#[derive(Default)]
pub struct ScriptedBackend {
    calls: Mutex<Vec<Call>>,
    register: Mutex<VecDeque<Outcome>>,
    deregister: Mutex<VecDeque<Outcome>>,
    heartbeat: Mutex<VecDeque<Outcome>>,
    get_instance: Mutex<VecDeque<Outcome>>,
    application: Mutex<Option<Application>>,
    application_outcome: Mutex<Option<Outcome>>,
    subscriptions: Mutex<Vec<async_channel::Sender<AppUpdate>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_register(&self, outcomes: impl IntoIterator<Item = Outcome>) -> &Self {
        self.register.lock().unwrap().extend(outcomes);
        self
    }

    pub fn script_deregister(&self, outcomes: impl IntoIterator<Item = Outcome>) -> &Self {
        self.deregister.lock().unwrap().extend(outcomes);
        self
    }

    pub fn script_heartbeat(&self, outcomes: impl IntoIterator<Item = Outcome>) -> &Self {
        self.heartbeat.lock().unwrap().extend(outcomes);
        self
    }

    pub fn script_get_instance(&self, outcomes: impl IntoIterator<Item = Outcome>) -> &Self {
        self.get_instance.lock().unwrap().extend(outcomes);
        self
    }

    pub fn set_application(&self, application: Application) -> &Self {
        *self.application.lock().unwrap() = Some(application);
        self
    }

    pub fn fail_application(&self, outcome: Outcome) -> &Self {
        *self.application_outcome.lock().unwrap() = Some(outcome);
        self
    }

    /// Push an update to every open subscription
    pub fn push_update(&self, update: impl Fn() -> AppUpdate) {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        subscriptions.retain(|tx| tx.try_send(update()).is_ok());
    }

    /// Close every subscription from the producer side
    pub fn end_updates(&self) {
        self.subscriptions.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next(queue: &Mutex<VecDeque<Outcome>>, default: Outcome) -> Outcome {
        queue.lock().unwrap().pop_front().unwrap_or(default)
    }
}

#[async_trait]
impl RegistryBackend for ScriptedBackend {
    async fn register_instance(&self, instance: &Instance) -> Result<()> {
        self.record(Call::Register(instance.id().to_string()));
        Self::next(&self.register, Outcome::Ok).into_result(&instance.app, instance.id())
    }

    async fn deregister_instance(&self, instance: &Instance) -> Result<()> {
        self.record(Call::Deregister(instance.id().to_string()));
        Self::next(&self.deregister, Outcome::Ok).into_result(&instance.app, instance.id())
    }

    async fn heartbeat_instance(&self, instance: &Instance) -> Result<()> {
        self.record(Call::Heartbeat(instance.id().to_string()));
        Self::next(&self.heartbeat, Outcome::Ok).into_result(&instance.app, instance.id())
    }

    async fn get_instance(&self, app: &str, id: &str) -> Result<Instance> {
        self.record(Call::GetInstance(app.to_string(), id.to_string()));
        Self::next(&self.get_instance, Outcome::NotFound).into_result(app, id)?;
        Ok(Instance::new(app, id, "10.0.0.1", 8080).with_id(id))
    }

    async fn get_application(&self, app: &str) -> Result<Application> {
        self.record(Call::GetApplication(app.to_string()));
        match *self.application_outcome.lock().unwrap() {
            Some(Outcome::NotFound) => return Err(Error::app_not_found(app)),
            Some(outcome) => outcome.into_result(app, "")?,
            None => {}
        }
        self.application
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::app_not_found(app))
    }

    fn subscribe_application_updates(
        &self,
        app: &str,
        suppress_unchanged: bool,
        quit: QuitSignal,
    ) -> UpdateStream {
        self.record(Call::Subscribe {
            app: app.to_string(),
            suppress_unchanged,
        });
        let (tx, stream) = UpdateStream::channel(quit);
        self.subscriptions.lock().unwrap().push(tx);
        stream
    }
}
