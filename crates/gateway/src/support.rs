//! Scripted capability fakes shared by the runner and supervisor tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use airgate_broker::{PublishError, Publisher};
use airgate_client::{AuthError, FetchError, SensorApi};
use airgate_core::{Destination, Device};
use async_trait::async_trait;

/// Scripted [`SensorApi`]: queued responses are consumed in order; once a
/// queue runs dry, authentication succeeds and fetches return an empty
/// device list so long-running loop tests stay quiet.
#[derive(Default)]
pub(crate) struct FakeApi {
    auth_queue: Mutex<VecDeque<Result<String, AuthError>>>,
    fetch_queue: Mutex<VecDeque<Result<Vec<Device>, FetchError>>>,
    auth_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    last_token: Mutex<Option<String>>,
}

impl FakeApi {
    pub fn push_auth(&self, response: Result<String, AuthError>) {
        self.auth_queue.lock().unwrap().push_back(response);
    }

    pub fn push_fetch(&self, response: Result<Vec<Device>, FetchError>) {
        self.fetch_queue.lock().unwrap().push_back(response);
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Token presented on the most recent fetch.
    pub fn last_token(&self) -> Option<String> {
        self.last_token.lock().unwrap().clone()
    }
}

#[async_trait]
impl SensorApi for FakeApi {
    async fn authenticate(&self, _email: &str, _password: &str) -> Result<String, AuthError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        self.auth_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("token-auto".to_owned()))
    }

    async fn fetch_devices(&self, token: &str) -> Result<Vec<Device>, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_token.lock().unwrap() = Some(token.to_owned());
        self.fetch_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Recording [`Publisher`]: successful deliveries are captured in order;
/// topics registered via [`fail_topic`](Self::fail_topic) fail instead.
#[derive(Default)]
pub(crate) struct RecordingPublisher {
    published: Mutex<Vec<(String, Destination)>>,
    fail_topics: Mutex<HashSet<String>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<(String, Destination)> {
        self.published.lock().unwrap().clone()
    }

    pub fn fail_topic(&self, topic: &str) {
        self.fail_topics.lock().unwrap().insert(topic.to_owned());
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, payload: &str, destination: &Destination) -> Result<(), PublishError> {
        if self.fail_topics.lock().unwrap().contains(&destination.topic) {
            return Err(PublishError::Connection("scripted failure".to_owned()));
        }
        self.published
            .lock()
            .unwrap()
            .push((payload.to_owned(), destination.clone()));
        Ok(())
    }
}
