//! # Mock Collection
//!
//! Utilities for testing the resolver and the action pipeline in isolation.
//!
//! Use [`MockCollection`] to queue the exact requests a component is expected to
//! send, or [`create_mock_collection`] to get a client and a receiver and answer
//! requests by hand with helpers like [`expect_find_one`].

use crate::collection::{CollectionError, CollectionRequest, Filter, ResourceClient};
use crate::model::Entity;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected request to the mock collection and the reply to send back.
#[derive(Debug)]
enum Expectation {
    FindOne {
        primary_key: String,
        response: Result<Entity, CollectionError>,
    },
    FindMatching {
        filter: Filter,
        response: Result<Vec<Entity>, CollectionError>,
    },
    Insert {
        response: Result<Entity, CollectionError>,
    },
    Update {
        response: Result<Entity, CollectionError>,
    },
    Destroy {
        primary_key: String,
        response: Result<Entity, CollectionError>,
    },
}

/// A mock collection with expectation tracking for fluent testing.
///
/// Requests are matched against the queued expectations in order. A request that
/// does not match the next expectation (wrong operation, primary key or filter)
/// panics the background task, which the caller observes as
/// [`CollectionError::ActorDropped`]; [`MockCollection::verify`] then reports the
/// unmet expectations.
///
/// # Example
/// ```ignore
/// let mut mock = MockCollection::new("programs");
/// mock.expect_find_matching(Filter::eq("slug", "tron")).return_ok(vec![tron]);
///
/// let client = mock.client();
/// // Use client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockCollection {
    client: ResourceClient,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockCollection {
    /// Creates a new mock collection with no expectations.
    pub fn new(name: impl Into<String>) -> Self {
        let (sender, mut receiver) = mpsc::channel::<CollectionRequest>(100);
        let expectations = Arc::new(Mutex::new(VecDeque::new()));
        let expectations_clone = expectations.clone();

        // Spawn background task to handle requests
        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let mut exps = expectations_clone.lock().unwrap();
                let expectation = exps.pop_front();
                drop(exps); // Release lock before replying

                match (request, expectation) {
                    (
                        CollectionRequest::FindOne { primary_key, respond_to },
                        Some(Expectation::FindOne { primary_key: expected, response }),
                    ) if primary_key == expected => {
                        let _ = respond_to.send(response);
                    }
                    (
                        CollectionRequest::FindMatching { filter, respond_to },
                        Some(Expectation::FindMatching { filter: expected, response }),
                    ) if filter == expected => {
                        let _ = respond_to.send(response);
                    }
                    (
                        CollectionRequest::Insert { respond_to, .. },
                        Some(Expectation::Insert { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        CollectionRequest::Update { respond_to, .. },
                        Some(Expectation::Update { response }),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        CollectionRequest::Destroy { primary_key, respond_to },
                        Some(Expectation::Destroy { primary_key: expected, response }),
                    ) if primary_key == expected => {
                        let _ = respond_to.send(response);
                    }
                    (request, expectation) => {
                        panic!(
                            "Unexpected request or expectation mismatch: \
                             {request:?} vs {expectation:?}"
                        );
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(name, sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient {
        self.client.clone()
    }

    /// Expects a `find_one` for `primary_key`.
    pub fn expect_find_one(
        &mut self,
        primary_key: impl Into<String>,
    ) -> ExpectationBuilder<Entity> {
        let primary_key = primary_key.into();
        ExpectationBuilder::new(self.expectations.clone(), move |response| {
            Expectation::FindOne { primary_key, response }
        })
    }

    /// Expects a `find_matching` with exactly `filter`.
    pub fn expect_find_matching(&mut self, filter: Filter) -> ExpectationBuilder<Vec<Entity>> {
        ExpectationBuilder::new(self.expectations.clone(), move |response| {
            Expectation::FindMatching { filter, response }
        })
    }

    /// Expects an `insert` of any entity.
    pub fn expect_insert(&mut self) -> ExpectationBuilder<Entity> {
        ExpectationBuilder::new(self.expectations.clone(), |response| {
            Expectation::Insert { response }
        })
    }

    /// Expects an `update` of any entity.
    pub fn expect_update(&mut self) -> ExpectationBuilder<Entity> {
        ExpectationBuilder::new(self.expectations.clone(), |response| {
            Expectation::Update { response }
        })
    }

    /// Expects a `destroy` of `primary_key`.
    pub fn expect_destroy(&mut self, primary_key: impl Into<String>) -> ExpectationBuilder<Entity> {
        let primary_key = primary_key.into();
        ExpectationBuilder::new(self.expectations.clone(), move |response| {
            Expectation::Destroy { primary_key, response }
        })
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

/// Builder that completes an expectation with its reply.
pub struct ExpectationBuilder<T> {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    build: Box<dyn FnOnce(Result<T, CollectionError>) -> Expectation + Send>,
}

impl<T> ExpectationBuilder<T> {
    fn new(
        expectations: Arc<Mutex<VecDeque<Expectation>>>,
        build: impl FnOnce(Result<T, CollectionError>) -> Expectation + Send + 'static,
    ) -> Self {
        Self {
            expectations,
            build: Box::new(build),
        }
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: CollectionError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T, CollectionError>) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back((self.build)(response));
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// Creates a collection client and the receiver its requests arrive on.
///
/// # Testing Strategy
/// Rather than spinning up a `ResourceActor`, the test holds the receiving end of
/// the channel and answers each request itself. This makes it easy to assert that
/// a component sent *exactly* the requests it should, e.g. that resolving a
/// primary key never issues a slug query.
pub fn create_mock_collection(
    name: impl Into<String>,
    buffer_size: usize,
) -> (ResourceClient, mpsc::Receiver<CollectionRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(name, sender), receiver)
}

/// Helper to verify that the next message is a FindOne request
pub async fn expect_find_one(
    receiver: &mut mpsc::Receiver<CollectionRequest>,
) -> Option<(String, oneshot::Sender<Result<Entity, CollectionError>>)> {
    match receiver.recv().await {
        Some(CollectionRequest::FindOne {
            primary_key,
            respond_to,
        }) => Some((primary_key, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a FindMatching request
pub async fn expect_find_matching(
    receiver: &mut mpsc::Receiver<CollectionRequest>,
) -> Option<(Filter, oneshot::Sender<Result<Vec<Entity>, CollectionError>>)> {
    match receiver.recv().await {
        Some(CollectionRequest::FindMatching { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Insert request
pub async fn expect_insert(
    receiver: &mut mpsc::Receiver<CollectionRequest>,
) -> Option<(Entity, oneshot::Sender<Result<Entity, CollectionError>>)> {
    match receiver.recv().await {
        Some(CollectionRequest::Insert { entity, respond_to }) => Some((entity, respond_to)),
        _ => None,
    }
}
