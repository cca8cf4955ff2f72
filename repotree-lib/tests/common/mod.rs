//! Shared fixtures for tree tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use repotree_lib::api::RepoBackend;
use repotree_lib::error::ApiError;
use repotree_lib::error::Error;
use repotree_lib::model::AnalysisRecord;
use repotree_lib::model::Node;
use repotree_lib::model::RepoRef;
use repotree_lib::redirect::LoginRedirect;
use tokio::sync::Semaphore;

pub const LOGIN_URL: &str = "http://dash.test/api/auth/login";

/// A canned backend answer.
#[derive(Clone)]
pub enum Reply {
    Nodes(Vec<Node>),
    Text(String),
    Record(serde_json::Value),
    Status(u16),
}

/// A backend call, as recorded by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Get(String),
    Analyze(String),
}

/// In-process backend with canned replies, a call log and per-path gates.
#[derive(Default)]
pub struct FakeBackend {
    listings: HashMap<String, Reply>,
    files: HashMap<String, Reply>,
    analysis: Option<Reply>,
    calls: Mutex<Vec<Call>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(mut self, path: &str, reply: Reply) -> Self {
        self.listings.insert(path.to_string(), reply);
        self
    }

    pub fn file(mut self, path: &str, reply: Reply) -> Self {
        self.files.insert(path.to_string(), reply);
        self
    }

    pub fn analysis(mut self, reply: Reply) -> Self {
        self.analysis = Some(reply);
        self
    }

    /// Holds every request for `path` until permits are added to the gate.
    pub fn gate(&self, path: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self, path: &str) -> usize {
        self.count(&Call::List(path.to_string()))
    }

    pub fn get_calls(&self, path: &str) -> usize {
        self.count(&Call::Get(path.to_string()))
    }

    pub fn analyze_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Analyze(_)))
            .count()
    }

    fn count(&self, wanted: &Call) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    async fn pass_gate(&self, path: &str) {
        let gate = self.gates.lock().unwrap().get(path).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

fn github_error(status: u16) -> Error {
    if status == 401 {
        Error::NotAuthenticated {
            login_url: LOGIN_URL.to_string(),
        }
    } else {
        Error::Fetch(ApiError::http(status, "canned failure"))
    }
}

#[async_trait]
impl RepoBackend for FakeBackend {
    async fn list_files(&self, _repo: &RepoRef, path: &str) -> Result<Vec<Node>, Error> {
        self.calls.lock().unwrap().push(Call::List(path.to_string()));
        self.pass_gate(path).await;

        match self.listings.get(path) {
            Some(Reply::Nodes(nodes)) => Ok(nodes.clone()),
            Some(Reply::Status(status)) => Err(github_error(*status)),
            _ => Err(github_error(404)),
        }
    }

    async fn get_file(&self, _repo: &RepoRef, path: &str) -> Result<String, Error> {
        self.calls.lock().unwrap().push(Call::Get(path.to_string()));
        self.pass_gate(path).await;

        match self.files.get(path) {
            Some(Reply::Text(text)) => Ok(text.clone()),
            Some(Reply::Status(status)) => Err(github_error(*status)),
            _ => Err(github_error(404)),
        }
    }

    async fn analyze_file(&self, file_content: &str) -> Result<AnalysisRecord, Error> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Analyze(file_content.to_string()));

        match &self.analysis {
            Some(Reply::Record(value)) => Ok(AnalysisRecord(value.clone())),
            Some(Reply::Status(status)) => {
                Err(Error::Analysis(ApiError::http(*status, "canned failure")))
            }
            _ => Err(Error::Analysis(ApiError::http(404, "no analyzer"))),
        }
    }
}

/// A redirect hook that records every login URL it receives.
pub fn recording_redirect() -> (Arc<dyn LoginRedirect>, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let redirect: Arc<dyn LoginRedirect> =
        Arc::new(move |url: &str| sink.lock().unwrap().push(url.to_string()));
    (redirect, seen)
}

/// The `acme/widgets` repository used throughout the tests.
pub fn widgets() -> RepoRef {
    RepoRef::new("acme", "widgets")
}

/// Root listing with one visible directory and one hidden one.
pub fn widgets_root() -> Reply {
    Reply::Nodes(vec![Node::dir("src", "src"), Node::dir(".git", ".git")])
}
