//! Fixtures shared by the unit tests of this crate.
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use stepci_image::{ImageCommand, ImageCommandEntry, ImageError, ImageReference, ImageResolver, Platform};
use stepci_model::{ObjectMeta, Step, Task, TaskOrder, TaskSpec};

use crate::metrics::{ImageLookup, MetricsBackend};

/// Resolver answering from a fixed table and counting calls.
#[derive(Default)]
pub struct CountingResolver {
    images: HashMap<String, ImageCommand>,
    calls: AtomicUsize,
    /// Never answer; used to exercise cancellation.
    hang: bool,
}

impl CountingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, reference: &str, command: &[&str], args: &[&str]) -> Self {
        let key = ImageReference::parse(reference).unwrap().to_string();
        self.images.insert(
            key,
            ImageCommand {
                command: command.iter().map(|s| s.to_string()).collect(),
                args: args.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageResolver for CountingResolver {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn resolve(&self, reference: &ImageReference) -> Result<ImageCommandEntry, ImageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        match self.images.get(&reference.to_string()) {
            Some(command) => Ok(ImageCommandEntry::single(&Platform::default(), command.clone())),
            None => Err(ImageError::Registry {
                status: 404,
                url: reference.to_string(),
            }),
        }
    }
}

/// Metrics backend remembering every call.
#[derive(Default)]
pub struct RecordingMetrics {
    pub created: AtomicUsize,
    pub transitions: Mutex<Vec<(TaskOrder, TaskOrder)>>,
    pub lookups: Mutex<Vec<ImageLookup>>,
    pub errors: Mutex<Vec<String>>,
}

impl MetricsBackend for RecordingMetrics {
    fn record_unit_created(&self) {
        self.created.fetch_add(1, Ordering::SeqCst);
    }

    fn record_transition(&self, from: TaskOrder, to: TaskOrder) {
        self.transitions.lock().push((from, to));
    }

    fn record_image_lookup(&self, lookup: ImageLookup) {
        self.lookups.lock().push(lookup);
    }

    fn record_build_error(&self, error_kind: &str) {
        self.errors.lock().push(error_kind.to_string());
    }
}

pub fn task(name: &str, steps: Vec<Step>) -> Task {
    Task {
        api_version: "stepci.dev/v1".into(),
        kind: "Task".into(),
        metadata: ObjectMeta {
            name: name.into(),
            namespace: "ci".into(),
            uid: Some(Uuid::new_v4()),
            ..Default::default()
        },
        spec: TaskSpec { steps },
    }
}

pub fn explicit(image: &str, command: &[&str]) -> Step {
    Step::new(image).with_command(command.iter().copied())
}
