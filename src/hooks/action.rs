//! Mutating actions with observable loading/error/success state.

use crate::api::RemoteApi;
use crate::error::{Error, Result};
use crate::models::{Exam, ExamPatch, NewExam};
use crate::service::DashboardService;
use std::future::Future;
use tokio::sync::watch;

/// Outcome of the most recent action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionState {
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
}

type SuccessHandler = Box<dyn Fn() + Send + Sync>;
type ErrorHandler = Box<dyn Fn(&Error) + Send + Sync>;

/// Runs actions one after another and records how the last one went.
///
/// Errors are stored as display strings *and* returned to the caller; the
/// tracker never swallows them.
///
/// ```
/// use exam_dashboard_kit::hooks::ActionTracker;
/// use exam_dashboard_kit::Error;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let tracker = ActionTracker::new().on_error(|e| eprintln!("action failed: {}", e));
///
/// let result: exam_dashboard_kit::Result<()> =
///     tracker.run(async { Err(Error::Other("boom".into())) }).await;
///
/// assert!(result.is_err());
/// assert_eq!(tracker.state().error.as_deref(), Some("Error: boom"));
/// # }
/// ```
pub struct ActionTracker {
    state: watch::Sender<ActionState>,
    on_success: Option<SuccessHandler>,
    on_error: Option<ErrorHandler>,
}

impl Default for ActionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ActionState::default());
        ActionTracker {
            state,
            on_success: None,
            on_error: None,
        }
    }

    /// Called after every successful action.
    pub fn on_success(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(handler));
        self
    }

    /// Called with the error of every failed action, before it is returned.
    pub fn on_error(mut self, handler: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    pub fn state(&self) -> ActionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ActionState> {
        self.state.subscribe()
    }

    /// Await `action`, recording its outcome. The result is passed through.
    pub async fn run<T, Fut>(&self, action: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.state.send_replace(ActionState {
            loading: true,
            error: None,
            success: false,
        });

        match action.await {
            Ok(value) => {
                self.state.send_replace(ActionState {
                    loading: false,
                    error: None,
                    success: true,
                });
                if let Some(handler) = &self.on_success {
                    handler();
                }
                Ok(value)
            }
            Err(e) => {
                warn!("Action failed: {}", e);
                self.state.send_replace(ActionState {
                    loading: false,
                    error: Some(e.to_string()),
                    success: false,
                });
                if let Some(handler) = &self.on_error {
                    handler(&e);
                }
                Err(e)
            }
        }
    }

    /// Back to idle: not loading, no error, no success.
    pub fn reset(&self) {
        self.state.send_replace(ActionState::default());
    }
}

/// Exam mutations of a [`DashboardService`] behind one [`ActionTracker`].
pub struct ExamActions<A: RemoteApi> {
    service: DashboardService<A>,
    tracker: ActionTracker,
}

impl<A: RemoteApi> ExamActions<A> {
    pub fn new(service: DashboardService<A>) -> Self {
        Self::with_tracker(service, ActionTracker::new())
    }

    /// Use a tracker with handlers already attached.
    pub fn with_tracker(service: DashboardService<A>, tracker: ActionTracker) -> Self {
        ExamActions { service, tracker }
    }

    pub async fn create_exam(&self, exam: &NewExam) -> Result<Exam> {
        self.tracker.run(self.service.create_exam(exam)).await
    }

    pub async fn update_exam(&self, exam_id: &str, patch: &ExamPatch) -> Result<Exam> {
        self.tracker.run(self.service.update_exam(exam_id, patch)).await
    }

    pub async fn delete_exam(&self, exam_id: &str) -> Result<()> {
        self.tracker.run(self.service.delete_exam(exam_id)).await
    }

    pub async fn publish_exam(&self, exam_id: &str) -> Result<Exam> {
        self.tracker.run(self.service.publish_exam(exam_id)).await
    }

    pub fn state(&self) -> ActionState {
        self.tracker.state()
    }

    pub fn reset(&self) {
        self.tracker.reset();
    }

    pub fn tracker(&self) -> &ActionTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{InMemoryApi, Method};
    use crate::config::ClientConfig;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_success_sets_state_and_calls_handler() {
        let successes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&successes);
        let tracker = ActionTracker::new().on_success(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let value = tracker.run(async { Ok(42) }).await.expect("Failed to run");
        assert_eq!(value, 42);
        assert_eq!(
            tracker.state(),
            ActionState {
                loading: false,
                error: None,
                success: true,
            }
        );
        assert_eq!(successes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_recorded_and_reraised() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let tracker = ActionTracker::new().on_error(move |e| {
            sink.lock().expect("Failed to lock errors").push(e.status());
        });

        let result: Result<()> = tracker
            .run(async {
                Err(Error::Http {
                    status: 422,
                    body: "title is required".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(Error::Http { status: 422, .. })));
        let state = tracker.state();
        assert!(!state.loading);
        assert!(!state.success);
        assert_eq!(
            state.error.as_deref(),
            Some("HTTP error: status 422: title is required")
        );
        assert_eq!(*seen.lock().expect("Failed to lock errors"), vec![Some(422)]);
    }

    #[tokio::test]
    async fn test_new_action_clears_previous_error() {
        let tracker = ActionTracker::new();
        let mut updates = tracker.subscribe();

        let _ = tracker
            .run(async { Err::<(), _>(Error::Other("first".to_string())) })
            .await;
        assert!(updates.has_changed().expect("tracker alive"));
        updates.mark_unchanged();

        tracker.run(async { Ok(()) }).await.expect("Failed to run");
        assert!(updates.has_changed().expect("tracker alive"));
        assert_eq!(tracker.state().error, None);

        tracker.reset();
        assert_eq!(tracker.state(), ActionState::default());
    }

    #[tokio::test]
    async fn test_exam_actions_track_service_calls() {
        let api = InMemoryApi::new();
        api.respond(Method::PATCH, "exams/e1/publish", json!({"id": "e1", "status": "published"}))
            .fail(Method::DELETE, "exams/e1", 500);
        let service = DashboardService::new(api.clone(), &ClientConfig::default());
        let actions = ExamActions::new(service);

        let exam = actions.publish_exam("e1").await.expect("Failed to publish");
        assert_eq!(exam.id, "e1");
        assert!(actions.state().success);

        assert!(actions.delete_exam("e1").await.is_err());
        assert!(!actions.state().success);
        assert!(actions.state().error.is_some());

        actions.reset();
        assert_eq!(actions.tracker().state(), ActionState::default());
    }
}
