// ABOUTME: Session core for a chat widget that hands visitors from an AI assistant to a human agent.
// ABOUTME: State machine, message model, push supervision, polling fallback and the driver actor.

pub mod backoff;
pub mod cancel;
pub mod classifier;
pub mod config;
pub mod driver;
pub mod feedback;
pub mod message;
pub mod poller;
pub mod session;
pub mod sink;
pub mod state;
pub mod supervisor;
pub mod upload;

pub use backoff::{BackoffConfig, BackoffState};
pub use classifier::{LifecycleClassifier, LifecycleSignal, PhraseClassifier};
pub use config::{Config, Presentation};
pub use driver::{DriverSettings, Intent, SessionDriver, WidgetError, WidgetHandle};
pub use feedback::{Feedback, FeedbackError, Rating};
pub use message::{Attachment, MediaClass, Message, MessageSource};
pub use session::{CoreSettings, Effect, Outcome, PollReport, SessionCore, Snapshot};
pub use sink::{Activity, ConnectionIndicator, PresentationSink, SinkEvent};
pub use state::{Session, SessionState};
pub use upload::UploadRejected;

// Re-export transport types the core's API exposes
pub use handoff_transport::{ChatService, FileUpload, PushConnector, PushEvent, SessionId};
