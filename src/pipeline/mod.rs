/*!
 * Captioning pipeline.
 *
 * - `state`: lifecycle states and status snapshots
 * - `progress`: progress weighting and events
 * - `context`: per-media settings and outputs
 * - `compose`: building documents from collaborator output
 * - `orchestrator`: the state machine driving the collaborators
 */

pub mod compose;
pub mod context;
pub mod orchestrator;
pub mod progress;
pub mod state;

pub use context::{Artifacts, PipelineConfig, PipelineContext};
pub use orchestrator::{Collaborators, Orchestrator, RunOutcome};
pub use progress::{ProgressEvent, ProgressTracker};
pub use state::{PipelineState, PipelineStatus};
