//! Concrete ID types used across the orchestrator.

use crate::id::define_id;

define_id!(OrchestrationId);
define_id!(WorkflowId);
define_id!(ProjectId);
