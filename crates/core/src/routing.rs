//! Service resolution: which backend sub-service runs a request.
//!
//! Precedence, first match wins:
//!
//! 1. a style reference image forces [`Service::StyleTransfer`];
//! 2. the workflow identifier, via [`WORKFLOW_SERVICES`];
//! 3. the declared mode, via [`MODE_SERVICES`];
//! 4. [`DEFAULT_SERVICE`].

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::request::{GenerationRequest, WorkflowMode};

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// Backend sub-services (edge functions) that run a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    SketchToFurnish,
    StyleTransfer,
    RenderEnhancer,
    ExteriorAi,
}

impl Service {
    /// Function name the backend exposes for this service.
    ///
    /// The style-transfer function is deployed as `styly-transfer`.
    pub fn function_name(self) -> &'static str {
        match self {
            Self::SketchToFurnish => "sketch-to-furnish",
            Self::StyleTransfer => "styly-transfer",
            Self::RenderEnhancer => "render-enhancer",
            Self::ExteriorAi => "exterior-ai",
        }
    }
}

/// Service used when no rule matches.
pub const DEFAULT_SERVICE: Service = Service::SketchToFurnish;

/// Sketch to Furnish deployment.
pub const WORKFLOW_SKETCH_TO_FURNISH: &str = "0294186c-79bf-47a6-9dee-d250fc046623";
/// Style Transfer (refurnishing) deployment.
pub const WORKFLOW_STYLE_TRANSFER: &str = "6fcda97d-c356-4233-b1e9-de42140cd57b";
/// Select & Modify (masking) deployment; runs on sketch-to-furnish with a mask.
pub const WORKFLOW_SELECT_MODIFY: &str = "f9b235f4-62c0-48e3-9c5a-7453429f3725";
/// Render Enhancer deployment.
pub const WORKFLOW_RENDER_ENHANCER: &str = "9a4dcc71-7d71-4067-8d18-6b9e08882135";

/// Workflow identifier -> service.
pub static WORKFLOW_SERVICES: LazyLock<HashMap<&'static str, Service>> = LazyLock::new(|| {
    HashMap::from([
        (WORKFLOW_SKETCH_TO_FURNISH, Service::SketchToFurnish),
        (WORKFLOW_STYLE_TRANSFER, Service::StyleTransfer),
        (WORKFLOW_SELECT_MODIFY, Service::SketchToFurnish),
        (WORKFLOW_RENDER_ENHANCER, Service::RenderEnhancer),
    ])
});

/// Declared mode -> default service.
pub static MODE_SERVICES: LazyLock<HashMap<WorkflowMode, Service>> = LazyLock::new(|| {
    HashMap::from([
        (WorkflowMode::Interior, Service::SketchToFurnish),
        (WorkflowMode::Exterior, Service::ExteriorAi),
        (WorkflowMode::Enhancement, Service::RenderEnhancer),
    ])
});

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Which rule of the precedence chain selected the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionRule {
    StyleImage,
    WorkflowId,
    Mode,
    Default,
}

/// Outcome of [`resolve_service`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub service: Service,
    pub rule: ResolutionRule,
}

/// Pick the backend service for `request`.
pub fn resolve_service(request: &GenerationRequest) -> Resolution {
    if request.style_image().is_some() {
        return Resolution {
            service: Service::StyleTransfer,
            rule: ResolutionRule::StyleImage,
        };
    }

    if let Some(&service) = WORKFLOW_SERVICES.get(request.workflow_id.trim()) {
        return Resolution {
            service,
            rule: ResolutionRule::WorkflowId,
        };
    }

    if let Some(service) = request.mode.and_then(|m| MODE_SERVICES.get(&m).copied()) {
        return Resolution {
            service,
            rule: ResolutionRule::Mode,
        };
    }

    Resolution {
        service: DEFAULT_SERVICE,
        rule: ResolutionRule::Default,
    }
}
