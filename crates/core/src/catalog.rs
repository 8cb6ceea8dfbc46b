//! Catalog of user-selectable generation options.
//!
//! Each option pins a workflow (deployment) identifier, a design mode, a
//! credit cost, and a version tag.

use crate::request::{GenerationRequest, WorkflowMode};
use crate::routing::{WORKFLOW_RENDER_ENHANCER, WORKFLOW_SELECT_MODIFY, WORKFLOW_SKETCH_TO_FURNISH};

/// A generation option offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOption {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub workflow_id: &'static str,
    pub mode: WorkflowMode,
    /// Credits consumed per generation.
    pub credits: u32,
    /// Whether the option is currently offered.
    pub active: bool,
    /// Catalog revision shown to users; never sent with the job.
    pub version: &'static str,
}

impl GenerationOption {
    /// Start a request for this option on `input_image`.
    ///
    /// The request keeps the default wire version.
    pub fn request(&self, input_image: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(self.workflow_id, input_image).with_mode(self.mode)
    }
}

pub const GENERATION_OPTIONS: &[GenerationOption] = &[
    GenerationOption {
        id: "sketch-to-furnish",
        name: "Sketch to Furnish",
        description: "Transform rough sketches into fully furnished interior designs",
        workflow_id: WORKFLOW_SKETCH_TO_FURNISH,
        mode: WorkflowMode::Interior,
        credits: 5,
        active: false,
        version: "v1",
    },
    GenerationOption {
        id: "style-transfer",
        name: "Style Transfer",
        description: "Apply different architectural styles to your existing designs",
        workflow_id: WORKFLOW_SELECT_MODIFY,
        mode: WorkflowMode::Interior,
        credits: 5,
        active: true,
        version: "v1",
    },
    GenerationOption {
        id: "select-modify",
        name: "Select and Modify",
        description: "Select specific areas and modify them with AI precision",
        workflow_id: WORKFLOW_SELECT_MODIFY,
        mode: WorkflowMode::Interior,
        credits: 5,
        active: true,
        version: "v1",
    },
    GenerationOption {
        id: "exterior-ai",
        name: "Exterior AI",
        description: "Generate stunning exterior architectural visualizations",
        workflow_id: WORKFLOW_SKETCH_TO_FURNISH,
        mode: WorkflowMode::Interior,
        credits: 5,
        active: true,
        version: "v1",
    },
    GenerationOption {
        id: "render-enhancer",
        name: "Render Enhancer",
        description: "Enhance existing renders with improved lighting and details",
        workflow_id: WORKFLOW_RENDER_ENHANCER,
        mode: WorkflowMode::Enhancement,
        credits: 5,
        active: true,
        version: "v1",
    },
];

/// Look up an option by its id.
pub fn find_option(id: &str) -> Option<&'static GenerationOption> {
    GENERATION_OPTIONS.iter().find(|opt| opt.id == id.trim())
}

/// Options currently offered to users.
pub fn active_options() -> impl Iterator<Item = &'static GenerationOption> {
    GENERATION_OPTIONS.iter().filter(|opt| opt.active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::DEFAULT_VERSION;
    use crate::routing::{resolve_service, Service};

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<_> = GENERATION_OPTIONS.iter().map(|o| o.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), GENERATION_OPTIONS.len());
    }

    #[test]
    fn find_by_id() {
        let opt = find_option("render-enhancer").unwrap();
        assert_eq!(opt.mode, WorkflowMode::Enhancement);
        assert!(find_option("nope").is_none());
    }

    #[test]
    fn inactive_options_are_hidden() {
        assert!(active_options().all(|o| o.id != "sketch-to-furnish"));
        assert_eq!(active_options().count(), 4);
    }

    #[test]
    fn option_request_routes_through_workflow_table() {
        let req = find_option("render-enhancer").unwrap().request("https://img/in.png");
        assert_eq!(req.version, DEFAULT_VERSION);
        assert_eq!(req.to_payload().version, "1.0");
        assert_eq!(resolve_service(&req).service, Service::RenderEnhancer);
    }
}
