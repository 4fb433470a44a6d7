//! Stock application runtime.
//!
//! The JS engine that would interpret an application's bundle is a separate
//! component. The daemon ships a headless runtime that obeys the lifecycle
//! contract and logs what a real engine would render; embedders with an
//! engine replace it through the [`JsRuntimeFactory`] seam.

use ams_core::apphost::{AppSpec, JsRuntime, JsRuntimeFactory};
use tracing::{debug, info, trace};

/// Factory producing [`HeadlessRuntime`] instances.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessRuntimeFactory;

impl JsRuntimeFactory for HeadlessRuntimeFactory {
    fn launch(&self, spec: &AppSpec) -> Box<dyn JsRuntime> {
        info!(token = spec.token, bundle = %spec.element.bundle_name, src = %spec.src_path, "launching application runtime");
        Box::new(HeadlessRuntime {
            token: spec.token,
            bundle: spec.element.bundle_name.clone(),
        })
    }
}

/// Runtime that logs lifecycle calls instead of rendering.
#[derive(Debug)]
pub struct HeadlessRuntime {
    token: u16,
    bundle: String,
}

impl JsRuntime for HeadlessRuntime {
    fn show(&mut self) {
        info!(token = self.token, bundle = %self.bundle, "show");
    }

    fn hide(&mut self) {
        info!(token = self.token, bundle = %self.bundle, "hide");
    }

    fn handle_render_tick(&mut self) {
        trace!(token = self.token, "render tick");
    }

    fn back_pressed(&mut self) {
        debug!(token = self.token, "back pressed");
    }

    fn destroy(&mut self) {
        info!(token = self.token, bundle = %self.bundle, "destroy");
    }
}

#[cfg(test)]
mod tests {
    use ams_core::ElementName;

    use super::*;

    #[test]
    fn test_factory_builds_runtime_from_spec() {
        let spec = AppSpec {
            token: 9,
            element: ElementName::new("com.example.music", "Main"),
            src_path: "/apps/music".into(),
            data: None,
        };
        let mut runtime = HeadlessRuntimeFactory.launch(&spec);
        runtime.show();
        runtime.handle_render_tick();
        runtime.destroy();
    }
}
