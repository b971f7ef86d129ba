//! Scene registration
//!
//! Scenes are registered once during startup and are immutable afterwards;
//! registering after launch is a configuration error, never a silent no-op.

use bot_core::Command;

use crate::error::{EngineError, Result};
use crate::types::Scene;

#[derive(Default)]
pub struct SceneRegistry {
    scenes: Vec<Scene>,
    launched: bool,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scene, validating its shape.
    pub fn add_scene(&mut self, scene: Scene) -> Result<()> {
        if self.launched {
            return Err(EngineError::Config(
                "scenes cannot be registered after launch".into(),
            ));
        }
        if self.scenes.iter().any(|existing| existing.name == scene.name) {
            return Err(EngineError::Config(format!(
                "scene with name \"{}\" already exists",
                scene.name
            )));
        }
        if scene.steps.is_empty() {
            return Err(EngineError::Config(format!(
                "scene \"{}\" has no steps",
                scene.name
            )));
        }
        for (index, step) in scene.steps.iter().enumerate() {
            if step.name.is_empty() {
                return Err(EngineError::Config(format!(
                    "step at index {index} in scene \"{}\" has no name",
                    scene.name
                )));
            }
            if scene.steps[..index].iter().any(|other| other.name == step.name) {
                return Err(EngineError::Config(format!(
                    "step \"{}\" is duplicated in scene \"{}\"",
                    step.name, scene.name
                )));
            }
        }

        self.scenes.push(scene);
        Ok(())
    }

    /// Seal the registry; called by the dispatcher when it takes ownership.
    pub fn launch(&mut self) {
        self.launched = true;
    }

    pub fn is_launched(&self) -> bool {
        self.launched
    }

    pub fn get(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.name == name)
    }

    /// Scenes in registration order (entry priority).
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Flat command list for the transport-level command menu.
    pub fn commands(&self) -> Vec<Command> {
        self.scenes
            .iter()
            .filter_map(|scene| scene.command.clone())
            .collect()
    }
}
