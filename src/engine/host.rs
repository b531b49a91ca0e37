//! engine::host
//!
//! The configuration-backed engine.
//!
//! [`SchematicEngine`] takes its context flags from [`Config`] and runs
//! options through an ordered transform pipeline. The default pipeline is
//! [`ObjectOptions`], then [`ConfigDefaults`], then [`SchemaOptions`]; custom
//! transforms are appended after them.

use std::sync::Arc;

use async_trait::async_trait;

use super::options::{run_transforms, ConfigDefaults, ObjectOptions, OptionTransform, SchemaOptions};
use super::{Engine, EngineError, Options, PartialContext, SchematicContext};
use crate::core::config::Config;
use crate::schematic::Schematic;

/// Engine backed by loaded configuration.
#[derive(Clone)]
pub struct SchematicEngine {
    config: Config,
    transforms: Vec<Arc<dyn OptionTransform>>,
}

impl SchematicEngine {
    /// Create an engine with the default transform pipeline.
    pub fn new(config: Config) -> Self {
        let transforms: Vec<Arc<dyn OptionTransform>> = vec![
            Arc::new(ObjectOptions),
            Arc::new(ConfigDefaults::new(config.clone())),
            Arc::new(SchemaOptions),
        ];
        Self { config, transforms }
    }

    /// Append a transform to the pipeline.
    pub fn with_transform(mut self, transform: impl OptionTransform + 'static) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Names of the transforms, in the order they run.
    pub fn transforms(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl Default for SchematicEngine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl std::fmt::Debug for SchematicEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchematicEngine")
            .field("config", &self.config)
            .field("transforms", &self.transforms())
            .finish()
    }
}

#[async_trait]
impl Engine for SchematicEngine {
    fn name(&self) -> &'static str {
        "schematic"
    }

    fn create_context(
        &self,
        schematic: &Schematic,
        parent: Option<PartialContext>,
    ) -> SchematicContext {
        SchematicContext::new(
            schematic.clone(),
            parent,
            self.config.debug(),
            self.config.interactive(),
        )
    }

    async fn transform_options(
        &self,
        schematic: &Schematic,
        options: Options,
    ) -> Result<Options, EngineError> {
        run_transforms(&self.transforms, schematic.description(), options).await
    }
}
