use std::path::Path;

use crate::drivers::{FileDriver, WritePolicy};
use crate::template::{TemplateRenderer, TemplateValues};

/// Per-invocation deployment settings
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    pub overwrite: bool,
    /// Implies `overwrite`
    pub force: bool,
    /// Log intended actions without touching the target
    pub dryrun: bool,
    pub template_values: TemplateValues,
}

impl DeployOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_dryrun(mut self, dryrun: bool) -> Self {
        self.dryrun = dryrun;
        self
    }

    pub fn with_template_values(mut self, values: TemplateValues) -> Self {
        self.template_values = values;
        self
    }

    pub fn policy(&self) -> WritePolicy {
        WritePolicy::new(self.overwrite, self.force)
    }
}

/// Everything a traversal needs, fixed for the whole invocation.
///
/// The source driver never writes. The target driver carries the write
/// policy and is read-only in dry-run mode.
#[derive(Debug)]
pub struct DeployContext {
    source: FileDriver,
    target: FileDriver,
    options: DeployOptions,
    renderer: TemplateRenderer,
}

impl DeployContext {
    pub fn new(source: FileDriver, target: FileDriver, options: DeployOptions) -> Self {
        let target = target.with_policy(options.policy());
        let target = if options.dryrun {
            target.into_read_only()
        } else {
            target
        };

        Self {
            source: source.into_read_only(),
            target,
            options,
            renderer: TemplateRenderer::new(),
        }
    }

    pub fn source(&self) -> &FileDriver {
        &self.source
    }

    pub fn target(&self) -> &FileDriver {
        &self.target
    }

    pub fn options(&self) -> &DeployOptions {
        &self.options
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn template_values(&self) -> &TemplateValues {
        &self.options.template_values
    }

    pub fn source_root(&self) -> &Path {
        self.source.root()
    }

    pub fn target_root(&self) -> &Path {
        self.target.root()
    }
}
