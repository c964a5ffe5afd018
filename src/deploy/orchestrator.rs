//! Recursive traversal of the source tree onto the target

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, trace, warn};

use super::classify::{classify_path, template_output_path, FileClass};
use super::error::{DeployError, Result};
use super::options::{DeployContext, DeployOptions};
use crate::descriptor::TreeDescriptor;
use crate::drivers::{DriverRegistry, DriverRequest, FileDriver};
use crate::types::PathType;

/// What a deployment did (or would have done, in dry-run mode)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeploySummary {
    pub directories_visited: usize,
    pub files_copied: usize,
    pub templates_rendered: usize,
    pub descriptors_applied: usize,
    pub entries_skipped: usize,
    pub dryrun: bool,
}

impl fmt::Display for DeploySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} directories, {} files copied, {} templates rendered, {} tree descriptors applied, {} entries skipped",
            self.directories_visited,
            self.files_copied,
            self.templates_rendered,
            self.descriptors_applied,
            self.entries_skipped
        )?;
        if self.dryrun {
            write!(f, " (dry run, nothing written)")?;
        }
        Ok(())
    }
}

/// Deploy the tree at `source.root()` onto `target.root()`
pub async fn treeploy(
    source: FileDriver,
    target: FileDriver,
    options: DeployOptions,
) -> Result<DeploySummary> {
    let ctx = DeployContext::new(source, target, options);
    run(&ctx).await
}

/// Resolve both paths through `registry`, then deploy.
///
/// The source driver is always created read-only; the target driver is
/// writable unless `options.dryrun` is set.
pub async fn treeploy_paths(
    registry: &DriverRegistry,
    source: &str,
    target: &str,
    options: DeployOptions,
    source_options: Map<String, Value>,
    target_options: Map<String, Value>,
) -> Result<DeploySummary> {
    let source_driver = registry
        .create(DriverRequest::new(source).with_options(source_options))
        .await?;
    let target_driver = registry
        .create(
            DriverRequest::new(target)
                .writable(!options.dryrun)
                .with_policy(options.policy())
                .with_options(target_options),
        )
        .await?;

    treeploy(source_driver, target_driver, options).await
}

/// Deploy with an already built context
pub async fn run(ctx: &DeployContext) -> Result<DeploySummary> {
    let src = ctx.source_root().to_path_buf();
    let dst = ctx.target_root().to_path_buf();

    info!(
        "Deploying {} ({}) to {} ({})",
        src.display(),
        ctx.source().name(),
        dst.display(),
        ctx.target().name()
    );
    if ctx.options().dryrun {
        info!("Dry run: no changes will be written to {}", dst.display());
    }

    let mut deployer = Deployer {
        ctx,
        summary: DeploySummary {
            dryrun: ctx.options().dryrun,
            ..Default::default()
        },
    };

    match ctx.source().path_type(&src).await? {
        PathType::Absent => return Err(DeployError::SourceNotFound { path: src }),
        PathType::Other => return Err(DeployError::UnsupportedSourceKind { path: src }),
        PathType::File => {
            if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
                ctx.target().mkdir(parent).await?;
            }
            deployer.deploy_file(&src, &dst).await?
        }
        PathType::Directory => deployer.deploy_directory(&src, &dst).await?,
    }

    info!("Deployment finished: {}", deployer.summary);
    Ok(deployer.summary)
}

struct Deployer<'a> {
    ctx: &'a DeployContext,
    summary: DeploySummary,
}

impl<'a> Deployer<'a> {
    /// Copy the children of `src`, then apply its tree descriptors
    fn deploy_directory<'b>(&'b mut self, src: &'b Path, dst: &'b Path) -> BoxFuture<'b, Result<()>>
    where
        'a: 'b,
    {
        async move {
            let deferred = self.copy_directory(src, dst).await?;

            for name in deferred {
                self.deploy_file(&src.join(&name), &dst.join(&name)).await?;
            }
            Ok(())
        }
        .boxed()
    }

    /// Everything except tree descriptors, whose names are returned in
    /// discovery order
    async fn copy_directory(&mut self, src: &Path, dst: &Path) -> Result<Vec<String>> {
        let ctx = self.ctx;
        let source = ctx.source();
        let target = ctx.target();

        trace!("Deploying directory {} to {}", src.display(), dst.display());
        target.mkdir(dst).await?;
        self.copy_attributes(src, dst).await?;
        self.summary.directories_visited += 1;

        let mut names = source.read_dir(src).await?;
        names.sort();

        let mut deferred = Vec::new();
        for name in names {
            let child_src = src.join(&name);
            let child_dst = dst.join(&name);

            match source.path_type(&child_src).await? {
                PathType::Directory => {
                    trace!("Descending into directory: {}", child_src.display());
                    self.deploy_directory(&child_src, &child_dst).await?;
                }
                PathType::File => match classify_path(&child_src) {
                    FileClass::Descriptor { .. } => {
                        trace!("Deferring tree descriptor: {}", child_src.display());
                        deferred.push(name);
                    }
                    _ => self.deploy_file(&child_src, &child_dst).await?,
                },
                other => {
                    warn!(
                        "Skipping {} which is neither a file nor a directory ({})",
                        child_src.display(),
                        other
                    );
                    self.summary.entries_skipped += 1;
                }
            }
        }

        Ok(deferred)
    }

    async fn deploy_file(&mut self, src: &Path, dst: &Path) -> Result<()> {
        let class = classify_path(src);
        trace!("Classified {} as {}", src.display(), class.describe());

        match class {
            FileClass::Skip => {
                debug!("Skipping editor artifact: {}", src.display());
                self.summary.entries_skipped += 1;
            }
            FileClass::Descriptor { templated } => {
                self.apply_descriptor(src, dst, templated).await?;
                self.summary.descriptors_applied += 1;
            }
            FileClass::Template => {
                let content = self.ctx.source().read_file(src).await?;
                let rendered = self.ctx.renderer().render_bytes(
                    &src.to_string_lossy(),
                    &content,
                    self.ctx.template_values(),
                )?;
                let output = template_output_path(dst);

                debug!("Rendering template {} to {}", src.display(), output.display());
                self.ctx
                    .target()
                    .write_file(&output, rendered.as_bytes())
                    .await?;
                self.copy_attributes(src, &output).await?;
                self.summary.templates_rendered += 1;
            }
            FileClass::Plain => {
                let content = self.ctx.source().read_file(src).await?;

                debug!("Copying {} to {}", src.display(), dst.display());
                self.ctx.target().write_file(dst, &content).await?;
                self.copy_attributes(src, dst).await?;
                self.summary.files_copied += 1;
            }
        }
        Ok(())
    }

    /// Descriptors describe their siblings, so when `dst` is the descriptor's
    /// own destination the entries land in its parent directory
    async fn apply_descriptor(&self, src: &Path, dst: &Path, templated: bool) -> Result<()> {
        let root = match (dst.parent(), dst.file_name() == src.file_name()) {
            (Some(parent), true) => parent,
            _ => dst,
        };

        let raw = self.ctx.source().read_file(src).await?;
        let name = src.to_string_lossy();
        let content = if templated {
            self.ctx
                .renderer()
                .render_bytes(&name, &raw, self.ctx.template_values())?
        } else {
            String::from_utf8_lossy(&raw).into_owned()
        };

        info!("Applying tree descriptor {} to {}", src.display(), root.display());
        let descriptor = TreeDescriptor::parse(src, root, &content)?;
        descriptor.apply(self.ctx.target(), root).await?;
        Ok(())
    }

    async fn copy_attributes(&self, src: &Path, dst: &Path) -> Result<()> {
        let attributes = self.ctx.source().attributes(src).await?;
        self.ctx.target().set_attributes(dst, &attributes).await?;
        Ok(())
    }
}
