use clap::Parser;

use crate::deploy::DeployOptions;
use crate::template::TemplateValues;

/// Deploy a source tree onto a local or ssh target
#[derive(Debug, Parser)]
#[command(name = "treeploy")]
#[command(about = "Deploys a directory tree with templates and tree descriptors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct TreeployCli {
    /// Source tree or file, `[user@]host:path` for ssh
    pub source: String,

    /// Target directory or file, `[user@]host:path` for ssh
    pub target: String,

    /// Increase verbosity (-v warnings, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Replace existing files whose content differs
    #[arg(long)]
    pub overwrite: bool,

    /// Replace files with directories and vice versa; implies --overwrite
    #[arg(long)]
    pub force: bool,

    /// Show what would be deployed without writing anything
    #[arg(short = 'n', long)]
    pub dryrun: bool,

    /// Set a template model field, e.g. `web.port=8080`
    #[arg(long = "model", value_name = "FIELD=VALUE")]
    pub models: Vec<String>,

    /// Load a JSON or YAML model file, optionally below FIELD
    #[arg(long = "modelfile", value_name = "[FIELD=]FILE")]
    pub model_files: Vec<String>,

    /// Run a shell command and load its JSON output as model, optionally below FIELD
    #[arg(long = "modelcmd", value_name = "[FIELD=]CMD")]
    pub model_commands: Vec<String>,

    /// Source driver option, e.g. `name=local`
    #[arg(long = "source-driver", value_name = "KEY=VALUE")]
    pub source_driver: Vec<String>,

    /// Target driver option, e.g. `use_sudo=true`
    #[arg(long = "target-driver", value_name = "KEY=VALUE")]
    pub target_driver: Vec<String>,

    /// Do not warn when running without root privileges
    #[arg(long)]
    pub noroot: bool,
}

impl TreeployCli {
    pub fn deploy_options(&self, template_values: TemplateValues) -> DeployOptions {
        DeployOptions::new()
            .with_overwrite(self.overwrite)
            .with_force(self.force)
            .with_dryrun(self.dryrun)
            .with_template_values(template_values)
    }
}
