use std::path::PathBuf;

use boxforge::{AppError, BuildOptions, GlobalOptions, SpinOptions};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "boxforge")]
#[command(version)]
#[command(
    about = "Builds Windows VM images for malware analysis",
    long_about = None
)]
struct Cli {
    /// Override the configuration file with the one specified
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Use this profile instead of the one in the configuration
    #[arg(short, long, global = true)]
    profile: Option<String>,
    /// Debug mode. Keeps intermediate build files around
    #[arg(short, long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available templates
    #[clap(visible_alias = "l")]
    List,
    /// Build a Windows VM image based on a template
    #[clap(visible_alias = "b")]
    Build {
        /// Name of the template to build. Use the list command to view
        /// available templates
        template: String,
        /// Force the build to happen. Overwrites a pre-existing build
        /// directory
        #[arg(long)]
        force: bool,
        /// Resolve and emit the build plan without running the builder
        #[arg(long)]
        plan_only: bool,
    },
    /// Generate an analyst Vagrantfile for a built image
    #[clap(visible_alias = "s")]
    Spin {
        /// Template the image was built from
        template: String,
        /// Name for the spun-up analysis VM
        name: String,
        /// Overwrite a pre-existing build directory
        #[arg(long)]
        force: bool,
    },
    /// Show the credentials stored with a built VM
    Creds {
        /// Name of the registered VM
        vm_name: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let global = GlobalOptions {
        config: cli.config,
        profile: cli.profile,
        debug: cli.debug,
    };

    let result: Result<(), AppError> = match cli.command {
        Commands::List => {
            println!("supported templates:\n");
            for name in boxforge::list_templates() {
                println!("{name}");
            }
            println!();
            Ok(())
        }
        Commands::Build { template, force, plan_only } => {
            boxforge::build(&global, &BuildOptions { template, force, plan_only }).map(|_| ())
        }
        Commands::Spin { template, name, force } => {
            boxforge::spin(&global, &SpinOptions { template, name, force }).map(|_| ())
        }
        Commands::Creds { vm_name } => boxforge::creds(&vm_name).map(|_| ()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
