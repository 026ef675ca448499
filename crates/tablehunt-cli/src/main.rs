use crate::prelude::*;
use clap::Parser;

mod error;
mod grid;
mod hunt;
mod prelude;
mod report;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Recover table structure from pages described as positioned content blocks"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// TOML file with hunt tuning (wiggle_room, max_line_thickness, score_threshold)
    #[clap(long, env = "TABLEHUNT_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "TABLEHUNT_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

impl Global {
    pub fn hunt_config(&self) -> Result<tablehunt::HuntConfig> {
        match &self.config {
            Some(path) => tablehunt::HuntConfig::load(path)
                .map_err(|e| eyre!(e))
                .wrap_err_with(|| f!("loading {}", path.display())),
            None => Ok(tablehunt::HuntConfig::default()),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Hunt a whole page for tables
    Hunt(crate::hunt::HuntOptions),

    /// Hunt inside a rectangle, keeping any structurally valid grid
    Within(crate::hunt::WithinOptions),

    /// Print the raw grid found inside a rectangle
    Grid(crate::grid::GridOptions),
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let app = App::parse();

    let level = if app.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match app.command {
        SubCommands::Hunt(options) => crate::hunt::run(options, app.global),
        SubCommands::Within(options) => crate::hunt::run_within(options, app.global),
        SubCommands::Grid(options) => crate::grid::run(options, app.global),
    }
}
