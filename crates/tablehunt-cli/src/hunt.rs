use crate::prelude::*;
use crate::report::OutputFormat;
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
pub struct HuntOptions {
    /// JSON page description
    #[arg(value_name = "PAGE")]
    page: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,
}

#[derive(Debug, clap::Args)]
pub struct WithinOptions {
    /// JSON page description
    #[arg(value_name = "PAGE")]
    page: PathBuf,

    /// Area to search, as x0,y0,x1,y1
    #[arg(long, value_parser = parse_rect)]
    rect: tablehunt::Rect,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,
}

pub fn run(options: HuntOptions, global: crate::Global) -> Result<()> {
    let config = global.hunt_config()?;
    let mut tree = load_page(&options.page)?;

    let tables = tablehunt::hunt_tables(&mut tree, &config);
    log::info!("{} table(s) in {}", tables.len(), options.page.display());

    crate::report::print(&tree, &tables, &options.format)
}

pub fn run_within(options: WithinOptions, global: crate::Global) -> Result<()> {
    let config = global.hunt_config()?;
    let mut tree = load_page(&options.page)?;

    let tables = tablehunt::hunt_tables_within_bounds(&mut tree, options.rect, &config)
        .map_err(|e| eyre!(e))?;
    log::info!("{} table(s) within {}", tables.len(), options.rect);

    crate::report::print(&tree, &tables, &options.format)
}
