use crate::prelude::{eprintln, println, *};
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
pub struct GridOptions {
    /// JSON page description
    #[arg(value_name = "PAGE")]
    page: PathBuf,

    /// Area to evaluate, as x0,y0,x1,y1
    #[arg(long, value_parser = parse_rect)]
    rect: tablehunt::Rect,

    /// Print the transcribed table as Markdown instead of the grid record
    #[arg(long, default_value = "false")]
    markdown: bool,
}

pub fn run(options: GridOptions, global: crate::Global) -> Result<()> {
    let config = global.hunt_config()?;
    let mut tree = load_page(&options.page)?;

    let Some(table) = tablehunt::find_table_within_bounds(&mut tree, options.rect, &config)
        .map_err(|e| eyre!(e))?
    else {
        eprintln!("no table within {}", options.rect);
        return Ok(());
    };

    if options.markdown {
        println!("{}", tablehunt::render::markdown::render_table(&tree, table));
        return Ok(());
    }

    let info = tablehunt::grid_info(&tree, table)
        .map_err(|e| eyre!(e))?
        .ok_or_eyre("transcribed table has no grid record")?;
    println!("{}", serde_json::to_string_pretty(info)?);

    Ok(())
}
