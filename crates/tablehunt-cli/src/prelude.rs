pub use crate::error::Error;

pub use anstream::eprintln;
pub use anstream::println;
pub use color_eyre::eyre::{eyre, Context, OptionExt, Result};
pub use std::format as f;

pub fn new_table() -> prettytable::Table {
    let mut table = prettytable::Table::new();

    let format = prettytable::format::FormatBuilder::new()
        .padding(1, 1)
        .build();

    table.set_format(format);

    table
}

/// Read a JSON page description and build its content tree.
pub fn load_page(path: &std::path::Path) -> Result<tablehunt::ContentTree> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::PageFile(path.display().to_string(), e.to_string()))?;
    let spec: tablehunt::PageSpec =
        serde_json::from_str(&text).map_err(|e| Error::InvalidPage(e.to_string()))?;
    Ok(tablehunt::ContentTree::from_spec(&spec))
}

/// Parse an `x0,y0,x1,y1` argument.
pub fn parse_rect(s: &str) -> std::result::Result<tablehunt::Rect, Error> {
    s.parse().map_err(|_| Error::InvalidRect(s.to_string()))
}
