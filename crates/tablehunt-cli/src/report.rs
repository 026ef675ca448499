use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use serde::Serialize;
use tablehunt::{BlockView, ContentTree, GridInfo, NodeId, Rect, StructRole};

#[derive(Debug, Clone, clap::ValueEnum, Serialize, serde::Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The rewritten page and a record per table, as JSON
    Json,
    /// Headings, paragraphs and tables as Markdown
    Markdown,
    /// One line per table
    #[default]
    Summary,
}

/// What the CLI reports about one transcribed table.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub id: NodeId,
    pub bbox: Rect,
    pub rows: usize,
    pub columns: usize,
    pub cells: usize,
    pub grid: Option<GridInfo>,
}

impl TableReport {
    pub fn new(tree: &ContentTree, table: NodeId) -> Result<Self> {
        let grid = tablehunt::grid_info(tree, table)
            .map_err(|e| eyre!(e))?
            .cloned();
        let rows = tree
            .children(table)
            .iter()
            .filter(|&&c| tree.role(c) == Some(StructRole::TableRow))
            .count();
        let cells = tree
            .descendants(table)
            .into_iter()
            .filter(|&c| matches!(tree.role(c), Some(StructRole::TableCell { .. })))
            .count();
        let columns = grid.as_ref().map_or(0, |g| g.width.saturating_sub(1));

        Ok(Self {
            id: table,
            bbox: tree.bbox(table),
            rows,
            columns,
            cells,
            grid,
        })
    }
}

#[derive(Debug, Serialize)]
struct PageReport {
    tables: Vec<TableReport>,
    page: BlockView,
}

/// Print the outcome of a hunt in the requested format.
pub fn print(tree: &ContentTree, tables: &[NodeId], format: &OutputFormat) -> Result<()> {
    let reports = tables
        .iter()
        .map(|&t| TableReport::new(tree, t))
        .collect::<Result<Vec<_>>>()?;

    match format {
        OutputFormat::Json => {
            let report = PageReport {
                tables: reports,
                page: tree.view(tree.root()),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Markdown => {
            println!("{}", tablehunt::render::markdown::render_blocks(tree, tree.root()));
        }
        OutputFormat::Summary => {
            if reports.is_empty() {
                eprintln!("{}", "no tables found".yellow());
                return Ok(());
            }

            let mut table = new_table();
            table.add_row(prettytable::row![
                "TABLE".bold().cyan(),
                "BBOX".bold().cyan(),
                "ROWS x COLS".bold().cyan(),
                "CELLS".bold().cyan(),
            ]);
            for report in &reports {
                table.add_row(prettytable::row![
                    report.id,
                    report.bbox,
                    f!("{} x {}", report.rows, report.columns),
                    report.cells,
                ]);
            }
            table.printstd();
        }
    }

    Ok(())
}
