#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Cannot read page file {0}: {1}")]
    PageFile(String, String),

    #[error("Invalid page description: {0}")]
    InvalidPage(String),

    #[error("Invalid rectangle '{0}': expected x0,y0,x1,y1")]
    InvalidRect(String),
}
