use std::path::PathBuf;

use crate::raster::RasterError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("diagram has no nodes")]
    EmptyDiagram,
    #[error("unknown node id {0}")]
    UnknownNode(usize),
    #[error("unknown cluster id {0}")]
    UnknownCluster(usize),
    #[error("invalid output file name `{0}`")]
    InvalidFileStem(String),
    #[error("output directory {} does not exist", .0.display())]
    MissingOutputDir(PathBuf),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Raster(#[from] RasterError),
}

pub type Result<T> = std::result::Result<T, Error>;
