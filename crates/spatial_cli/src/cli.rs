use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "spatial", about = "Point and polygon spatial store", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database file (overrides SPATIAL_DB_PATH; in-memory when unset)
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Pooled connections for file databases (overrides SPATIAL_POOL_SIZE)
    #[arg(long, global = true)]
    pub pool_size: Option<String>,

    /// Log level (overrides SPATIAL_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Absolute log directory (overrides SPATIAL_LOG_DIR)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the store answers
    Health,

    /// Point resources
    #[command(subcommand)]
    Points(ResourceCommand),

    /// Polygon resources
    #[command(subcommand)]
    Polygons(ResourceCommand),
}

#[derive(Subcommand)]
pub enum ResourceCommand {
    /// Create a resource from a JSON payload `{name, properties?, geom}`
    Create {
        payload: String,
    },

    /// List resources, newest first
    List {
        #[arg(long)]
        limit: Option<String>,

        #[arg(long)]
        offset: Option<String>,

        /// Envelope `west,south,east,north`
        #[arg(long)]
        bbox: Option<String>,

        /// GeoJSON geometry points must lie within
        #[arg(long)]
        within: Option<String>,

        /// GeoJSON geometry polygons must intersect
        #[arg(long)]
        intersects: Option<String>,
    },

    /// Show one resource
    Get {
        id: Uuid,
    },

    /// Update fields present in a JSON payload `{name?, properties?, geom?}`
    Patch {
        id: Uuid,
        payload: String,
    },

    /// Delete one resource
    Delete {
        id: Uuid,
    },

    /// Points closest to a position (points only)
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long)]
        limit: Option<String>,
    },

    /// Points inside one polygon (polygons only)
    Contains {
        id: Uuid,
    },
}
