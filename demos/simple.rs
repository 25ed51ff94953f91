//! Index a text file and read a given line directly

use indexed_line_server::{IndexConfig, Indexable, LineService};

#[async_std::main]
async fn main() -> indexed_line_server::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "Cargo.toml".to_string());

    // Open and index file
    let file = LineService::open(&path, &IndexConfig::default()).await?;

    // Get line count without reading the file again
    let line_count = file.total_lines();
    println!("{} has {} lines", file.filename(), line_count);

    // Read the last line
    if line_count > 0 {
        println!("{}", file.resolve(line_count - 1).await?);
    }

    Ok(())
}
