//! Show how the sampling distance trades index size for lookup cost

use indexed_line_server::{IndexConfig, Indexable, LineEnding, LineResolver, MemSource};

#[async_std::main]
async fn main() -> indexed_line_server::Result<()> {
    let data: String = (0..100_000).map(|i| format!("{} {}\n", "x".repeat(i % 80), i)).collect();
    let source = MemSource::new("generated", data);

    for sample_distance in &[64, 4096, 1_000_000] {
        let config = IndexConfig::new(*sample_distance, LineEnding::Lf);
        let resolver = LineResolver::build(source.clone(), &config).await?;

        println!(
            "distance {:>9}: {:>6} checkpoints, {:>7} bytes, line 77777 = {:?}",
            sample_distance,
            resolver.get_index().len(),
            resolver.get_index_byte_len(),
            resolver.resolve(77_777).await?
        );
    }

    Ok(())
}
