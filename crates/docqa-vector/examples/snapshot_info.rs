use docqa_core::config::Config;
use docqa_vector::SnapshotStore;

fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = SnapshotStore::new(config.data_dir()?);
    let corpus = store.load()?;
    println!("dir: {}", store.dir().display());
    println!("chunks: {}", corpus.len());
    println!("dimension: {:?}", corpus.dimension());
    for source in corpus.distinct_sources() { println!("  {source}"); }
    Ok(())
}
