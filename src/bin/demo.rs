//! Minimal end-to-end proof that the crate links and runs: wires a
//! `Queue<String>` with a `println!`-style worker, enqueues a handful of
//! items, and exits once they drain. Not a server — no listener, no
//! metrics exporter, no route table.

use levee::{Config, Queue, Worker};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct PrintWorker;

#[async_trait::async_trait]
impl Worker<String> for PrintWorker {
    async fn do_work(&self, payload: &String) -> Result<(), anyhow::Error> {
        println!("processed: {payload}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::new()
        .with_capacity(16)
        .with_workers(2)
        .with_worker(Arc::new(PrintWorker));

    let queue = Queue::new(cfg).await?;

    for i in 0..10 {
        queue.enqueue(format!("item-{i}")).await?;
    }

    while queue.size() > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    queue.close().await?;
    tracing::info!("demo complete");
    Ok(())
}
