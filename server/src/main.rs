use anyhow::{Context, Result};
use axum::Router;
use clap::{Parser, Subcommand};
use query_core::{EngineConfig, IndexPaths, QueryEngine, StaticRank};
use server::router;
use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "Answer ranked queries over a partitioned tf-idf index", long_about = None)]
struct Cli {
    /// Index directory (index_dir.json, docs.json and the partition files)
    #[arg(long, global = true, default_value = "./indexdir")]
    index: String,
    /// JSON object mapping URL to popularity rank; higher ranks sort first
    #[arg(long, global = true)]
    ranks: Option<PathBuf>,
    /// Number of hits a query returns
    #[arg(long, global = true, default_value_t = 5)]
    max_results: usize,
    /// Load every partition at startup instead of on first use
    #[arg(long, global = true, default_value_t = false)]
    warm: bool,
    /// Frequent terms to preload with --warm (comma-separated)
    #[arg(long, global = true, value_delimiter = ',')]
    warm_terms: Vec<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP search API
    Serve {
        /// Host to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to bind
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Read queries from stdin and print ranked results
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();
    let engine = Arc::new(open_engine(&cli)?);

    match cli.command {
        Commands::Serve { host, port } => {
            let app: Router = router(engine);
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(%addr, "server listening");
            axum::serve(listener, app).await?;
        }
        Commands::Repl => {
            tokio::task::spawn_blocking(move || repl(&engine)).await??;
        }
    }
    Ok(())
}

fn open_engine(cli: &Cli) -> Result<QueryEngine> {
    let paths = IndexPaths::new(&cli.index);
    let config = EngineConfig {
        max_results: cli.max_results.max(1),
        total_documents: None,
        warm_terms: cli.warm_terms.clone(),
    };
    let mut engine = QueryEngine::open(&paths)
        .with_context(|| format!("opening index at {}", cli.index))?
        .with_config(config);
    if let Some(path) = &cli.ranks {
        let ranks = StaticRank::load(path)?;
        tracing::info!(urls = ranks.len(), "popularity ranks loaded");
        engine = engine.with_ranker(ranks);
    }
    if cli.warm {
        engine.warm_up(std::iter::empty::<&str>());
    }
    Ok(engine)
}

fn repl(engine: &QueryEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        write!(stdout, "Enter query (or 'exit'): ")?;
        stdout.flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "exit" {
            break;
        }

        let start = Instant::now();
        let outcome = engine.evaluate(query);
        let elapsed = start.elapsed();

        match outcome {
            Ok(hits) if hits.is_empty() => writeln!(stdout, "No results found.")?,
            Ok(hits) => {
                for (i, hit) in hits.iter().enumerate() {
                    writeln!(stdout, "{}. URL: {} (Score: {:.4})", i + 1, hit.url, hit.score)?;
                    if !hit.title.is_empty() {
                        writeln!(stdout, "   {}", hit.title)?;
                    }
                }
            }
            Err(err) => writeln!(stdout, "{err}")?,
        }
        writeln!(stdout, "Query time: {:.2}ms", elapsed.as_secs_f64() * 1000.0)?;
        writeln!(stdout, "---------------")?;
    }
    Ok(())
}
