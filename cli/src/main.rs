use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use cranrank_core::config::{self, RunConfig};
use cranrank_core::persist::{load_index, IndexPaths};
use cranrank_core::pipeline;
use cranrank_core::query::{Operator, QueryParser};
use cranrank_core::run::{check_run_tag, RunWriter, DEFAULT_RUN_TAG};
use cranrank_core::search::Searcher;
use cranrank_core::{Analyzer, Similarity};
use tracing_subscriber::{fmt, EnvFilter};

use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cranrank")]
#[command(about = "Index a tagged test collection and write ranked runs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    #[command(flatten)]
    common: Common,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index, then run every query into a run file (default)
    Run,
    /// Build the index only
    Index,
    /// Search an existing index and print run lines to stdout
    Search {
        /// Query text; supports +must -not field:term "phrases" and ^boost
        text: String,
        /// Query number printed in the first column
        #[arg(long, default_value_t = 1)]
        number: u32,
    },
}

#[derive(Args)]
struct Common {
    /// Collection file in the tagged .I/.T/.A/.B/.W format
    #[arg(long, global = true, default_value = config::DEFAULT_CORPUS)]
    corpus: PathBuf,
    /// Query file in the same format
    #[arg(long, global = true, default_value = config::DEFAULT_QUERIES)]
    queries: PathBuf,
    /// Index directory (recreated on every indexing run)
    #[arg(long, global = true, default_value = config::DEFAULT_INDEX_DIR)]
    index: PathBuf,
    /// Directory for run files
    #[arg(long, global = true, default_value = config::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
    /// Analyzer: 1 = standard, 2 = english. Prompted for when absent
    #[arg(long, global = true)]
    analyzer: Option<i64>,
    /// Similarity code (1-5) or name (bm25, classic, boolean, lm, ibs). Prompted for when absent
    #[arg(long, global = true)]
    similarity: Option<String>,
    /// Number of hits per query
    #[arg(long, global = true, default_value_t = config::DEFAULT_TOP_K)]
    top_k: usize,
    /// Tag written in the last column of the run file
    #[arg(long, global = true, default_value = DEFAULT_RUN_TAG)]
    run_tag: String,
    /// Weight every field 1.0 instead of using field boosts
    #[arg(long, global = true, default_value_t = false)]
    no_boost: bool,
    /// Override a field boost, e.g. --boost title=1.5
    #[arg(long, global = true)]
    boost: Vec<String>,
    /// Require every query term instead of any
    #[arg(long, global = true, default_value_t = false)]
    and: bool,
    /// Parse query files with operators and phrases instead of as plain text
    #[arg(long, global = true, default_value_t = false)]
    query_syntax: bool,
}

impl Common {
    fn similarity(&self) -> Result<Option<Similarity>> {
        let Some(raw) = self.similarity.as_deref() else { return Ok(None) };
        if let Ok(code) = raw.parse::<i64>() {
            return Ok(Some(Similarity::from_code(code)));
        }
        match Similarity::from_name(raw) {
            Some(sim) => Ok(Some(sim)),
            None => bail!("unknown similarity '{raw}'"),
        }
    }

    fn into_config(self, analyzer: Analyzer, similarity: Similarity) -> Result<RunConfig> {
        check_run_tag(&self.run_tag)?;
        let mut cfg = RunConfig {
            corpus: self.corpus,
            queries: self.queries,
            index_dir: self.index,
            output_dir: self.output_dir,
            analyzer,
            similarity,
            boosting: !self.no_boost,
            operator: if self.and { Operator::And } else { Operator::Or },
            query_syntax: self.query_syntax,
            top_k: self.top_k,
            run_tag: self.run_tag,
            ..RunConfig::default()
        };
        for assignment in &self.boost {
            cfg.boosts.apply(assignment)?;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let common = cli.common;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let analyzer = match common.analyzer {
                Some(code) => Analyzer::from_code(code),
                None => config::prompt_analyzer(&mut input, &mut out)?,
            };
            let similarity = match common.similarity()? {
                Some(sim) => sim,
                None => config::prompt_similarity(&mut input, &mut out)?,
            };
            let cfg = common.into_config(analyzer, similarity)?;
            tracing::info!(
                analyzer = %cfg.analyzer,
                similarity = %cfg.similarity,
                boosting = cfg.boosting,
                top_k = cfg.top_k,
                output = %cfg.output_path().display(),
                "run configured"
            );
            println!("Indexing...");
            let indexed = pipeline::index_corpus(&cfg)?;
            println!("Indexing Finished, total docs: {}", indexed.num_docs);
            println!("Querying...");
            let queried = pipeline::run_queries(&cfg)?;
            println!("Querying finished, total queries: {}", queried.queries);
            if queried.failed > 0 {
                println!("{} queries could not be parsed and were skipped", queried.failed);
            }
            println!("Run written to {}", queried.output.display());
            println!("PROGRAM TERMINATED");
        }
        Commands::Index => {
            let analyzer = match common.analyzer {
                Some(code) => Analyzer::from_code(code),
                None => config::prompt_analyzer(&mut input, &mut out)?,
            };
            let cfg = common.into_config(analyzer, Similarity::default())?;
            let indexed = pipeline::index_corpus(&cfg)?;
            println!("Indexing Finished, total docs: {}", indexed.num_docs);
        }
        Commands::Search { text, number } => {
            let similarity = common.similarity()?.unwrap_or_default();
            let index = load_index(&IndexPaths::new(&common.index))?;
            let cfg = common.into_config(index.analyzer, similarity)?;
            let parser = QueryParser::new(index.analyzer, cfg.field_weights()).default_operator(cfg.operator);
            let query = parser.parse(&text)?;
            let results = Searcher::new(&index, similarity).search(&query, cfg.top_k);
            let mut writer = RunWriter::new(out.lock(), cfg.run_tag.clone())?;
            writer.write_results(number, &results)?;
            writer.finish()?.flush()?;
        }
    }
    Ok(())
}
