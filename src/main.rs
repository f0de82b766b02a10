use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use copyloom::config::Config;
use copyloom::core::{Brief, ContentGraph, ContentNode, SeoFieldKind};
use copyloom::log::LogOptions;
use copyloom::orchestration::Orchestrator;
use copyloom::persistence::{FileSnapshotStore, SnapshotKind, SnapshotRef, SnapshotStore};
use copyloom::prompt::styles;
use copyloom::provider;
use copyloom::store::Event;
use copyloom::{llog, llog_error, Error, Result};

/// Copyloom - marketing copy generation with word-count control and variants
#[derive(Parser, Debug)]
#[command(name = "copyloom")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    COPYLOOM_DEBUG=1   Enable debug logging (alternative to --debug)\n    COPYLOOM_LOG=path  Write the log somewhere other than ~/.copyloom/copyloom.log"
)]
pub struct Cli {
    /// Enable debug logging (writes to ~/.copyloom/copyloom.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Generate copy from a brief, then optionally derive variants from it
    Generate {
        /// Brief file (.toml or .json)
        #[arg(long, short = 'b')]
        brief: PathBuf,

        /// Also write a divergent alternative
        #[arg(long)]
        alternative: bool,

        /// Also rewrite the copy in a named style (see `copyloom styles`)
        #[arg(long, short = 's')]
        style: Option<String>,

        /// Also rewrite the copy to read more naturally
        #[arg(long)]
        humanize: bool,

        /// Save the session snapshot afterwards
        #[arg(long)]
        save: bool,
    },

    /// Rate a brief and suggest improvements before generating anything
    Evaluate {
        #[arg(long, short = 'b')]
        brief: PathBuf,
    },

    /// List the available writing styles
    Styles,

    /// Show a saved snapshot, or list them all when no id is given
    Show {
        #[arg(long)]
        session: Option<String>,

        #[arg(long)]
        template: Option<String>,

        #[arg(long = "output")]
        saved_output: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    copyloom::log::init(LogOptions::debug(cli.debug));
    llog!("Copyloom starting: {:?}", cli.command);

    let result = match cli.command {
        Command::Generate {
            brief,
            alternative,
            style,
            humanize,
            save,
        } => run_generate(&brief, alternative, style, humanize, save),
        Command::Evaluate { brief } => run_evaluate(&brief),
        Command::Styles => {
            print_styles();
            Ok(())
        }
        Command::Show {
            session,
            template,
            saved_output,
        } => run_show(
            session.as_deref(),
            template.as_deref(),
            saved_output.as_deref(),
        ),
    };

    if let Err(err) = &result {
        llog_error!("copyloom exited with error: {}", err);
    }
    result
}

fn load_brief(path: &Path) -> Result<Brief> {
    let contents = fs::read_to_string(path)?;
    let brief = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents)?,
        _ => toml::from_str(&contents)?,
    };
    Ok(brief)
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let gateway = provider::build_gateway(&config.provider)?;
    llog!(
        "Provider: {} (timeout {:?})",
        gateway.provider_name(),
        gateway.timeout()
    );
    Ok(Orchestrator::new(gateway))
}

/// Print progress as it arrives and cancel on Ctrl-C.
fn watch(orchestrator: &Orchestrator) {
    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Progress { .. }
                | Event::NodeAppended { .. }
                | Event::OperationFinished { .. } => println!("  · {}", event),
                _ => {}
            }
        }
    });

    let session = orchestrator.session().clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if session.cancel() {
                eprintln!("\nCancelling...");
            }
        }
    });
}

fn run_generate(
    brief_path: &Path,
    alternative: bool,
    style: Option<String>,
    humanize: bool,
    save: bool,
) -> Result<()> {
    let brief = load_brief(brief_path)?;
    brief.validate()?;
    if let Some(style) = &style {
        styles::lookup(style)?;
    }

    let config = Config::load()?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let orchestrator = build_orchestrator(&config)?;
        watch(&orchestrator);

        println!("Generating copy...");
        let base = orchestrator.generate_base(&brief).await?;
        let mut produced = vec![base.id];

        if alternative {
            produced.push(orchestrator.create_alternative(base.id, &brief).await?.id);
        }
        if let Some(style) = &style {
            produced.push(orchestrator.apply_style(base.id, style).await?.id);
        }
        if humanize {
            produced.push(orchestrator.humanize(base.id).await?.id);
        }

        let graph = orchestrator.graph();
        println!();
        for id in &produced {
            if let Some(node) = graph.get(id) {
                print_node(node, &graph);
            }
        }

        if save {
            config.ensure_dirs()?;
            let snapshots = FileSnapshotStore::new(config.snapshots_dir()?);
            let reference = orchestrator
                .save_snapshot(&snapshots, SnapshotKind::Session)
                .await?;
            println!("Saved session: copyloom show --session {}", reference.id());
        }
        Ok::<_, Error>(())
    })
}

fn run_evaluate(brief_path: &Path) -> Result<()> {
    let brief = load_brief(brief_path)?;
    let config = Config::load()?;
    let rt = tokio::runtime::Runtime::new()?;

    let evaluation = rt.block_on(async {
        let orchestrator = build_orchestrator(&config)?;
        watch(&orchestrator);
        orchestrator.evaluate_inputs(&brief).await
    })?;

    println!();
    println!("Brief score: {}/100", evaluation.score);
    println!("{}", evaluation.summary);
    for (i, tip) in evaluation.tips.iter().enumerate() {
        println!("  {}. {}", i + 1, tip);
    }
    Ok(())
}

fn print_styles() {
    let mut current = None;
    for style in styles::all() {
        if current != Some(style.category) {
            println!("{:?}:", style.category);
            current = Some(style.category);
        }
        println!("  {:<18} {}", style.id, style.name);
    }
}

fn run_show(
    session: Option<&str>,
    template: Option<&str>,
    saved_output: Option<&str>,
) -> Result<()> {
    let reference = SnapshotRef::from_query(session, template, saved_output)?;
    let config = Config::load()?;
    let snapshots = FileSnapshotStore::new(config.snapshots_dir()?);
    let rt = tokio::runtime::Runtime::new()?;

    let Some(reference) = reference else {
        for kind in SnapshotKind::ALL {
            let ids = rt.block_on(snapshots.list(kind))?;
            println!("{} ({}):", kind, ids.len());
            for id in ids {
                println!("  {}", id);
            }
        }
        return Ok(());
    };

    let snapshot = rt.block_on(snapshots.load(&reference))?;
    let graph = snapshot.graph()?;
    println!(
        "{} saved {}",
        reference,
        snapshot.saved_at.format("%Y-%m-%d %H:%M")
    );
    println!(
        "Brief: {} ({})",
        snapshot.brief.business.business_name,
        snapshot
            .brief
            .effective_target()
            .map(|t| format!("{} words", t))
            .unwrap_or_else(|| "no word target".to_string())
    );
    println!();
    for node in graph.nodes() {
        print_node(node, &graph);
    }
    Ok(())
}

fn print_node(node: &ContentNode, graph: &ContentGraph) {
    let origin = match graph.parent(&node.id) {
        Some(parent) => format!(" from {}", parent.id.short()),
        None => String::new(),
    };
    println!(
        "── {} [{}{}] {} words ──",
        node.id.short(),
        node.derivation,
        origin,
        node.word_count
    );
    println!("{}", node.text.trim());

    if let Some(score) = &node.score {
        println!(
            "Score {}/100 (clarity {}, persuasion {}, tone {}, engagement {}): {}",
            score.overall,
            score.clarity,
            score.persuasiveness,
            score.tone_match,
            score.engagement,
            score.explanation
        );
    }
    if let Some(seo) = &node.seo {
        for kind in SeoFieldKind::ALL {
            for field in seo.fields(kind) {
                let flag = if field.within_limit() { "" } else { "  (too long)" };
                println!(
                    "{}: {} [{}/{}]{}",
                    kind.label(),
                    field.text,
                    field.char_count,
                    field.limit,
                    flag
                );
            }
        }
    }
    if let Some(geo) = &node.geo {
        println!("GEO {}/100: {}", geo.overall, geo.explanation);
    }
    println!();
}
