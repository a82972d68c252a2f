use anyhow::Context;
use clap::{Parser, Subcommand};
use reorg_compare::picker::{ExternalDiffTool, NoDiffTool, TerminalActions};
use reorg_compare::{
	find_duplicate_targets, find_name_collisions, render_diff, render_pick_diffs, resolve_all,
	retract_superseded_picks, run_picker, state, ActionSource, AutoPolicy, DiffLauncher,
	DuplicateGroup, IndexCache, MoveDetector, MoveRecord, PickRecord, PickStats, ProgressReporter,
	ReconcileConfig,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "reorgcomp")]
#[command(about = "Reconcile an old and a new file tree after a large reorganization")]
struct Cli {
	/// TOML configuration file
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Enable verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Rank the new locations of a single old file
	Findmove {
		#[arg(long)]
		new: PathBuf,
		#[arg(long)]
		file: PathBuf,
		/// Also save the record as a moves file
		#[arg(long)]
		out: Option<PathBuf>,
	},
	/// Rank new locations for every file of the old tree
	Findmoves {
		#[arg(long)]
		new: PathBuf,
		#[arg(long)]
		old: PathBuf,
		#[arg(long)]
		out: PathBuf,
		/// Skip old-tree directories whose path matches this regex
		#[arg(long)]
		walk_exclude: Option<String>,
		/// Worker threads for scoring (default: CPU count)
		#[arg(long)]
		workers: Option<usize>,
	},
	/// List basenames that occur in more than one directory of a tree
	Unique {
		#[arg(long)]
		root: PathBuf,
	},
	/// Choose a destination for each old file
	Pick {
		#[arg(long)]
		moves: PathBuf,
		#[arg(long)]
		out: PathBuf,
		/// Continue from the picks already in the output file
		#[arg(long)]
		resume: bool,
		/// Decide by score threshold instead of asking
		#[arg(long)]
		auto: bool,
		#[arg(long)]
		threshold: Option<f64>,
		/// Program used to compare two files side by side
		#[arg(long)]
		diff_tool: Option<String>,
	},
	/// Find destinations claimed by more than one pick
	Duplicates {
		#[arg(long)]
		picks: PathBuf,
		#[arg(long)]
		out: PathBuf,
	},
	/// Resolve duplicate groups and drop the picks that lost
	Retract {
		#[arg(long)]
		picks: PathBuf,
		#[arg(long)]
		duplicates: PathBuf,
		#[arg(long)]
		out: PathBuf,
	},
	/// Keep picks matching include and not matching exclude
	Filter {
		#[arg(long)]
		picks: PathBuf,
		#[arg(long)]
		out: PathBuf,
		#[arg(long)]
		include: Option<String>,
		#[arg(long)]
		exclude: Option<String>,
	},
	/// Summarize a picks file
	Stats {
		#[arg(long)]
		picks: PathBuf,
	},
	/// Append new-tree files that no pick lands on
	Reconcile {
		#[arg(long)]
		picks: PathBuf,
		#[arg(long)]
		new: PathBuf,
		#[arg(long)]
		out: PathBuf,
		#[arg(long)]
		exclude: Option<String>,
	},
	/// Unified diff of a file pair, or of every pick in a picks file
	Diff {
		#[arg(long, conflicts_with = "picks")]
		old: Option<PathBuf>,
		#[arg(long, conflicts_with = "picks")]
		new: Option<PathBuf>,
		#[arg(long)]
		picks: Option<PathBuf>,
	},
}

/// Prints one line per directory entered during a walk
struct StdoutReporter;

impl ProgressReporter for StdoutReporter {
	fn on_directory(&self, dir: &Path) {
		println!("Scanning {}", dir.display());
	}

	fn on_walk_complete(&self, files: usize, duration_secs: f64) {
		println!("Scored {} files in {:.2}s", files, duration_secs);
	}
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
	tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

	let mut config = match &cli.config {
		Some(path) => ReconcileConfig::from_toml_file(path)
			.with_context(|| format!("loading configuration from {}", path.display()))?,
		None => ReconcileConfig::default(),
	};
	apply_overrides(&mut config, &cli.command);
	config.validate().context("invalid configuration")?;

	match cli.command {
		Command::Findmove { new, file, out } => {
			let detector = MoveDetector::new(&config)?;
			let record = detector.detect_move(&mut IndexCache::new(), &new, &file)?;
			print_record(&record);
			if let Some(out) = out {
				state::save(&out, &vec![record])?;
			}
		}
		Command::Findmoves { new, old, out, .. } => {
			let detector = MoveDetector::new(&config)?;
			let records = detector
				.detect_moves(&mut IndexCache::new(), &new, &old, &StdoutReporter)
				.context("move detection failed")?;
			state::save(&out, &records)?;
		}
		Command::Unique { root } => {
			let detector = MoveDetector::new(&config)?;
			let index = IndexCache::new().get_or_build(&root)?;
			for collision in find_name_collisions(&index, detector.generator()) {
				println!("{}", collision.name);
				for pair in &collision.pairs {
					println!(
						"  {:>6}  {}  {}",
						pair.score.to_string(),
						pair.first.display(),
						pair.second.display()
					);
				}
			}
		}
		Command::Pick { moves, out, resume, auto, .. } => {
			let records: Vec<MoveRecord> = state::load(&moves)?;
			let prior: Vec<PickRecord> = if resume && out.exists() {
				state::load(&out).context("loading picks to resume from")?
			} else {
				Vec::new()
			};

			let launcher: Box<dyn DiffLauncher> = match &config.diff_tool {
				Some(tool) => Box::new(ExternalDiffTool::new(tool, config.diff_tool_args.clone())),
				None => Box::new(NoDiffTool),
			};
			let mut actions: Box<dyn ActionSource> = if auto {
				Box::new(AutoPolicy::new(config.auto_accept_threshold))
			} else {
				Box::new(TerminalActions::new())
			};

			let outcome = run_picker(&records, actions.as_mut(), launcher.as_ref(), &prior);
			if outcome.cancelled {
				warn!("Picking cancelled, saving {} finalized picks", outcome.picks.len());
			}
			state::save(&out, &outcome.picks)?;
			if let Some(reason) = outcome.failure {
				anyhow::bail!(
					"picking stopped early, {} picks saved to {}: {}",
					outcome.picks.len(),
					out.display(),
					reason
				);
			}
		}
		Command::Duplicates { picks, out } => {
			let picks: Vec<PickRecord> = state::load(&picks)?;
			let groups = find_duplicate_targets(&picks);
			for group in &groups {
				println!("{} ({} claims)", group.destination.display(), group.members.len());
			}
			state::save(&out, &groups)?;
		}
		Command::Retract { picks, duplicates, out } => {
			let picks: Vec<PickRecord> = state::load(&picks)?;
			let groups: Vec<DuplicateGroup> = state::load(&duplicates)?;
			let resolved: Vec<PickRecord> =
				resolve_all(&groups)?.into_iter().map(|resolution| resolution.pick).collect();
			let retraction = retract_superseded_picks(&picks, &resolved);
			for pick in &retraction.retracted {
				println!("retracted {}", pick.source.display());
			}
			state::save(&out, &retraction.kept)?;
		}
		Command::Filter { picks, out, .. } => {
			let picks: Vec<PickRecord> = state::load(&picks)?;
			let kept = config.pick_filter()?.filter_picks(&picks);
			state::save(&out, &kept)?;
		}
		Command::Stats { picks } => {
			let picks: Vec<PickRecord> = state::load(&picks)?;
			let stats = PickStats::from_picks(&picks);
			println!("picks:     {}", stats.total);
			println!("matched:   {}", stats.matched);
			println!("resolved:  {}", stats.resolved);
			println!("unmatched: {}", stats.unmatched);
			println!("added:     {}", stats.added);
			match stats.average {
				Some(average) => println!("average:   {:.4}", average),
				None => println!("average:   n/a"),
			}
		}
		Command::Reconcile { picks, new, out, .. } => {
			let picks: Vec<PickRecord> = state::load(&picks)?;
			let exclude = config.pick_filter()?;
			let reconciled =
				reorg_compare::reconcile_adds_and_deletes(&picks, &new, exclude.exclude())?;
			state::save(&out, &reconciled)?;
		}
		Command::Diff { old, new, picks } => {
			let classifier = reorg_compare::ContentSniffer::new(config.sniff_bytes);
			let output = match picks {
				Some(picks) => {
					let picks: Vec<PickRecord> = state::load(&picks)?;
					render_pick_diffs(&picks, &classifier, config.context_lines)?
				}
				None => render_diff(old.as_deref(), new.as_deref(), &classifier, config.context_lines)?
					.unwrap_or_else(|| {
						info!("Not a text file pair, nothing to show");
						String::new()
					}),
			};
			print!("{}", output);
		}
	}

	Ok(())
}

/// Fold command-line flags into the loaded configuration
fn apply_overrides(config: &mut ReconcileConfig, command: &Command) {
	match command {
		Command::Findmoves { walk_exclude, workers, .. } => {
			if walk_exclude.is_some() {
				config.walk_exclude = walk_exclude.clone();
			}
			if workers.is_some() {
				config.workers = *workers;
			}
		}
		Command::Pick { threshold, diff_tool, .. } => {
			if let Some(threshold) = threshold {
				config.auto_accept_threshold = *threshold;
			}
			if diff_tool.is_some() {
				config.diff_tool = diff_tool.clone();
			}
		}
		Command::Filter { include, exclude, .. } => {
			if include.is_some() {
				config.include_pattern = include.clone();
			}
			if exclude.is_some() {
				config.exclude_pattern = exclude.clone();
			}
		}
		Command::Reconcile { exclude, .. } => {
			if exclude.is_some() {
				config.exclude_pattern = exclude.clone();
			}
		}
		_ => {}
	}
}

fn print_record(record: &MoveRecord) {
	println!("{}", record.source.display());
	if record.candidates.is_empty() {
		println!("  no same-named file in the new tree");
	}
	for candidate in &record.candidates {
		println!("  {:>6}  {}", candidate.score.to_string(), candidate.destination.display());
	}
}
