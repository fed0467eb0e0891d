//! Binary entry point: argument parsing, logger
//! initialization, orchestrator invocation, and error-taxonomy-to-exit-code
//! mapping (0 success, 1 fatal error, 2 check-squashable-not-squashable).

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize as _;

use git_monomerge::cli::{Cli, Commands};
use git_monomerge::config::RunConfig;
use git_monomerge::orchestrator::{Orchestrator, RunRequest};
use git_monomerge::rewrite_tool::SubprocessHistoryRewriter;
use git_monomerge::vcs::VcsAdapter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.log_level.value() {
        Ok(level) => level,
        Err(err) => {
            eprintln!("{}: {err:#}", "error".red().bold());
            return ExitCode::from(1);
        }
    };
    git_monomerge::log::init(level);

    // Every fatal error surfaces through the same `anyhow::Error` propagation path
    // and maps to exit code 1; a non-squashable result is not an error and
    // is handled inside `run` as exit code 2.
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = RunConfig::load(cli.config.as_deref())?;
    let vcs = VcsAdapter::with_binary(config.git_binary.clone());
    let rewriter = SubprocessHistoryRewriter::new(config.history_rewriter_binary.clone());
    let orchestrator = Orchestrator::new(&vcs, &rewriter, &config.bookkeeping_marker);

    match &cli.command {
        Commands::Merge(args) => {
            let request = RunRequest {
                meta_location: args.meta.clone(),
                mono_root: args.mono.clone(),
                strategy_path: args.strategy.clone(),
                whitelist_path: args.whitelist.clone(),
                dump_template_path: args.dump_template.clone(),
                report_json_path: args.report_json.clone(),
                report_text_path: args.report_text.clone(),
                check_squashable: args.check_squashable,
                squash: args.squash,
            };
            if args.dump_log.is_some() {
                log::warn!("--dump-log is accepted but log tee-ing to a file is not implemented");
            }

            let outcome = orchestrator.run(&request)?;
            if outcome.dumped_template {
                if let Some(path) = &args.dump_template {
                    println!("wrote strategy template to {}", path.display());
                }
                return Ok(ExitCode::SUCCESS);
            }
            if let Some(report) = &outcome.report {
                print!("{}", report.to_text());
            }
            if args.check_squashable && !outcome.all_squashable() {
                return Ok(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::DumpTemplate(args) => {
            let whitelist = args
                .whitelist
                .as_deref()
                .map(git_monomerge::strategy::load_whitelist)
                .transpose()?;
            let template = orchestrator.dump_template(&args.meta, whitelist.as_deref())?;
            let rendered = serde_json::to_string_pretty(&template)?;
            match &args.output {
                Some(path) => std::fs::write(path, rendered)?,
                None => println!("{rendered}"),
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::ReportBranches(args) => {
            let whitelist = args
                .whitelist
                .as_deref()
                .map(git_monomerge::strategy::load_whitelist)
                .transpose()?;
            let discovery = orchestrator.report_branches(&args.meta, whitelist.as_deref())?;
            for (branch, submodules) in &discovery.per_branch {
                println!("{}", branch.bold());
                for submodule in submodules {
                    println!("  {} -> {}", submodule.path, submodule.url);
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::CheckSquashable(args) => {
            let squashable = orchestrator.run_squash_pass(&args.mono, false)?;
            let mut all_ok = true;
            for (branch, range) in &squashable {
                match range {
                    Some(range) => println!("{branch}: squashable ({} .. {})", range.tail, range.head),
                    None => {
                        println!("{branch}: {}", "not squashable".red());
                        all_ok = false;
                    }
                }
            }
            Ok(if all_ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }

        Commands::Squash(args) => {
            let squashed = orchestrator.run_squash_pass(&args.mono, true)?;
            for (branch, range) in &squashed {
                match range {
                    Some(_) => println!("{branch}: squashed"),
                    None => println!("{branch}: {}", "skipped, not squashable".yellow()),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
