//! `mvnget run` – crawl a seed group and download what it finds.

use anyhow::{Context, Result};
use mvnget_core::config::MvngetConfig;
use mvnget_core::control::CancelToken;
use mvnget_core::url_model::GroupId;
use mvnget_core::{run_crawl, CrawlConfig, RunReport};

use crate::cli::RunArgs;

/// Merges command-line overrides into the file configuration.
pub(crate) fn resolve(cfg: &MvngetConfig, args: &RunArgs, cancel: CancelToken) -> Result<CrawlConfig> {
    let mut cfg = cfg.clone();
    if let Some(n) = args.threads {
        cfg.workers = n;
    }
    if let Some(d) = args.depth {
        cfg.max_depth = d;
    }
    cfg.exclude.extend(args.exclude.iter().cloned());
    cfg.validate()?;

    let mut crawl = cfg.crawl_config(args.output.clone(), cancel);
    crawl.resume = !args.fresh;
    crawl.dry_run = args.dry_run;
    Ok(crawl)
}

pub fn run_crawl_command(cfg: &MvngetConfig, args: &RunArgs) -> Result<()> {
    let seed = GroupId::parse(&args.group).with_context(|| format!("invalid group: {:?}", args.group))?;
    let cancel = CancelToken::new();
    let crawl = resolve(cfg, args, cancel.clone())?;

    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\ninterrupt received, finishing in-flight downloads...");
        handler_token.cancel();
    })
    .context("install Ctrl-C handler")?;

    let report = run_crawl(&crawl, &seed)?;
    if crawl.dry_run {
        print_plan(&report);
    } else {
        print_summary(&crawl, &report);
    }
    Ok(())
}

fn print_plan(report: &RunReport) {
    for task in &report.planned {
        println!("{}", task.destination);
    }
    println!(
        "{} file(s) in {} group(s){}",
        report.planned.len(),
        report.crawl.groups_crawled,
        if report.cancelled { " (interrupted)" } else { "" }
    );
}

fn print_summary(crawl: &CrawlConfig, report: &RunReport) {
    let d = &report.downloads;
    let mib = d.bytes as f64 / 1_048_576.0;
    if report.resumed {
        println!("resumed from pending snapshot");
    }
    println!(
        "groups: {}  listings: {} ({} failed)",
        report.crawl.groups_crawled, report.crawl.listings, report.crawl.failed_listings
    );
    println!(
        "downloaded: {}  skipped: {}  failed: {}  ({:.1} MiB)",
        d.downloaded, d.skipped, d.failed, mib
    );
    if report.cancelled {
        println!(
            "interrupted: {} task(s) and {} group(s) saved under {}; rerun the same command to resume",
            report.pending,
            report.frontier,
            crawl.output_root.join(mvnget_core::state::STATE_DIR).display()
        );
    } else if report.pending > 0 {
        println!("{} download(s) failed; rerun to retry", report.pending);
    }
}
