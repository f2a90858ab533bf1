use super::*;
use mvnget_core::control::CancelToken;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

fn run_args(args: &[&str]) -> RunArgs {
    match parse(args).command {
        CliCommand::Run(a) => a,
        other => panic!("expected Run, got {other:?}"),
    }
}

#[test]
fn cli_parse_run_defaults() {
    let a = run_args(&["mvnget", "run", "org.springframework"]);
    assert_eq!(a.group, "org.springframework");
    assert_eq!(a.output, PathBuf::from("."));
    assert!(a.threads.is_none());
    assert!(a.depth.is_none());
    assert!(a.exclude.is_empty());
    assert!(!a.fresh);
    assert!(!a.dry_run);
}

#[test]
fn cli_parse_run_all_flags() {
    let a = run_args(&[
        "mvnget", "run", "org/springframework/", "-o", "/srv/m2", "-t", "16", "--depth", "0",
        "--exclude", "boot", "--exclude", "cloud", "--fresh", "--dry-run",
    ]);
    assert_eq!(a.group, "org/springframework/");
    assert_eq!(a.output, PathBuf::from("/srv/m2"));
    assert_eq!(a.threads, Some(16));
    assert_eq!(a.depth, Some(0));
    assert_eq!(a.exclude, vec!["boot", "cloud"]);
    assert!(a.fresh);
    assert!(a.dry_run);
}

#[test]
fn cli_parse_global_flags_after_subcommand() {
    let cli = parse(&["mvnget", "run", "org.foo", "-v", "--config", "/etc/mvnget.toml"]);
    assert!(cli.verbose);
    assert_eq!(cli.config, Some(PathBuf::from("/etc/mvnget.toml")));
}

#[test]
fn cli_parse_status() {
    match parse(&["mvnget", "status", "-o", "out"]).command {
        CliCommand::Status { output } => assert_eq!(output, PathBuf::from("out")),
        other => panic!("expected Status, got {other:?}"),
    }
}

#[test]
fn cli_parse_rejects_missing_group() {
    assert!(Cli::try_parse_from(["mvnget", "run"]).is_err());
    assert!(Cli::try_parse_from(["mvnget", "run", "org.foo", "-t", "many"]).is_err());
}

#[test]
fn flags_override_config() {
    let cfg = MvngetConfig {
        exclude: vec!["sources".to_string()],
        ..MvngetConfig::default()
    };
    let a = run_args(&["mvnget", "run", "org.foo", "-t", "3", "--depth", "5", "--exclude", "boot", "--fresh"]);
    let crawl = commands::resolve(&cfg, &a, CancelToken::new()).unwrap();
    assert_eq!(crawl.workers, 3);
    assert_eq!(crawl.max_depth, 5);
    assert_eq!(crawl.exclude, vec!["sources", "boot"]);
    assert!(!crawl.resume);
    assert!(!crawl.dry_run);
}

#[test]
fn zero_threads_is_rejected() {
    let a = run_args(&["mvnget", "run", "org.foo", "-t", "0"]);
    assert!(commands::resolve(&MvngetConfig::default(), &a, CancelToken::new()).is_err());
}

#[test]
fn status_on_empty_dir_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    commands::run_status(dir.path()).unwrap();
}
