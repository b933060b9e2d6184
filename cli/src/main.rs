mod test_runner;

use std::fmt;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use migrate::export::{ExportFile, export_snapshot};
use migrate::import::Importer;
use migrate::seed::{LISTING_PATH, legacy_pages, seed_pages, seed_targets};
use migrate::store::{LocalStore, RecordStore};
use migrate::MigrationConfig;
use reservations::notify::{ChatConfig, DryRunNotifier};
use reservations::request::{AccessRequest, submit};
use reservations::target::{Listing, parse_listing};

#[derive(Parser)]
#[command(name = "otahoas", version, about = "OtaHoas site content tooling")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Migration config (defaults to ./otahoas.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output; repeat for more
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a plain text file into a rich-text document
    Convert(ConvertArgs),

    /// Replay an export file into a store, remapping references
    Import(ImportArgs),

    /// Write a store's contents to an export file
    Export(ExportArgs),

    /// Delete every record of the given collections
    Reset(ResetArgs),

    /// Parse a legacy target listing (listat.txt)
    Targets(TargetsArgs),

    /// Submit an access request (dry run: the chat message is printed)
    Request(RequestArgs),

    /// Seed pages and reservation targets from the old static site
    Seed(SeedArgs),

    /// Run .test.txt converter fixtures
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Plain text file to convert
    file: PathBuf,

    /// Render HTML instead of JSON
    #[arg(long, conflicts_with_all = ["ast", "outline"])]
    html: bool,

    /// Dump the document tree
    #[arg(long, conflicts_with = "outline")]
    ast: bool,

    /// Print a plain-text outline of the blocks
    #[arg(long)]
    outline: bool,
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Export file produced by `otahoas export`
    export: PathBuf,

    /// Store file to import into (created if missing)
    #[arg(long)]
    store: PathBuf,

    /// Directory the configured media sources are relative to
    #[arg(long, default_value = ".")]
    media_root: PathBuf,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Store file to read
    #[arg(long)]
    store: PathBuf,

    /// Where to write the export
    #[arg(short, long, default_value = "seed-data.json")]
    output: PathBuf,
}

#[derive(clap::Args)]
struct ResetArgs {
    /// Store file to modify
    #[arg(long)]
    store: PathBuf,

    /// Collections to empty
    #[arg(required = true)]
    collections: Vec<String>,
}

#[derive(clap::Args)]
struct TargetsArgs {
    /// Listing file, one `prefix;labelFi;labelEn` per line
    file: PathBuf,

    /// Print the targets as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct RequestArgs {
    /// Access request as JSON
    request: PathBuf,

    /// Listing file the request's target is looked up in
    #[arg(long)]
    targets: PathBuf,
}

#[derive(clap::Args)]
struct SeedArgs {
    /// Store file to seed (created if missing)
    #[arg(long)]
    store: PathBuf,

    /// Root of the old static site (its `public` directory)
    #[arg(long)]
    old_site: PathBuf,

    /// Directory holding translated page texts
    #[arg(long, default_value = "content")]
    content: PathBuf,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.txt file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.no_color);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Command::Convert(args) => do_convert(args),
        Command::Import(args) => do_import(args, &load_config(cli.config.as_deref())),
        Command::Export(args) => do_export(args, &load_config(cli.config.as_deref())),
        Command::Reset(args) => do_reset(args),
        Command::Targets(args) => do_targets(args, color_choice),
        Command::Request(args) => do_request(args, color_choice),
        Command::Seed(args) => do_seed(args, &load_config(cli.config.as_deref()), color_choice),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_logging(verbose: u8, no_color: bool) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .init();
}

/// Print `error: ...` and exit 1.
fn fail(message: impl fmt::Display) -> ! {
    eprintln!("error: {}", message);
    process::exit(1);
}

fn read_source(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("cannot read '{}': {}", path.display(), e)))
}

fn load_config(path: Option<&Path>) -> MigrationConfig {
    MigrationConfig::discover(path).unwrap_or_else(|e| fail(e))
}

fn open_store(path: &Path) -> LocalStore {
    LocalStore::open(path)
        .unwrap_or_else(|e| fail(format!("cannot open store '{}': {}", path.display(), e)))
}

fn save_store(store: &mut LocalStore) {
    if let Err(e) = store.save() {
        let path = store.path().map(|p| p.display().to_string()).unwrap_or_default();
        fail(format!("cannot save store '{}': {}", path, e));
    }
}

fn do_convert(args: ConvertArgs) {
    let source = read_source(&args.file);
    let document = richtext::text_to_document(&source);

    if args.html {
        print!("{}", document.to_html());
        return;
    }
    if args.ast {
        println!("{:#?}", document);
        return;
    }
    if args.outline {
        println!("{}", document);
        return;
    }
    match serde_json::to_string_pretty(&document) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}

fn do_import(args: ImportArgs, config: &MigrationConfig) {
    // A missing export must stop the run before the store is touched.
    let export = ExportFile::load(&args.export).unwrap_or_else(|e| fail(e));
    let mut store = open_store(&args.store);

    let report = {
        let mut importer = Importer::new(&mut store, config)
            .unwrap_or_else(|e| fail(e))
            .with_media_root(&args.media_root);
        let report = importer.run(&export);
        info!(mappings = importer.mapping().len(), "import finished");
        report
    };
    save_store(&mut store);

    print!("{}", report);
    if report.total_failed() > 0 {
        warn!(failed = report.total_failed(), "some records failed to import");
    }
}

fn do_export(args: ExportArgs, config: &MigrationConfig) {
    let store = open_store(&args.store);
    let export = export_snapshot(&store, config).unwrap_or_else(|e| fail(e));
    if let Err(e) = export.save(&args.output) {
        fail(e);
    }
    info!(path = %args.output.display(), "export written");
}

fn do_reset(args: ResetArgs) {
    let mut store = open_store(&args.store);
    for collection in &args.collections {
        match store.clear(collection) {
            Ok(removed) => println!("{}: {} removed", collection, removed),
            Err(e) => fail(format!("cannot clear {}: {}", collection, e)),
        }
    }
    save_store(&mut store);
}

/// Parse a listing file, printing its warnings as diagnostics.
fn read_listing(path: &Path, color_choice: ColorChoice) -> Listing {
    let source = read_source(path);
    let mut files = SimpleFiles::new();
    let file_id = files.add(path.display().to_string(), source.clone());
    let listing = parse_listing(&source, file_id);

    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for diagnostic in &listing.diagnostics {
        let _ = term::emit_to_write_style(
            &mut writer.lock(),
            &config,
            &files,
            &diagnostic.to_diagnostic(),
        );
    }
    listing
}

fn do_targets(args: TargetsArgs, color_choice: ColorChoice) {
    let listing = read_listing(&args.file, color_choice);

    if args.json {
        match serde_json::to_string_pretty(&listing.targets) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
        return;
    }
    for target in &listing.targets {
        println!(
            "{:>3}  {:<24} {:<26} {} / {}",
            target.sort_order,
            target.email_prefix,
            target.category.label(),
            target.label_fi,
            target.label_en
        );
    }
}

fn do_request(args: RequestArgs, color_choice: ColorChoice) {
    let request: AccessRequest = serde_json::from_str(&read_source(&args.request))
        .unwrap_or_else(|e| fail(format!("invalid request: {}", e)));
    let listing = read_listing(&args.targets, color_choice);

    let mut notifier = DryRunNotifier::new(ChatConfig::from_env());
    let target = request.target_in(&listing).unwrap_or_else(|e| fail(e));
    let submission = submit(&request, target, &mut notifier).unwrap_or_else(|e| fail(e));

    for body in notifier.sent() {
        match serde_json::to_string_pretty(body) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
    }
    eprintln!("{}: {}", submission.status, submission.response_message());
    if !submission.succeeded() {
        process::exit(1);
    }
}

fn do_seed(args: SeedArgs, config: &MigrationConfig, color_choice: ColorChoice) {
    if !args.old_site.is_dir() {
        fail(format!("old site not found at {}", args.old_site.display()));
    }
    info!(path = %args.old_site.display(), "seeding from old site");
    let mut store = open_store(&args.store);

    let listing_path = args.old_site.join(LISTING_PATH);
    if listing_path.is_file() {
        let listing = read_listing(&listing_path, color_choice);
        if let Err(e) = seed_targets(&mut store, &listing) {
            fail(format!("cannot seed reservation targets: {}", e));
        }
    } else {
        error!(path = %listing_path.display(), "target listing not found, skipping targets");
    }

    let pages = legacy_pages(&args.old_site, &args.content);
    match seed_pages(&mut store, &pages, config) {
        Ok(created) => info!(created = created.len(), "finished seeding content pages"),
        Err(e) => fail(format!("cannot seed pages: {}", e)),
    }
    save_store(&mut store);
}
