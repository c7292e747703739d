use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use statickit_core::config::LoggingConfig;
use statickit_core::derive_view;
use statickit_core::presets::preset_by_slug;
use statickit_core::presets::size_target;
use statickit_core::presets::PRESETS;
use statickit_core::presets::SIZE_TARGETS;
use statickit_core::AspectRatio;
use statickit_core::Branch;
use statickit_core::BranchId;
use statickit_core::Config;
use statickit_core::Dimensions;
use statickit_core::EditorState;
use statickit_core::EditorView;
use statickit_core::GenerationOptions;
use statickit_core::ImageModel;
use statickit_core::NodeStatus;
use statickit_core::RequestKind;
use statickit_core::SizeLabel;
use statickit_core::UserAction;
use statickit_core::VariantStatus;
use statickit_exec::resolve_image_source;
use statickit_exec::EditorRuntime;
use statickit_exec::HttpImageService;
use statickit_exec::ImageService;
use statickit_exec::SimulatedImageService;
use tracing_subscriber::EnvFilter;

/// AI image editing with a branching version history.
#[derive(Parser, Debug)]
#[command(name = "statickit", version)]
struct Cli {
    /// Config file (TOML or YAML). Defaults to the user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload an image and run edits against it concurrently.
    Edit(EditArgs),
    /// List the style presets and resize targets.
    Presets,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Local file or http(s) URL.
    #[arg(long)]
    image: String,

    /// Free-form edit instruction. Repeatable.
    #[arg(long = "prompt")]
    prompts: Vec<String>,

    /// Preset slug, see `statickit presets`. Repeatable.
    #[arg(long = "preset")]
    presets: Vec<String>,

    /// Replace only the background with this description.
    #[arg(long)]
    background: Option<String>,

    /// Replace the person in the image with this description.
    #[arg(long)]
    model: Option<String>,

    /// Resize target slug, `WxH`, or `label=WxH`. Repeatable.
    #[arg(long = "resize")]
    resizes: Vec<String>,

    /// Image model: flash or pro.
    #[arg(long)]
    engine: Option<ImageModel>,

    #[arg(long)]
    aspect_ratio: Option<AspectRatio>,

    /// Image service base URL. Overrides the config file.
    #[arg(long)]
    endpoint: Option<String>,

    /// Use the offline simulated service.
    #[arg(long)]
    simulate: bool,

    /// Print the final state as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Command::Edit(args) => run_edit(args, &config).await,
        Command::Presets => {
            print_presets();
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path).with_context(|| format!("loading {}", path.display()));
    }
    match default_config_path() {
        Some(path) if path.exists() => {
            Config::load(&path).with_context(|| format!("loading {}", path.display()))
        }
        _ => Ok(Config::default()),
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("statickit").join("config.toml"))
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_service(args: &EditArgs, config: &Config) -> Arc<dyn ImageService> {
    let endpoint = args.endpoint.clone().or_else(|| config.service.endpoint.clone());
    match endpoint {
        Some(endpoint) if !args.simulate && !config.service.simulate => {
            let api_key = std::env::var(&config.service.api_key_env).ok();
            if api_key.is_none() {
                tracing::warn!(var = %config.service.api_key_env, "no API key set");
            }
            tracing::info!(%endpoint, "using image service");
            Arc::new(HttpImageService::new(endpoint, api_key))
        }
        None if !args.simulate && !config.service.simulate => {
            tracing::warn!("no endpoint configured, falling back to the simulated service");
            Arc::new(SimulatedImageService::new())
        }
        _ => Arc::new(SimulatedImageService::new()),
    }
}

fn collect_requests(args: &EditArgs) -> Result<Vec<RequestKind>> {
    let mut requests = Vec::new();
    for instruction in &args.prompts {
        requests.push(RequestKind::Edit {
            source_index: 0,
            instruction: instruction.clone(),
        });
    }
    for slug in &args.presets {
        let preset = preset_by_slug(slug)
            .with_context(|| format!("unknown preset {slug:?}, see `statickit presets`"))?;
        requests.push(RequestKind::PresetApply {
            source_index: 0,
            preset: preset.id,
        });
    }
    if let Some(background) = &args.background {
        requests.push(RequestKind::BackgroundChange {
            source_index: 0,
            background: background.clone(),
        });
    }
    if let Some(model) = &args.model {
        requests.push(RequestKind::ModelChange {
            source_index: 0,
            model: model.clone(),
        });
    }
    for raw in &args.resizes {
        let (label, dims) = parse_resize(raw)?;
        requests.push(RequestKind::Resize { label, dims });
    }
    Ok(requests)
}

fn parse_resize(raw: &str) -> Result<(SizeLabel, Dimensions)> {
    if let Some((label, dims)) = raw.split_once('=') {
        let dims: Dimensions = dims.parse()?;
        return Ok((SizeLabel::from(label.trim()), dims));
    }
    if let Some(target) = size_target(raw) {
        return Ok((target.size_label(), target.dims));
    }
    let dims: Dimensions = raw
        .parse()
        .with_context(|| format!("unknown resize target {raw:?}"))?;
    Ok((SizeLabel(dims.to_string()), dims))
}

async fn run_edit(args: EditArgs, config: &Config) -> Result<()> {
    let requests = collect_requests(&args)?;
    let service = build_service(&args, config);
    let mut settings = config.engine_settings();
    if let Some(model) = args.engine {
        settings.default_options.model = model;
    }
    let options = GenerationOptions {
        aspect_ratio: args.aspect_ratio.or(settings.default_options.aspect_ratio),
        model: settings.default_options.model,
    };

    let image_url = resolve_image_source(&args.image).await?;
    let label = Path::new(&args.image)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("Original")
        .to_string();

    let mut runtime = EditorRuntime::new(EditorState::new(settings), service);
    runtime.dispatch(UserAction::Upload { image_url, label })?;
    for request in requests {
        let kind = request.label();
        runtime
            .dispatch(UserAction::Submit {
                branch_id: BranchId::root(),
                request,
                options: Some(options),
            })
            .with_context(|| format!("submitting {kind} request"))?;
    }
    runtime.run_until_idle().await;

    let state = runtime.into_state();
    let view = derive_view(&state).context("session closed unexpectedly")?;
    let branch = state
        .branch(&view.active_branch_id)
        .context("active branch missing")?;
    if args.json {
        print_json(&view, branch)?;
    } else {
        print_history(&view, branch);
    }
    Ok(())
}

#[derive(Serialize)]
struct Report<'a> {
    view: &'a EditorView,
    branch: &'a Branch,
}

fn print_json(view: &EditorView, branch: &Branch) -> Result<()> {
    let report = Report { view, branch };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_history(view: &EditorView, branch: &Branch) {
    println!("{} ({} versions)", branch.name(), branch.len());
    for (index, node) in branch.nodes().iter().enumerate() {
        let marker = if index == view.cursor { '>' } else { ' ' };
        let prompt = node.prompt().unwrap_or("original upload");
        let outcome = match (node.status(), node.image_url(), node.failure()) {
            (NodeStatus::Completed, Some(url), _) => short_url(url),
            (NodeStatus::Failed, _, Some(failure)) => format!("failed: {failure}"),
            (status, _, _) => status.label().to_string(),
        };
        println!("{marker} {index:>2}  {prompt}\n      {outcome}");
    }
    for (label, variant) in branch.resized_variants() {
        let outcome = match &variant.status {
            VariantStatus::Completed { image_url } => short_url(image_url),
            VariantStatus::Error { failure } => format!("failed: {failure}"),
            status => status.label().to_string(),
        };
        println!("  {label} {}  {outcome}", variant.dims);
    }
    println!(
        "{} files ready to download, {} still in flight",
        view.download_file_count, view.in_flight
    );
}

/// Inline images are far too long for a terminal.
fn short_url(url: &str) -> String {
    match url.split_once(";base64,") {
        Some((head, data)) if url.starts_with("data:") => {
            format!("{head} ({} base64 chars)", data.len())
        }
        _ => url.to_string(),
    }
}

fn print_presets() {
    println!("Presets:");
    for preset in PRESETS.iter() {
        println!("  {:<18} {}", preset.slug, preset.label);
    }
    println!("\nResize targets:");
    for target in SIZE_TARGETS.iter() {
        println!("  {:<20} {:<11} {}", target.slug, target.dims.to_string(), target.label);
    }
}
