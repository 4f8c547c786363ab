//! SmartOne Android CLI
//!
//! Resolves build variants and drives the Gradle build for SmartOne Android.

use anyhow::Result;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde::Serialize;
use smartone_android::gradle::{self, ArtifactKind};
use smartone_android::packaging::PackagingPolicy;
use smartone_android::{ResolvedConfig, Variant, VariantResolver};
use smartone_cli::output::{self, format_count, format_duration, yes_no, Status};
use smartone_cli::progress;
use smartone_core::config::{Config, DependencyConfiguration};
use smartone_core::error::{exit_codes, Error, ErrorReport};
use smartone_core::validation::{validate_keystores, validate_project};
use smartone_telemetry::TelemetryConfig;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "smartone-android")]
#[command(about = "Build-variant resolution and Gradle tooling for SmartOne Android")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one flavor/build type pair
    Resolve {
        /// Flavor: dev, prod
        flavor: String,
        /// Build type: debug, release
        build_type: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve every variant
    Variants {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the build configuration
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the Gradle tasks for a variant
    Tasks {
        /// Flavor: dev, prod
        flavor: String,
        /// Build type: debug, release
        build_type: String,
    },

    /// Resolve a variant and build it with Gradle
    Build {
        /// Flavor: dev, prod
        flavor: String,
        /// Build type: debug, release
        build_type: String,
        /// Build bundle (AAB) instead of APK
        #[arg(long)]
        bundle: bool,
        /// Clean before building
        #[arg(long)]
        clean: bool,
        /// Stream Gradle output instead of showing a spinner
        #[arg(long)]
        stream: bool,
        /// Android project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// Show packaging exclusions or classify archive entries
    Packaging {
        /// Archive entries to classify
        paths: Vec<String>,
    },

    /// List declared dependencies
    Deps {
        /// Only show one configuration (e.g. implementation, kapt)
        #[arg(long)]
        configuration: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    smartone_telemetry::init_with_config(TelemetryConfig::for_cli(cli.verbose, cli.quiet))?;

    let exit_code = match cli.command {
        // Needs no configuration
        Commands::Tasks { flavor, build_type } => run_tasks(&flavor, &build_type),
        command => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                tracing::debug!(config = ?config.path, "Configuration loaded");
                run_with_config(&config, command)
            }
            Err(e) => fail(&e, false),
        },
    };

    std::process::exit(exit_code);
}

fn run_with_config(config: &Config, command: Commands) -> i32 {
    match command {
        Commands::Resolve { flavor, build_type, json } => {
            run_resolve(config, &flavor, &build_type, json)
        }
        Commands::Variants { json } => run_variants(config, json),
        Commands::Check { json } => run_check(config, json),
        Commands::Tasks { flavor, build_type } => run_tasks(&flavor, &build_type),
        Commands::Build { flavor, build_type, bundle, clean, stream, project_dir } => {
            let options = BuildOptions { bundle, clean, stream };
            run_build(config, &flavor, &build_type, options, &project_dir)
        }
        Commands::Packaging { paths } => run_packaging(config, &paths),
        Commands::Deps { configuration } => run_deps(config, configuration.as_deref()),
    }
}

/// Report a failure and return its exit code
fn fail(err: &Error, json: bool) -> i32 {
    if json {
        if let Err(e) = output::print_json(&err.to_report()) {
            Status::error(&format!("Failed to serialize error: {}", e));
        }
    } else {
        output::print_error(err);
    }
    err.code.exit_code()
}

fn emit_json<T: Serialize>(value: &T) -> i32 {
    match output::print_json(value) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            Status::error(&format!("Failed to serialize output: {}", e));
            exit_codes::FAILURE
        }
    }
}

fn run_resolve(config: &Config, flavor: &str, build_type: &str, json: bool) -> i32 {
    match VariantResolver::new(&config.project).resolve_named(flavor, build_type) {
        Ok(resolved) if json => emit_json(&resolved),
        Ok(resolved) => {
            print_resolved(&resolved);
            exit_codes::SUCCESS
        }
        Err(e) => fail(&e, json),
    }
}

fn print_resolved(resolved: &ResolvedConfig) {
    Status::header(&format!("Variant {}", resolved.variant_name));
    Status::field("application id", &resolved.application_id);
    Status::field("app name", &resolved.app_name);
    Status::field(
        "version",
        format!("{} ({})", resolved.version_name, resolved.version_code),
    );
    Status::field(
        "sdk",
        format!(
            "min {} / target {} / compile {}",
            resolved.min_sdk, resolved.target_sdk, resolved.compile_sdk
        ),
    );
    Status::field("debuggable", yes_no(resolved.debuggable));
    Status::field("minify / obfuscate", yes_no(resolved.minify_enabled));
    Status::field("shrink resources", yes_no(resolved.shrink_resources));
    Status::field("pseudo locales", yes_no(resolved.pseudo_locales_enabled));
    Status::field("proguard files", resolved.proguard_files.join(", "));
    Status::field("abi filters", resolved.abi_filters.join(", "));
    Status::field("ndk", &resolved.ndk_version);

    let compile = &resolved.compile;
    Status::field(
        "java / kotlin target",
        format!("{} / {}", compile.java_target_compatibility, compile.kotlin_jvm_target),
    );
    Status::field("desugaring", yes_no(compile.core_library_desugaring));

    let features = &resolved.build_features;
    let enabled: Vec<&str> = [
        ("viewBinding", features.view_binding),
        ("buildConfig", features.build_config),
        ("dataBinding", features.data_binding),
        ("compose", features.compose),
    ]
    .into_iter()
    .filter_map(|(name, on)| on.then_some(name))
    .collect();
    Status::field("build features", enabled.join(", "));

    let signing = &resolved.signing;
    let identity = format!("{} ({}, alias {})", signing.name, signing.store_file, signing.key_alias);
    if signing.is_debug() {
        Status::field("signing", identity.yellow());
    } else {
        Status::field("signing", identity);
    }
}

#[derive(Serialize)]
struct VariantOutcome {
    variant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<ResolvedConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
}

fn run_variants(config: &Config, json: bool) -> i32 {
    let outcomes = VariantResolver::new(&config.project).try_resolve_each();
    let failures = outcomes.iter().filter(|(_, r)| r.is_err()).count();

    if json {
        let report: Vec<VariantOutcome> = outcomes
            .into_iter()
            .map(|(variant, result)| {
                let (config, error) = match result {
                    Ok(resolved) => (Some(resolved), None),
                    Err(e) => (None, Some(e.to_report())),
                };
                VariantOutcome {
                    variant: variant.name(),
                    config,
                    error,
                }
            })
            .collect();
        let code = emit_json(&report);
        if code != exit_codes::SUCCESS || failures == 0 {
            return code;
        }
        return exit_codes::VARIANT_ERROR;
    }

    for (variant, result) in &outcomes {
        match result {
            Ok(resolved) => Status::success(&format!(
                "{:<12} {}  {}",
                variant.name(),
                resolved.application_id,
                resolved.version_name.dimmed()
            )),
            Err(e) => Status::error(&format!("{:<12} [{}] {}", variant.name(), e.code, e.message)),
        }
    }

    println!();
    if failures == 0 {
        Status::success(&format!(
            "{} resolved",
            format_count(outcomes.len(), "variant", "variants")
        ));
        exit_codes::SUCCESS
    } else {
        Status::error(&format!(
            "{} failed to resolve",
            format_count(failures, "variant", "variants")
        ));
        exit_codes::VARIANT_ERROR
    }
}

fn run_check(config: &Config, json: bool) -> i32 {
    let mut result = validate_project(&config.project);
    result.merge(PackagingPolicy::validate(&config.project.packaging));
    result.merge(validate_keystores(&config.project, config.base_dir()));

    let code = if result.is_valid() {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_ERROR
    };

    if json {
        let emitted = emit_json(&result);
        return if emitted == exit_codes::SUCCESS { code } else { emitted };
    }

    match &config.path {
        Some(path) => Status::info(&format!("Checking {}", path.display())),
        None => Status::info("Checking built-in defaults"),
    }

    output::print_findings(result.errors(), result.warnings());

    if result.is_valid() {
        Status::success(&format!(
            "Configuration valid ({})",
            format_count(result.warnings().len(), "warning", "warnings")
        ));
    } else {
        Status::error(&format!(
            "Configuration invalid ({})",
            format_count(result.errors().len(), "error", "errors")
        ));
    }
    code
}

fn run_tasks(flavor: &str, build_type: &str) -> i32 {
    match Variant::parse(flavor, build_type) {
        Ok(variant) => {
            for task in gradle::variant_tasks(variant) {
                println!("{}", task);
            }
            exit_codes::SUCCESS
        }
        Err(e) => fail(&e, false),
    }
}

struct BuildOptions {
    bundle: bool,
    clean: bool,
    stream: bool,
}

fn run_build(
    config: &Config,
    flavor: &str,
    build_type: &str,
    options: BuildOptions,
    project_dir: &Path,
) -> i32 {
    let resolved = match VariantResolver::new(&config.project).resolve_named(flavor, build_type) {
        Ok(resolved) => resolved,
        Err(e) => return fail(&e, false),
    };

    if !gradle::has_wrapper(project_dir) {
        return fail(&gradle::missing_wrapper(project_dir), false);
    }

    if options.clean {
        Status::info("Cleaning...");
        match gradle::clean(project_dir) {
            Ok(r) if r.success => {}
            Ok(r) => {
                Status::error("Clean failed");
                eprintln!("{}", r.combined_output());
                return exit_codes::FAILURE;
            }
            Err(e) => return fail(&e, false),
        }
    }

    let kind = if options.bundle { ArtifactKind::Bundle } else { ArtifactKind::Apk };
    let task = gradle::task_name(kind, resolved.variant());
    let started = Instant::now();

    let outcome = if options.stream {
        Status::info(&format!("Running {}", task));
        gradle::run_task_streaming(project_dir, &task)
    } else {
        let spinner = progress::spinner(&format!("Running {}...", task));
        let outcome = gradle::build_variant(project_dir, kind, &resolved).map(|_| ());
        match &outcome {
            Ok(()) => progress::finish_success(&spinner, &task),
            Err(_) => progress::finish_error(&spinner, &task),
        }
        outcome
    };

    match outcome {
        Ok(()) => {
            Status::success(&format!(
                "Built {} in {}",
                resolved.variant_name,
                format_duration(started.elapsed())
            ));
            Status::field("artifact", gradle::artifact_path(kind, &resolved).display());
            exit_codes::SUCCESS
        }
        Err(e) => fail(&e, false),
    }
}

fn run_packaging(config: &Config, paths: &[String]) -> i32 {
    let policy = match PackagingPolicy::from_config(&config.project.packaging) {
        Ok(policy) => policy,
        Err(e) => return fail(&e, false),
    };

    if paths.is_empty() {
        for glob in policy.globs() {
            println!("{}", glob);
        }
        return exit_codes::SUCCESS;
    }

    for path in paths {
        if policy.is_excluded(path) {
            println!("{} {}", "exclude".red(), path);
        } else {
            println!("{} {}", "keep   ".green(), path);
        }
    }
    exit_codes::SUCCESS
}

fn run_deps(config: &Config, configuration: Option<&str>) -> i32 {
    let filter = match configuration {
        Some(name) => match DependencyConfiguration::from_name(name) {
            Some(c) => Some(c),
            None => {
                let allowed: Vec<&str> =
                    DependencyConfiguration::ALL.iter().map(|c| c.as_str()).collect();
                Status::error(&format!(
                    "Unknown configuration '{}'. Use one of: {}",
                    name,
                    allowed.join(", ")
                ));
                return exit_codes::FAILURE;
            }
        },
        None => None,
    };

    for dep in &config.project.dependencies {
        if filter.is_none_or(|c| c == dep.configuration) {
            println!("{:<26} {}", dep.configuration.as_str().dimmed(), dep.coordinate);
        }
    }
    exit_codes::SUCCESS
}
