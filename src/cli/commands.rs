use crate::{
    cli::args::{CreateArgs, RunArgs},
    core::{
        catalog::{CatalogOptions, TestCatalog},
        coordinator::{self, effective_concurrency, RunOptions},
        document::{parse_documents, Node},
        transform::plugins::{self, PluginReport},
        transform::TransformRegistry,
        ConfigLoader, HttpTransport, ResultsProcessor, RunConfig, Transport,
    },
    Result,
};
use anyhow::{anyhow, Context};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Configuration plus the registry every command builds the same way.
struct Session {
    config: RunConfig,
    registry: TransformRegistry,
    plugins: PluginReport,
}

impl Session {
    fn open(config_path: &Path) -> Result<Self> {
        let config = ConfigLoader::load(config_path)?;
        let (registry, plugins) =
            plugins::load_registry(config.extension_precedence, &config.extensions_dir);
        Ok(Session {
            config,
            registry,
            plugins,
        })
    }
}

pub async fn run(config_path: &Path, args: RunArgs) -> Result<()> {
    let session = Session::open(config_path)?;
    let mut config = session.config;
    if let Some(concurrent) = args.concurrent {
        config.concurrent = concurrent;
    }
    if args.stop_on_fail {
        config.stop_on_fail = true;
    }

    let settings = ConfigLoader::run_settings(&config)?;
    let catalog = TestCatalog::new(
        session.registry,
        CatalogOptions {
            base_url: settings.base_url.clone(),
        },
    );

    let load = match &args.file {
        Some(file) => {
            if !file.exists() {
                return Err(anyhow!("Test file '{}' not found", file.display()));
            }
            catalog.load_file(file)
        }
        None => catalog.load_all(&config.tests_dir),
    };

    let mut cases = load.cases;
    if let Some(name) = &args.name {
        cases.retain(|case| &case.name == name);
        if cases.is_empty() {
            return Err(anyhow!("Test '{}' not found", name));
        }
    }
    if cases.is_empty() {
        println!("No tests found");
        return Ok(());
    }

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(settings.timeout)?);
    let options = RunOptions {
        max_concurrent: config.concurrent,
        stop_on_fail: config.stop_on_fail,
        settings,
    };
    let cases = cases.into_iter().map(Arc::new).collect();
    let report = coordinator::run_all(cases, transport, options).await;

    let processor = ResultsProcessor::new(args.verbose);
    let rendered = processor.generate_report(&report, args.format)?;
    println!("{}", rendered.trim_end());

    if report.success() {
        Ok(())
    } else {
        Err(anyhow!("{} test(s) failed", report.failed))
    }
}

/// One row of `apiprobe list`, read from the raw documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestListing {
    pub file: String,
    pub name: String,
    pub url: String,
    pub method: String,
}

pub fn list_tests(dir: &Path) -> Result<Vec<TestListing>> {
    let mut listings = Vec::new();
    for path in TestCatalog::source_files(dir)? {
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!("Error reading {}: {}", path.display(), err);
                continue;
            }
        };
        let documents = match parse_documents(&source) {
            Ok(documents) => documents,
            Err(err) => {
                tracing::warn!("Error reading {}: {}", path.display(), err);
                continue;
            }
        };
        for (index, document) in documents.iter().enumerate() {
            if document.as_map().is_none() {
                continue;
            }
            let text = |key: &str| document.get(key).and_then(Node::scalar_text);
            listings.push(TestListing {
                file: file.clone(),
                name: text("name").unwrap_or_else(|| format!("{}#{}", file, index + 1)),
                url: text("relative-url")
                    .or_else(|| text("url"))
                    .unwrap_or_else(|| "N/A".to_string()),
                method: text("type")
                    .map(|method| method.to_uppercase())
                    .unwrap_or_else(|| "GET".to_string()),
            });
        }
    }
    Ok(listings)
}

pub fn list(config_path: &Path) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    if !config.tests_dir.exists() {
        return Err(anyhow!(
            "No test configurations found in {}",
            config.tests_dir.display()
        ));
    }

    let listings = list_tests(&config.tests_dir)?;
    println!("{:<24} {:<32} {:<8} URL", "FILE", "TEST NAME", "METHOD");
    for listing in &listings {
        println!(
            "{:<24} {:<32} {:<8} {}",
            listing.file, listing.name, listing.method, listing.url
        );
    }
    println!("\n{} test(s)", listings.len());
    Ok(())
}

pub fn extensions(config_path: &Path) -> Result<()> {
    let session = Session::open(config_path)?;
    let listing = session.registry.list();

    println!("🔧 Available Extensions\n");
    if !listing.builtin.is_empty() {
        println!("📦 Core Extensions:");
        for name in &listing.builtin {
            println!("  • {}", name);
        }
        println!();
    }
    if !listing.user.is_empty() {
        println!("👤 User Extensions:");
        for name in &listing.user {
            println!("  • {}", name);
        }
        println!();
    }
    println!("⚖️  Extension Precedence: {}", listing.precedence);
    for warning in &session.plugins.warnings {
        println!("⚠️  {}", warning);
    }
    Ok(())
}

pub fn info(config_path: &Path) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    let concurrent = if config.concurrent == 0 {
        format!("auto ({})", effective_concurrency(0))
    } else {
        config.concurrent.to_string()
    };

    let rows = [
        (
            "Base URL",
            config
                .base_url
                .clone()
                .unwrap_or_else(|| "Not set".to_string()),
        ),
        ("Concurrent Requests", concurrent),
        ("Timeout", format!("{}s", config.timeout)),
        ("Retries", config.retries.to_string()),
        ("Retry Backoff", format!("{}ms", config.retry_backoff_ms)),
        ("Trim Bodies", config.trim.to_string()),
        ("Stop On Fail", config.stop_on_fail.to_string()),
        (
            "Extension Precedence",
            config.extension_precedence.to_string(),
        ),
        ("Config File", config_path.display().to_string()),
        ("Tests Directory", config.tests_dir.display().to_string()),
        (
            "Extensions Directory",
            config.extensions_dir.display().to_string(),
        ),
    ];
    for (property, value) in rows {
        println!("{:<22} {}", property, value);
    }

    println!("\n🌱 Environment Overrides:");
    for line in ConfigLoader::env_var_documentation() {
        println!("  {}", line);
    }
    Ok(())
}

#[derive(Serialize)]
struct NewTest<'a> {
    name: &'a str,
    #[serde(rename = "relative-url")]
    relative_url: &'a str,
    #[serde(rename = "type")]
    method: String,
    expected: NewExpectation,
}

#[derive(Serialize)]
struct NewExpectation {
    status: u16,
    #[serde(rename = "content-type")]
    content_type: &'static str,
    response: NewResponse,
}

#[derive(Serialize)]
struct NewResponse {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'static str,
}

/// File a new test named `name` is written to.
pub fn test_file_path(tests_dir: &Path, name: &str) -> PathBuf {
    tests_dir.join(format!("{}.yaml", name.to_lowercase().replace(' ', "_")))
}

pub fn create(config_path: &Path, args: CreateArgs) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    let path = test_file_path(&config.tests_dir, &args.name);
    if path.exists() && !args.force {
        return Err(anyhow!(
            "{} already exists; pass --force to replace it",
            path.display()
        ));
    }

    let test = NewTest {
        name: &args.name,
        relative_url: &args.url,
        method: args.method.to_uppercase(),
        expected: NewExpectation {
            status: 200,
            content_type: "application/json",
            response: NewResponse {
                kind: "contains",
                value: "success",
            },
        },
    };
    let yaml = serde_yaml::to_string(&test).context("failed to render test document")?;

    fs::create_dir_all(&config.tests_dir).with_context(|| {
        format!(
            "failed to create tests directory {}",
            config.tests_dir.display()
        )
    })?;
    fs::write(&path, yaml).with_context(|| format!("failed to write {}", path.display()))?;

    tracing::debug!("created test document {}", path.display());
    println!("✅ Created test: {}", path.display());
    println!("📝 Edit {} to customize expectations", path.display());
    Ok(())
}
