use anyhow::{bail, Context};
use case_review_builder::llm::OpenAiClient;
use case_review_builder::prompts::{PROMPT_TEMPLATE, SYSTEM_PROMPT};
use case_review_builder::*;
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "case-review", version, about = "Draft GP portfolio case reviews with an LLM")]
struct Cli {
    /// Capability catalog text file (defaults to the built-in taxonomy)
    #[arg(long, global = true, env = "CASE_REVIEW_CATALOG")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the capabilities that can be selected
    Capabilities {
        /// Show the descriptive bullet points for each capability
        #[arg(long)]
        details: bool,
    },
    /// Print the prompt that would be sent, without calling the model
    Prompt {
        #[command(flatten)]
        input: CaseInput,
    },
    /// Generate, split and export a case review
    Generate {
        #[command(flatten)]
        input: CaseInput,
        /// System instruction file (defaults to the built-in one)
        #[arg(long)]
        system_prompt: Option<PathBuf>,
        /// Follow-up feedback; each value triggers one revision round
        #[arg(long)]
        improve: Vec<String>,
        /// Also ask the model for a short case title
        #[arg(long)]
        title: bool,
        /// Write the exported text to this file ("auto" derives a name from the title)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the extraction as JSON instead of text
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        extraction: ExtractionArgs,
    },
    /// Split an already generated review text into sections
    Extract {
        /// File with generated text ("-" for stdin)
        #[arg(short, long)]
        input: PathBuf,
        /// Capability to look for (repeat up to three times)
        #[arg(short = 'c', long = "capability", required = true)]
        capabilities: Vec<String>,
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        extraction: ExtractionArgs,
    },
    /// Print the JSON Schema of the extraction output
    Schema,
}

#[derive(Args)]
struct CaseInput {
    /// Case description text
    #[arg(long, conflicts_with = "case_file")]
    case: Option<String>,
    /// File with the case description ("-" for stdin)
    #[arg(long)]
    case_file: Option<PathBuf>,
    /// Capability to assess against (repeat up to three times)
    #[arg(short = 'c', long = "capability", required = true)]
    capabilities: Vec<String>,
    /// Prompt template file with {capabilities} and {case_description} placeholders
    #[arg(long)]
    template: Option<PathBuf>,
}

#[derive(Args)]
struct ExtractionArgs {
    /// End the brief description at its first blank line
    #[arg(long)]
    strict_summary: bool,
}

impl ExtractionArgs {
    fn options(&self) -> ExtractorOptions {
        ExtractorOptions {
            summary_boundary: if self.strict_summary {
                SummaryBoundary::FirstBlankLine
            } else {
                SummaryBoundary::NextHeading
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = Arc::new(load_catalog(cli.catalog.as_deref())?);

    match cli.command {
        Command::Capabilities { details } => {
            for (name, points) in catalog.iter() {
                println!("{}", name);
                if details {
                    for point in points {
                        println!("    {}", point);
                    }
                    println!();
                }
            }
        }
        Command::Prompt { input } => {
            let case = input.case_description()?;
            check_known(&catalog, &input.capabilities)?;
            let template = read_optional(input.template.as_deref(), PROMPT_TEMPLATE)?;
            println!("{}", assemble_prompt(&template, &case, &input.capabilities)?);
        }
        Command::Generate {
            input,
            system_prompt,
            improve,
            title,
            output,
            json,
            extraction,
        } => {
            let settings = GenerationSettings::from_env()?;
            let backend = OpenAiClient::from_env(&settings)?;
            let client = GenerationClient::new(backend, settings);
            let mut session = ReviewSession::new(catalog, client)
                .with_extractor_options(extraction.options());

            session.set_case_description(input.case_description()?);
            session.select_capabilities(&input.capabilities)?;
            if let Some(path) = input.template.as_deref() {
                session.set_prompt_template(read_text(path)?);
            }
            session.set_system_prompt(read_optional(system_prompt.as_deref(), SYSTEM_PROMPT)?);

            eprintln!("Generating case review...");
            session.generate().await?;
            for feedback in &improve {
                eprintln!("Improving case review...");
                session.improve(feedback).await?;
            }
            if title {
                session.generate_title().await?;
            }

            print_warnings(session.warnings());
            let review = session.review().context("no review was produced")?;
            if json {
                let extraction = Extraction {
                    review: review.clone(),
                    warnings: session.warnings().to_vec(),
                };
                println!("{}", serde_json::to_string_pretty(&extraction)?);
            } else {
                if let Some(title) = session.title() {
                    println!("{}\n", title);
                }
                print_review(review);
            }

            if let Some(path) = output {
                let path = if path.as_os_str() == "auto" {
                    PathBuf::from(export_file_name(session.title()))
                } else {
                    path
                };
                std::fs::write(&path, session.export()?)
                    .with_context(|| format!("writing {}", path.display()))?;
                eprintln!("Saved review to {}", path.display());
            }
        }
        Command::Extract {
            input,
            capabilities,
            json,
            extraction,
        } => {
            check_count(&capabilities)?;
            let raw = read_text(&input)?;
            let extractor = SectionExtractor::with_options(&capabilities, extraction.options())?;
            let result = extractor.extract(&raw);
            print_warnings(&result.warnings);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_review(&result.review);
            }
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&extraction_schema()?)?);
        }
    }

    Ok(())
}

impl CaseInput {
    fn case_description(&self) -> anyhow::Result<String> {
        match (&self.case, &self.case_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => read_text(path),
            (None, None) => bail!("provide the case with --case or --case-file"),
        }
    }
}

fn load_catalog(path: Option<&Path>) -> anyhow::Result<CapabilityCatalog> {
    let catalog = match path {
        Some(path) => CapabilityCatalog::parse(&read_text(path)?),
        None => CapabilityCatalog::default_catalog(),
    };
    if catalog.is_empty() {
        bail!("capability catalog is empty");
    }
    Ok(catalog)
}

fn check_known(catalog: &CapabilityCatalog, capabilities: &[String]) -> anyhow::Result<()> {
    if let Some(unknown) = capabilities.iter().find(|c| !catalog.contains(c)) {
        bail!(
            "unknown capability '{}'; run `case-review capabilities` for the list",
            unknown
        );
    }
    Ok(())
}

fn check_count(capabilities: &[String]) -> anyhow::Result<()> {
    if capabilities.len() > MAX_SELECTED_CAPABILITIES {
        bail!(
            "at most {} capabilities can be extracted, got {}",
            MAX_SELECTED_CAPABILITIES,
            capabilities.len()
        );
    }
    Ok(())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_optional(path: Option<&Path>, default: &str) -> anyhow::Result<String> {
    match path {
        Some(path) => read_text(path),
        None => Ok(default.to_string()),
    }
}

fn print_warnings(warnings: &[ExtractionWarning]) {
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
}

fn print_review(review: &CaseReview) {
    println!("Brief Description:\n{}\n", review.brief_description);
    println!("{}", export_text(review));
}
