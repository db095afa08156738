use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use structassert_core::{
    ArrayContainsComparator, JsonDocument, JsonType, ListMode, MatchOptions, SequenceStrategy,
    XmlStructure,
};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "structassert")]
#[command(about = "Check JSON and XML fixtures against partial templates and type rules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a needle JSON file is contained in a haystack JSON file
    Contains {
        /// Expected partial JSON
        needle: PathBuf,

        /// Actual JSON
        haystack: PathBuf,

        /// Match options file (JSON, kebab-case keys)
        #[arg(long)]
        options: Option<PathBuf>,

        /// Sequence matching strategy (overrides the options file)
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },

    /// Check a JSON file against a type-rule tree
    JsonType {
        /// JSON data to check
        data: PathBuf,

        /// Rule tree, e.g. {"id": "integer:>0", "email": "string:!empty"}
        rules: PathBuf,

        /// Match options file (JSON, kebab-case keys)
        #[arg(long)]
        options: Option<PathBuf>,

        /// How a top-level list of records is checked (overrides the options file)
        #[arg(long, value_enum)]
        list_mode: Option<ListModeArg>,
    },

    /// Check an XML file with XPath queries, a shape template or an element locator
    XmlStructure {
        /// XML document to check
        input: PathBuf,

        /// XPath expression that must select something (repeatable)
        #[arg(long)]
        xpath: Vec<String>,

        /// XML template whose tag shape must occur in the document
        #[arg(long)]
        template: Option<PathBuf>,

        /// CSS selector or XPath locating an element to print
        #[arg(long)]
        element: Option<String>,

        /// Output format for the located element
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Evaluate an XPath expression over the XML view of a JSON file
    Xpath {
        /// JSON document
        input: PathBuf,

        /// XPath expression
        expression: String,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Render the XML view of a JSON file
    ToXml {
        /// JSON document
        input: PathBuf,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum StrategyArg {
    Greedy,
    Exhaustive,
}

impl From<StrategyArg> for SequenceStrategy {
    fn from(val: StrategyArg) -> Self {
        match val {
            StrategyArg::Greedy => SequenceStrategy::Greedy,
            StrategyArg::Exhaustive => SequenceStrategy::Exhaustive,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum ListModeArg {
    FirstElement,
    EachElement,
}

impl From<ListModeArg> for ListMode {
    fn from(val: ListModeArg) -> Self {
        match val {
            ListModeArg::FirstElement => ListMode::FirstElement,
            ListModeArg::EachElement => ListMode::EachElement,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Contains {
            needle,
            haystack,
            options,
            strategy,
        } => {
            let mut match_options = load_options(options.as_deref())?;
            if let Some(strategy) = strategy {
                match_options.sequence_strategy = strategy.into();
            }

            let needle_doc = read_json(&needle)?;
            let haystack_doc = read_json(&haystack)?;
            let comparator =
                ArrayContainsComparator::new(haystack_doc.as_node()).with_options(&match_options);

            if !comparator.contains_array(needle_doc.as_node()) {
                let matched = comparator
                    .matched_subset(needle_doc.as_node())
                    .map_or_else(|| "nothing".to_string(), |v| v.to_string());
                bail!(
                    "{} is not contained in {}; matched subset: {}",
                    needle.display(),
                    haystack.display(),
                    matched
                );
            }
            println!("ok");
        }
        Commands::JsonType {
            data,
            rules,
            options,
            list_mode,
        } => {
            let mut match_options = load_options(options.as_deref())?;
            if let Some(list_mode) = list_mode {
                match_options.list_mode = list_mode.into();
            }

            let data_doc = read_json(&data)?;
            let rules_doc = read_json(&rules)?;
            JsonType::new(data_doc.as_node())
                .with_options(&match_options)
                .matches(rules_doc.as_node())
                .with_context(|| format!("{} does not match {}", data.display(), rules.display()))?;
            println!("ok");
        }
        Commands::XmlStructure {
            input,
            xpath,
            template,
            element,
            format,
        } => {
            if xpath.is_empty() && template.is_none() && element.is_none() {
                bail!("Nothing to check: pass --xpath, --template or --element");
            }

            let markup = read_text(&input)?;
            let xml = XmlStructure::new(&markup)
                .with_context(|| format!("Failed to parse XML from: {}", input.display()))?;

            for expression in &xpath {
                if !xml.matches_xpath(expression)? {
                    bail!("XPath '{}' matched nothing in {}", expression, input.display());
                }
            }

            if let Some(path) = template {
                let template_markup = read_text(&path)?;
                let matched = xml
                    .match_xml_structure(&template_markup)
                    .with_context(|| format!("Failed to parse template from: {}", path.display()))?;
                if !matched {
                    bail!(
                        "{} has no element shaped like {}",
                        input.display(),
                        path.display()
                    );
                }
            }

            match element {
                Some(locator) => {
                    let found = xml.match_element(&locator)?;
                    let attributes: serde_json::Map<String, Value> = found
                        .attributes
                        .into_iter()
                        .map(|(name, value)| (name, Value::String(value)))
                        .collect();
                    let out = json!({
                        "name": found.name,
                        "text": found.text,
                        "attributes": attributes,
                        "value": found.value,
                    });
                    write_json(&out, None, format)?;
                }
                None => println!("ok"),
            }
        }
        Commands::Xpath {
            input,
            expression,
            output,
            format,
        } => {
            let doc = read_json(&input)?;
            let result = doc.evaluate_xpath(&expression)?;
            write_json(&result, output.as_ref(), format)?;
        }
        Commands::ToXml { input, output } => {
            let doc = read_json(&input)?;
            let xml = doc.to_xml_string()?;
            let mut writer = open_output(output.as_ref())?;
            writeln!(writer, "{xml}").context("Failed to write XML")?;
        }
    }

    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))
}

fn read_json(path: &Path) -> Result<JsonDocument> {
    let text = read_text(path)?;
    JsonDocument::parse(&text).with_context(|| format!("Failed to parse JSON from: {}", path.display()))
}

fn load_options(path: Option<&Path>) -> Result<MatchOptions> {
    let Some(path) = path else {
        return Ok(MatchOptions::default());
    };
    let file = File::open(path)
        .with_context(|| format!("Failed to open options file: {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse options from: {}", path.display()))
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    })
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer = open_output(path)?;

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    // Ensure trailing newline
    writeln!(writer).context("Failed to write trailing newline")?;

    Ok(())
}
