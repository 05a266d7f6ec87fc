use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use pdf_collate::{
    CollateError, PageId, ResultSequence, SourceId, SourceRegistry, compose, probe_page_count,
};

#[derive(Parser)]
#[command(name = "pdfc", about = "Collate pages from PDF sources into a new document", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge all pages of the inputs, in order
    Merge {
        /// Input PDF file(s) - can specify multiple
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Print export statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Assemble selected pages with an explicit page spec
    Collate {
        /// Input PDF file(s) - can specify multiple
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Comma-separated INPUT:PAGES items, where INPUT is the 1-based
        /// index of an input file and PAGES is a page number or range,
        /// e.g. "1:1-3,2:2,1:5"
        #[arg(short, long)]
        pages: String,

        /// Print export statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show page counts and native page sizes
    Info {
        /// Input PDF file(s) - can specify multiple
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },

    /// Render page previews to PNG files
    #[cfg(feature = "previews")]
    Previews {
        /// Input PDF file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for page-NNN.png files
        #[arg(short, long)]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            input,
            output,
            json,
        } => {
            let (registry, ids) = load_inputs(&input).await?;
            let mut sequence = ResultSequence::new();
            for &id in &ids {
                let page_count = registry.get(id).map(|s| s.page_count).unwrap_or(0);
                let pages: Vec<PageId> = (1..=page_count as u32)
                    .map(|n| PageId::new(id, n))
                    .collect();
                sequence.append_all(&pages);
            }
            export_and_save(&sequence, &registry, &output, json).await?;
        }

        Commands::Collate {
            input,
            output,
            pages,
            json,
        } => {
            let items = parse_page_spec(&pages, input.len())?;
            let (registry, ids) = load_inputs(&input).await?;
            let mut sequence = ResultSequence::new();
            for (input_index, first, last) in items {
                let id = ids[input_index];
                let pages: Vec<PageId> = (first..=last).map(|n| PageId::new(id, n)).collect();
                sequence.append_all(&pages);
            }
            export_and_save(&sequence, &registry, &output, json).await?;
        }

        Commands::Info { input } => {
            for path in &input {
                let bytes = compose::read_source_file(path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let doc = compose::decode_source(&bytes)
                    .with_context(|| format!("failed to decode {}", path.display()))?;
                let sizes = compose::native_page_sizes(&doc)?;
                println!("{}: {} pages", path.display(), sizes.len());
                for (index, (width, height)) in sizes.iter().enumerate() {
                    println!("  page {:>3}: {:.1} x {:.1} pt", index + 1, width, height);
                }
            }
        }

        #[cfg(feature = "previews")]
        Commands::Previews { input, out_dir } => {
            run_previews(input, out_dir).await?;
        }
    }

    Ok(())
}

/// Read and decode every input, registering it as a ready source.
async fn load_inputs(paths: &[PathBuf]) -> Result<(SourceRegistry, Vec<SourceId>)> {
    let mut registry = SourceRegistry::new();
    let mut ids = Vec::new();

    for path in paths {
        let bytes = compose::read_source_file(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let page_count = probe_page_count(&bytes)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let id = registry.add_source(name, bytes);
        registry.set_page_count(id, page_count);
        registry.finish_loading(id);
        ids.push(id);
    }

    Ok((registry, ids))
}

async fn export_and_save(
    sequence: &ResultSequence,
    registry: &SourceRegistry,
    output: &Path,
    json: bool,
) -> Result<()> {
    if sequence.is_empty() {
        anyhow::bail!("no pages selected");
    }

    let exported = pdf_collate::export(sequence, registry).await?;
    let stats = exported.stats;
    compose::save_exported(exported.bytes, output).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Exported {} pages → {}", stats.pages_written, output.display());
        if stats.pages_skipped > 0 {
            println!("  Skipped {} dangling page reference(s)", stats.pages_skipped);
        }
    }

    Ok(())
}

#[cfg(feature = "previews")]
async fn run_previews(input: PathBuf, out_dir: PathBuf) -> Result<()> {
    use pdf_collate_session::preview;

    let bytes = compose::read_source_file(&input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let doc = compose::decode_source(&bytes)
        .with_context(|| format!("failed to decode {}", input.display()))?;
    let sizes = compose::native_page_sizes(&doc)?;

    tokio::fs::create_dir_all(&out_dir).await?;

    for (index, native_size) in sizes.iter().copied().enumerate() {
        let page_number = index as u32 + 1;
        let rendered = preview::render_page_preview(bytes.clone(), page_number, native_size)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        let png = preview::preview_to_png(&rendered).map_err(|e| anyhow::anyhow!(e))?;
        let path = out_dir.join(format!("page-{page_number:03}.png"));
        tokio::fs::write(&path, png).await?;
    }

    println!("Rendered {} previews → {}", sizes.len(), out_dir.display());
    Ok(())
}

/// Parse a page spec like "1:1-3,2:2" into (input index, first page, last
/// page) triples. Input indices are 1-based in the spec, 0-based in the
/// result. Page numbers past an input's page count are allowed; those
/// entries are skipped at export and reported in the statistics.
fn parse_page_spec(
    spec: &str,
    input_count: usize,
) -> pdf_collate::Result<Vec<(usize, u32, u32)>> {
    let mut items = Vec::new();

    for item in spec.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err(CollateError::Config(format!("empty item in page spec '{spec}'")));
        }

        let (input_part, pages_part) = item.split_once(':').ok_or_else(|| {
            CollateError::Config(format!("'{item}' is missing ':' (expected INPUT:PAGES)"))
        })?;

        let input_number: usize = input_part
            .trim()
            .parse()
            .map_err(|_| CollateError::Config(format!("'{input_part}' is not an input number")))?;
        if input_number == 0 || input_number > input_count {
            return Err(CollateError::Config(format!(
                "input {input_number} out of range (have {input_count} inputs)"
            )));
        }

        let (first, last) = match pages_part.split_once('-') {
            Some((a, b)) => (parse_page_number(a)?, parse_page_number(b)?),
            None => {
                let page = parse_page_number(pages_part)?;
                (page, page)
            }
        };
        if first > last {
            return Err(CollateError::Config(format!(
                "page range {first}-{last} is reversed"
            )));
        }

        items.push((input_number - 1, first, last));
    }

    Ok(items)
}

fn parse_page_number(text: &str) -> pdf_collate::Result<u32> {
    let page: u32 = text
        .trim()
        .parse()
        .map_err(|_| CollateError::Config(format!("'{text}' is not a page number")))?;
    if page == 0 {
        return Err(CollateError::Config("page numbers are 1-based".to_string()));
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_pages_and_ranges() {
        let items = parse_page_spec("1:1-3,2:2,1:5", 2).unwrap();
        assert_eq!(items, vec![(0, 1, 3), (1, 2, 2), (0, 5, 5)]);
    }

    #[test]
    fn tolerates_whitespace() {
        let items = parse_page_spec(" 1 : 2 , 2 : 1 - 4 ", 2).unwrap();
        assert_eq!(items, vec![(0, 2, 2), (1, 1, 4)]);
    }

    #[test]
    fn rejects_out_of_range_input() {
        assert!(parse_page_spec("3:1", 2).is_err());
        assert!(parse_page_spec("0:1", 2).is_err());
    }

    #[test]
    fn rejects_malformed_items() {
        assert!(parse_page_spec("1", 1).is_err());
        assert!(parse_page_spec("1:x", 1).is_err());
        assert!(parse_page_spec("1:0", 1).is_err());
        assert!(parse_page_spec("1:3-2", 1).is_err());
        assert!(parse_page_spec("1:1,,1:2", 1).is_err());
    }
}
