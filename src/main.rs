use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dd1750::{FormRequest, Template, render_to_path};

/// DD1750 packing list generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON request with `items` and an optional `header`
    #[arg(short, long)]
    input: PathBuf,

    /// Output PDF file path
    #[arg(short, long, default_value = "dd1750.pdf")]
    output: PathBuf,

    /// Blank DD1750 template (PDF, or a scanned image of the form)
    #[arg(short, long, env = "DD1750_TEMPLATE", default_value = "blank_1750.pdf")]
    template: PathBuf,

    /// Ignore the request header; only page numbers and items are drawn
    #[arg(long, default_value_t = false)]
    no_header: bool,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    println!("DD1750 Packing List Generator");
    println!("=============================");
    println!("Request:   {}", args.input.display());
    println!("Template:  {}", args.template.display());
    println!("Output:    {}", args.output.display());
    println!();

    // Template problems are fatal before any item is looked at
    let template = Template::open(&args.template)
        .with_context(|| format!("loading template {}", args.template.display()))?;

    let request = FormRequest::from_path(&args.input)
        .with_context(|| format!("reading request {}", args.input.display()))?;

    let header = (!args.no_header).then_some(&request.header);
    let form = render_to_path(&request.items, header, &template, &args.output)
        .with_context(|| format!("rendering {}", args.output.display()))?;

    println!("✓ DD1750 generated successfully!");
    println!("  Items:  {}", form.item_count);
    println!("  Pages:  {}", form.page_count);
    println!("  PDF:    {}", args.output.display());

    Ok(())
}
