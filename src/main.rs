use clap::{Parser, Subcommand};
use flyer_factory::event::EventRecord;
use flyer_factory::flyer::FlyerBuilder;
use flyer_factory::{config, layout, output};
use std::path::PathBuf;

/// Template and layout selection shared by `build` and `preview`.
#[derive(clap::Args, Clone)]
struct Selection {
    /// Template name (file stem in the template directory)
    #[arg(long, short)]
    template: String,

    /// Layout key, see `flyer-factory layouts`
    #[arg(long, short)]
    layout: String,
}

#[derive(Parser)]
#[command(name = "flyer-factory")]
#[command(about = "Compose event listings into printable flyer PDFs")]
#[command(long_about = "\
Compose event listings into printable flyer PDFs

Events are laid out in one of several fixed layouts and printed over the
first page of a background template PDF. The top third of the page is left
to the template artwork.

Directory structure:

  flyer.toml                    # Config (optional)
  flyer-templates/
  ├── rally.pdf                 # Template \"rally\"
  └── canvass.pdf
  previews/
  └── rally_LargeLayout.jpg     # Cached preview (written once)

Events are read from a JSON array of objects with the fields name, start_dt
(YYYY-MM-DD HH:MM:SS), timezone, description, venue_name, and optionally
venue_addr1 and venue_city. Other fields are ignored.

Previews are rendered with poppler's pdftoppm.

Run 'flyer-factory gen-config' to generate a documented flyer.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a flyer PDF from a JSON events file
    Build {
        #[command(flatten)]
        selection: Selection,

        /// JSON file holding an array of event records
        #[arg(long, short)]
        events: PathBuf,

        /// Where to write the flyer PDF
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Render (or reuse) the cached preview thumbnail and print its path
    Preview(Selection),
    /// List the available layouts
    Layouts,
    /// List the available templates
    Templates,
    /// Print a stock flyer.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            selection,
            events,
            output: destination,
        } => {
            let builder = FlyerBuilder::new(config::load_config(&cli.config)?);
            let records = read_events(&events)?;
            builder.build_flyer(
                &selection.template,
                &selection.layout,
                &records,
                &destination,
            )?;
            output::print_build(
                &selection.template,
                &selection.layout,
                records.len(),
                &destination,
            );
        }
        Command::Preview(selection) => {
            let builder = FlyerBuilder::new(config::load_config(&cli.config)?);
            let path = builder.get_preview(&selection.template, &selection.layout)?;
            println!("{}", path.display());
        }
        Command::Layouts => {
            output::print_layouts(layout::layouts());
        }
        Command::Templates => {
            let builder = FlyerBuilder::new(config::load_config(&cli.config)?);
            let names = builder.list_templates()?;
            output::print_templates(&names, &builder.config().template_dir);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn read_events(path: &std::path::Path) -> Result<Vec<EventRecord>, Box<dyn std::error::Error>> {
    let file = std::fs::File::open(path)?;
    let records: Vec<EventRecord> = serde_json::from_reader(std::io::BufReader::new(file))?;
    log::debug!("read {} event(s) from {}", records.len(), path.display());
    Ok(records)
}
