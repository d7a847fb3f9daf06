// label-sheet: render label sheets and manage layout presets

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use label_sheet::consts::{EXPORT_FILE_NAME, PDF_FILE_NAME, STORE_FILE_NAME};
use label_sheet::{
    CodeType, FileStore, LabelConfig, LabelError, Paper, PresetStore, SheetBuilder, TextPosition,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate printable label sheets with DataMatrix or QR codes")]
struct Cli {
    /// Preset store file
    #[arg(long, global = true, env = "LABEL_SHEET_STORE", default_value = STORE_FILE_NAME)]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render labels to a PDF sheet
    Generate(GenerateArgs),

    /// Manage saved presets
    #[command(subcommand)]
    Preset(PresetCommand),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// File with one label per line ("-" reads stdin)
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Label text, repeatable; takes precedence over --labels
    #[arg(short, long = "text")]
    text: Vec<String>,

    /// Output PDF path
    #[arg(short, long, default_value = PDF_FILE_NAME)]
    output: PathBuf,

    /// Use this preset instead of the current one
    #[arg(short, long)]
    preset: Option<String>,

    /// TrueType font for label text (default: built-in Courier)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Print the layout without writing a PDF
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Subcommand, Debug)]
enum PresetCommand {
    /// List presets, marking the current one
    List,

    /// Print a preset as JSON (default: current)
    Show { name: Option<String> },

    /// Make a preset current
    Select { name: String },

    /// Save the current settings, with overrides, under a name
    Save {
        /// Preset name (blank reuses the current name)
        name: String,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Delete a preset ("Default" is kept)
    Delete { name: String },

    /// Write all presets to a JSON file
    Export {
        #[arg(default_value = EXPORT_FILE_NAME)]
        path: PathBuf,
    },

    /// Replace presets with those in a JSON file
    Import { path: PathBuf },
}

/// Per-field overrides on top of a preset
#[derive(Args, Debug, Default)]
struct Overrides {
    #[arg(long)]
    columns: Option<u32>,

    /// Left/right page margin (mm)
    #[arg(long)]
    margin_h: Option<f32>,

    /// Top/bottom page margin (mm)
    #[arg(long)]
    margin_v: Option<f32>,

    /// Horizontal cell padding (mm)
    #[arg(long)]
    padding_h: Option<f32>,

    /// Vertical cell padding (mm)
    #[arg(long)]
    padding_v: Option<f32>,

    /// Text size (pt)
    #[arg(long)]
    font_size: Option<f32>,

    /// Code edge length (mm)
    #[arg(long)]
    code_size: Option<f32>,

    #[arg(long)]
    dpi: Option<u32>,

    /// A4 or LETTER
    #[arg(long)]
    paper: Option<Paper>,

    /// datamatrix or qrcode
    #[arg(long)]
    code_type: Option<CodeType>,

    /// top, bottom, left or right
    #[arg(long)]
    text_position: Option<TextPosition>,

    /// Copies of each label
    #[arg(short, long)]
    replicates: Option<u32>,
}

impl Overrides {
    fn apply(&self, base: LabelConfig) -> LabelConfig {
        LabelConfig {
            columns: self.columns.unwrap_or(base.columns),
            margin_h: self.margin_h.unwrap_or(base.margin_h),
            margin_v: self.margin_v.unwrap_or(base.margin_v),
            padding_h: self.padding_h.unwrap_or(base.padding_h),
            padding_v: self.padding_v.unwrap_or(base.padding_v),
            font_size: self.font_size.unwrap_or(base.font_size),
            code_size_mm: self.code_size.unwrap_or(base.code_size_mm),
            dpi: self.dpi.unwrap_or(base.dpi),
            paper: self.paper.unwrap_or(base.paper),
            code_type: self.code_type.unwrap_or(base.code_type),
            text_position: self.text_position.unwrap_or(base.text_position),
            replicates: self.replicates.unwrap_or(base.replicates),
        }
    }
}

fn read_labels(args: &GenerateArgs) -> Result<String> {
    if !args.text.is_empty() {
        return Ok(args.text.join("\n"));
    }
    match args.labels.as_deref() {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("reading labels from {}", path.display())),
        _ => {
            let mut raw = String::new();
            io::stdin().read_to_string(&mut raw).context("reading labels from stdin")?;
            Ok(raw)
        }
    }
}

fn generate(store: PresetStore<FileStore>, args: GenerateArgs) -> Result<()> {
    let base = match &args.preset {
        Some(name) => store
            .presets()
            .get(name)
            .ok_or_else(|| LabelError::UnknownPreset(name.clone()))?
            .config,
        None => store.current().config,
    };
    let config = args.overrides.apply(base);

    let mut builder = SheetBuilder::new(config);
    if let Some(path) = &args.font {
        let ttf = fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        builder = builder.with_font(ttf)?;
    }

    let raw = read_labels(&args)?;
    let plan = builder.plan(&raw)?;

    if args.dry_run {
        let grid = &plan.grid;
        println!(
            "{} labels, {} x {} per page, {} page(s), cell {:.1} x {:.1} pt",
            plan.items.len(),
            grid.columns,
            grid.rows,
            plan.pages(),
            grid.cell_w,
            grid.cell_h
        );
        for (item, p) in plan.items.iter().zip(&plan.placements) {
            println!("{:>5}  page {} row {} col {}  {}", p.index, p.slot.page + 1, p.slot.row, p.slot.column, item);
        }
        return Ok(());
    }

    let pdf = builder.render(&plan)?;
    fs::write(&args.output, pdf).with_context(|| format!("writing {}", args.output.display()))?;
    println!(
        "Wrote {} labels on {} page(s) to {}",
        plan.items.len(),
        plan.pages(),
        args.output.display()
    );
    Ok(())
}

fn preset(mut store: PresetStore<FileStore>, command: PresetCommand) -> Result<()> {
    match command {
        PresetCommand::List => {
            let current = store.presets().current_name();
            for name in store.presets().names() {
                let marker = if name == current { "*" } else { " " };
                println!("{} {}", marker, name);
            }
        }
        PresetCommand::Show { name } => {
            let preset = match name {
                Some(name) => store
                    .presets()
                    .get(&name)
                    .ok_or(LabelError::UnknownPreset(name))?,
                None => store.current(),
            };
            println!("{}", serde_json::to_string_pretty(preset)?);
        }
        PresetCommand::Select { name } => {
            let preset = store.select(&name)?;
            println!("Selected preset {}", preset.name);
        }
        PresetCommand::Save { name, overrides } => {
            let config = overrides.apply(store.current().config);
            let preset = store.save(config, &name)?;
            println!("Saved preset {}", preset.name);
        }
        PresetCommand::Delete { name } => {
            if name == label_sheet::consts::DEFAULT_PRESET {
                bail!("Cannot delete default preset");
            }
            let current = store.delete(&name)?;
            println!("Deleted preset {}; current preset is {}", name, current.name);
        }
        PresetCommand::Export { path } => {
            store.export_file(&path)?;
            println!("Exported {} presets to {}", store.presets().len(), path.display());
        }
        PresetCommand::Import { path } => {
            let presets = store
                .import_file(&path)
                .with_context(|| format!("Could not read presets file {}", path.display()))?;
            println!(
                "Imported {} presets; current preset is {}",
                presets.len(),
                presets.current_name()
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "label_sheet=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let store = PresetStore::load(
        FileStore::open(&cli.store)
            .with_context(|| format!("opening preset store {}", cli.store.display()))?,
    );
    info!(store = %cli.store.display(), "Using preset store");

    match cli.command {
        Command::Generate(args) => generate(store, args),
        Command::Preset(command) => preset(store, command),
    }
}
