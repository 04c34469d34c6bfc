//! Collage CLI - Headless driver for the collage engine
//!
//! Commands: handles, new, apply, export
//! Outputs JSON to stdout, logs to stderr
//! Returns 1 on bad input, 2 when a gesture or export fails

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use collage_core::{
    CollageDocument, CollageEditor, EditorConfig, ExportResolution, GestureUpdate, Handle,
};

#[derive(Parser)]
#[command(name = "collage-cli")]
#[command(about = "Collage CLI - place, resize and export image collages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to an editor config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resize handle table
    Handles,

    /// Create a collage document from images
    New {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// Background descriptor (name or #RRGGBB)
        #[arg(long)]
        background: Option<String>,

        /// Image files, bottom-most first
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,
    },

    /// Run one gesture on a placement and print the updated document
    Apply {
        #[arg(short, long)]
        document: PathBuf,

        /// Placement index in paint order
        #[arg(short, long)]
        index: usize,

        /// body, top, bottom, left, right, top-left, top-right, bottom-left, bottom-right
        #[arg(long, default_value = "body")]
        handle: Handle,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dx: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dy: f64,

        /// Pinch scale; when set, the gesture is a pinch instead of a drag
        #[arg(long)]
        scale: Option<f64>,
    },

    /// Rasterize a document to PNG
    Export {
        #[arg(short, long)]
        document: PathBuf,

        /// Output file (defaults to Collage.png in the picture directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Display scale of the view the collage was edited in
        #[arg(long, default_value_t = 1.0)]
        view_scale: f64,

        /// logical or view
        #[arg(long)]
        resolution: Option<ExportResolution>,
    },
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!(r#"{{"error": "Failed to serialize output: {}"}}"#, e),
    }
}

fn fail(code: u8, error: impl std::fmt::Display) -> ExitCode {
    print_json(&serde_json::json!({
        "success": false,
        "error": error.to_string(),
    }));
    ExitCode::from(code)
}

fn load_editor(config: &EditorConfig, path: &Path) -> Result<CollageEditor, ExitCode> {
    match CollageDocument::load(path) {
        Ok(doc) => Ok(CollageEditor::with_collage(config.clone(), doc.collage)),
        Err(e) => Err(fail(1, e)),
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match EditorConfig::load(path) {
            Ok(c) => c,
            Err(e) => return fail(1, e),
        },
        None => EditorConfig::default(),
    };

    match cli.command {
        Commands::Handles => {
            let table: Vec<_> = Handle::RESIZE
                .iter()
                .filter_map(|h| h.config().map(|cfg| (h, cfg)))
                .map(|(h, cfg)| serde_json::json!({
                    "handle": h.name(),
                    "corner": h.is_corner(),
                    "adjustWidth": cfg.adjust_width,
                    "adjustHeight": cfg.adjust_height,
                    "anchorX": cfg.anchor_x,
                    "anchorY": cfg.anchor_y,
                }))
                .collect();
            print_json(&serde_json::Value::Array(table));
            ExitCode::SUCCESS
        }

        Commands::New { title, width, height, background, images } => {
            if let Some(title) = title {
                config.title = title;
            }
            if let Some(width) = width {
                config.canvas.width = width;
            }
            if let Some(height) = height {
                config.canvas.height = height;
            }
            if let Some(background) = background {
                match background.parse() {
                    Ok(bg) => config.canvas.background = bg,
                    Err(e) => return fail(1, e),
                }
            }

            let mut editor = match CollageEditor::new(config) {
                Ok(editor) => editor,
                Err(e) => return fail(1, e),
            };
            for image in &images {
                if let Err(e) = editor.add_image(image) {
                    return fail(1, e);
                }
            }

            match CollageDocument::new(editor.into_collage()).to_json() {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(1, e),
            }
        }

        Commands::Apply { document, index, handle, dx, dy, scale } => {
            let mut editor = match load_editor(&config, &document) {
                Ok(editor) => editor,
                Err(code) => return code,
            };
            let Some(id) = editor.collage().placements().get(index).map(|p| p.id()) else {
                return fail(1, format!("No placement at index {}", index));
            };

            let (started, update) = match scale {
                Some(scale) => (editor.begin_pinch(id), GestureUpdate::Pinch { scale }),
                None => (
                    editor.begin_gesture(id, handle),
                    GestureUpdate::Pan { total_x: dx, total_y: dy },
                ),
            };
            let result = started.and_then(|_| editor.update_gesture(id, update));
            if let Err(e) = result {
                editor.cancel_gesture(id);
                return fail(2, e);
            }
            editor.complete_gesture(id);

            match CollageDocument::new(editor.into_collage()).to_json() {
                Ok(json) => {
                    println!("{}", json);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(1, e),
            }
        }

        Commands::Export { document, output, view_scale, resolution } => {
            if let Some(resolution) = resolution {
                config.export.resolution = resolution;
            }
            let mut editor = match load_editor(&config, &document) {
                Ok(editor) => editor,
                Err(code) => return code,
            };
            editor.set_view_scale(view_scale);

            let result = match output {
                Some(path) => editor.export_to(&path),
                None => editor.export(),
            };
            match result {
                Ok(report) => {
                    print_json(&serde_json::json!({
                        "success": true,
                        "report": report,
                    }));
                    ExitCode::SUCCESS
                }
                Err(e) => fail(2, e),
            }
        }
    }
}
