use clap::{Parser, Subcommand};
use fitframe::config::{self, Config};
use fitframe::gallery::Gallery;
use fitframe::imaging::{
    FitMode, JpegQuality, OutputFormat, RustBackend, plan_render, preview_placement,
};
use fitframe::output;
use fitframe::presets::Preset;
use fitframe::resolve::{check_area, resolve};
use fitframe::session::{Session, SessionError};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Flags describing the requested output size.
#[derive(clap::Args, Clone, Default)]
struct SizeArgs {
    /// Start from a named preset (see `fitframe presets`)
    #[arg(long)]
    preset: Option<Preset>,

    /// Unit for the two values: px, ratio, cm or m
    #[arg(long)]
    unit: Option<String>,

    /// Width, or the ratio numerator
    #[arg(short = 'a', long = "value-a", allow_hyphen_values = true)]
    value_a: Option<String>,

    /// Height, or the ratio denominator
    #[arg(short = 'b', long = "value-b", allow_hyphen_values = true)]
    value_b: Option<String>,

    /// Dots per inch for cm and m
    #[arg(long, allow_hyphen_values = true)]
    dpi: Option<String>,

    /// Reject malformed values instead of falling back to defaults
    #[arg(long)]
    strict: bool,
}

/// Flags describing how the source is laid onto the canvas.
#[derive(clap::Args, Clone, Default)]
struct LookArgs {
    /// contain (letterbox) or cover (fill and crop)
    #[arg(long)]
    mode: Option<FitMode>,

    /// Background color as #rgb, #rrggbb or #rrggbbaa
    #[arg(long)]
    background: Option<String>,

    /// Backing-buffer multiplier (>= 1)
    #[arg(long)]
    density: Option<f64>,
}

/// Flags describing the encoded file.
#[derive(clap::Args, Clone, Default)]
struct EncodeArgs {
    /// png or jpeg
    #[arg(long)]
    format: Option<String>,

    /// JPEG quality above 0.0 up to 1.0; 0 or anything unusable means 0.92
    #[arg(long)]
    quality: Option<String>,
}

#[derive(Parser)]
#[command(name = "fitframe")]
#[command(about = "Fit an image onto a canvas of an exact size")]
#[command(long_about = "\
Fit an image onto a canvas of an exact size

Sizes can be given in pixels, as an aspect ratio (always 1920 tall), or as a
physical size in centimeters or meters at a given DPI. The source is either
letterboxed onto a background (contain) or scaled to fill and cropped evenly
(cover), then exported as PNG or JPEG.

Examples:

  fitframe render photo.jpg --preset square
  fitframe render photo.jpg --unit cm -a 10 -b 15 --dpi 300 --mode cover
  cat photo.png | fitframe render - --format jpeg --quality 0.8 -o out.jpg
  fitframe resolve --unit ratio -a 4 -b 3

Settings are read from ./fitframe.toml (or --config) and overridden by flags.
Run 'fitframe gen-config' to generate a documented fitframe.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./fitframe.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the saved-render gallery
    #[arg(long, default_value = ".fitframe", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render an image file (or `-` for stdin) at the requested size
    Render {
        /// Source image path, or `-` to read encoded bytes from stdin
        input: String,

        #[command(flatten)]
        size: SizeArgs,

        #[command(flatten)]
        look: LookArgs,

        #[command(flatten)]
        encode: EncodeArgs,

        /// Output file (defaults to resized.png / resized.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also keep a PNG copy in the gallery
        #[arg(long)]
        save_to_gallery: bool,
    },
    /// Print the pixel size a request resolves to
    Resolve {
        #[command(flatten)]
        size: SizeArgs,

        #[command(flatten)]
        look: LookArgs,

        /// Also show where this image would be placed
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// List the size presets
    Presets,
    /// Inspect or manage saved renders
    Gallery {
        #[command(subcommand)]
        action: GalleryAction,
    },
    /// Print a stock fitframe.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum GalleryAction {
    /// List saved renders, most recent first
    List,
    /// Write a saved render to a PNG file
    Export {
        /// Position as shown by `gallery list` (1 = most recent)
        index: usize,
        /// Destination file
        path: PathBuf,
    },
    /// Remove every saved render
    Clear,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Render {
            ref input,
            ref size,
            ref look,
            ref encode,
            output: ref out_flag,
            save_to_gallery,
        } => {
            let config = load(&cli, cli_overlay(size, look, encode))?;
            let format = config.output_format()?;
            let request = config.render_request()?;
            let out_path = out_flag
                .clone()
                .unwrap_or_else(|| PathBuf::from(format.default_file_name()));

            let mut session = Session::new(RustBackend::new(), config.session_settings());
            let source = if input == "-" {
                let mut bytes = Vec::new();
                std::io::stdin().read_to_end(&mut bytes)?;
                session.load_bytes(&bytes)?
            } else {
                session.load_path(Path::new(input))?
            };
            output::print_loaded(source, if input == "-" { "stdin" } else { input.as_str() });

            match session.generate(&request) {
                Ok(_) => {}
                Err(SessionError::Render(e)) => return Err(output::format_refusal(&e).into()),
                Err(e) => return Err(e.into()),
            }
            let bytes = session.export(format, &out_path)?;

            let gallery_id = if save_to_gallery {
                let png = session.encode_rendered(OutputFormat::Png)?;
                let (w, h) = session
                    .rendered()
                    .map(|r| r.physical_size())
                    .ok_or(SessionError::NothingRendered)?;
                let mut gallery = Gallery::open(&cli.data_dir, config.gallery.capacity);
                Some(gallery.add(&png, w, h)?.id.clone())
            } else {
                None
            };

            if let Some(rendered) = session.rendered() {
                output::print_render_output(rendered, &out_path, bytes, gallery_id.as_deref());
            }
        }
        Command::Resolve {
            ref size,
            ref look,
            ref source,
        } => {
            let config = load(&cli, cli_overlay(size, look, &EncodeArgs::default()))?;
            let settings = config.session_settings();
            let dims = resolve(&config.size, settings.policy)?;
            if check_area(dims, settings.max_pixels).is_err() {
                log::warn!("{}", output::TOO_LARGE_MESSAGE);
            }

            let preview = match source {
                Some(path) => {
                    let params = plan_render(
                        &config.render_request()?,
                        settings.policy,
                        settings.max_pixels,
                    )
                    .map_err(|e| output::format_refusal(&e))?;
                    let (source_dims, placement) =
                        preview_placement(&RustBackend::new(), path, &params)?;
                    Some((source_dims, placement, params.mode))
                }
                None => None,
            };
            output::print_resolve_output(&config.size, dims, preview);
        }
        Command::Presets => {
            output::print_presets();
        }
        Command::Gallery { ref action } => {
            let config = load(&cli, None)?;
            let mut gallery = Gallery::open(&cli.data_dir, config.gallery.capacity);
            match action {
                GalleryAction::List => {
                    output::print_gallery_list(gallery.entries(), gallery.capacity());
                }
                GalleryAction::Export { index, path } => {
                    let position = index
                        .checked_sub(1)
                        .ok_or("gallery positions start at 1")?;
                    let bytes = gallery.export(position, path)?;
                    println!("Exported {} ({} bytes)", path.display(), bytes);
                }
                GalleryAction::Clear => {
                    let removed = gallery.clear()?;
                    println!("Removed {removed} saved renders");
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load(cli: &Cli, overlay: Option<toml::Value>) -> Result<Config, config::ConfigError> {
    config::load_config(cli.config.as_deref(), overlay)
}

/// Turn the flags that were actually given into a sparse config table.
///
/// A preset fills `[size]` first; explicit size flags then win over it.
fn cli_overlay(size: &SizeArgs, look: &LookArgs, encode: &EncodeArgs) -> Option<toml::Value> {
    let mut size_table = toml::Table::new();
    if let Some(preset) = size.preset {
        // Presets carry no dpi; the configured one still applies
        let spec = preset.size_spec("");
        for (key, value) in [
            ("unit", spec.unit),
            ("value_a", spec.value_a),
            ("value_b", spec.value_b),
        ] {
            size_table.insert(key.into(), value.into());
        }
    }
    for (key, value) in [
        ("unit", &size.unit),
        ("value_a", &size.value_a),
        ("value_b", &size.value_b),
        ("dpi", &size.dpi),
    ] {
        if let Some(v) = value {
            size_table.insert(key.into(), v.as_str().into());
        }
    }

    let mut render = toml::Table::new();
    if let Some(mode) = look.mode {
        render.insert("mode".into(), mode.as_str().into());
    }
    if let Some(bg) = &look.background {
        render.insert("background".into(), bg.as_str().into());
    }
    if let Some(density) = look.density {
        render.insert("density".into(), density.into());
    }

    let mut out = toml::Table::new();
    if let Some(format) = &encode.format {
        out.insert("format".into(), format.as_str().into());
    }
    if let Some(quality) = &encode.quality {
        let quality = JpegQuality::parse_lenient(quality);
        out.insert("jpeg_quality".into(), quality.value().into());
    }

    let mut root = toml::Table::new();
    for (section, table) in [("size", size_table), ("render", render), ("output", out)] {
        if !table.is_empty() {
            root.insert(section.into(), toml::Value::Table(table));
        }
    }
    if size.strict {
        let mut input = toml::Table::new();
        input.insert("policy".into(), "strict".into());
        root.insert("input".into(), toml::Value::Table(input));
    }

    (!root.is_empty()).then_some(toml::Value::Table(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitframe::resolve::ParsePolicy;

    #[test]
    fn no_flags_means_no_overlay() {
        let overlay = cli_overlay(
            &SizeArgs::default(),
            &LookArgs::default(),
            &EncodeArgs::default(),
        );
        assert!(overlay.is_none());
    }

    #[test]
    fn explicit_values_override_preset() {
        let size = SizeArgs {
            preset: Some(Preset::A4),
            value_b: Some("40".into()),
            ..SizeArgs::default()
        };
        let overlay = cli_overlay(&size, &LookArgs::default(), &EncodeArgs::default()).unwrap();
        let config = config::resolve_config(config::stock_defaults_value(), [overlay]).unwrap();
        assert_eq!(config.size.unit, "cm");
        assert_eq!(config.size.value_a, "21");
        assert_eq!(config.size.value_b, "40");
        assert_eq!(config.size.dpi, "300");
    }

    #[test]
    fn look_and_encode_flags_reach_config() {
        let look = LookArgs {
            mode: Some(FitMode::Cover),
            background: Some("#000".into()),
            density: Some(2.0),
        };
        let encode = EncodeArgs {
            format: Some("jpeg".into()),
            quality: Some("0.5".into()),
        };
        let size = SizeArgs {
            strict: true,
            ..SizeArgs::default()
        };
        let overlay = cli_overlay(&size, &look, &encode).unwrap();
        let config = config::resolve_config(config::stock_defaults_value(), [overlay]).unwrap();
        assert_eq!(config.render.mode, FitMode::Cover);
        assert_eq!(config.render.density, 2.0);
        assert_eq!(config.output.format, "jpeg");
        assert_eq!(config.output.jpeg_quality, 0.5);
        assert_eq!(config.input.policy, ParsePolicy::Strict);
    }

    #[test]
    fn unusable_quality_flag_means_default() {
        for raw in ["0", "1.5", "NaN", "best"] {
            let encode = EncodeArgs {
                format: Some("jpeg".into()),
                quality: Some(raw.into()),
            };
            let overlay = cli_overlay(&SizeArgs::default(), &LookArgs::default(), &encode);
            let config =
                config::resolve_config(config::stock_defaults_value(), overlay).unwrap();
            assert_eq!(config.output.jpeg_quality, 0.92, "{raw}");
            let OutputFormat::Jpeg { quality } = config.output_format().unwrap() else {
                panic!("expected jpeg for {raw}");
            };
            assert_eq!(quality.percent(), 92, "{raw}");
        }
    }

    #[test]
    fn preset_keeps_configured_dpi() {
        let size = SizeArgs {
            preset: Some(Preset::A4),
            ..SizeArgs::default()
        };
        let overlay = cli_overlay(&size, &LookArgs::default(), &EncodeArgs::default()).unwrap();
        assert!(overlay["size"].get("dpi").is_none());
        let dpi: toml::Value = toml::from_str("[size]\ndpi = \"150\"").unwrap();
        let config =
            config::resolve_config(config::stock_defaults_value(), [dpi, overlay]).unwrap();
        assert_eq!(config.size, Preset::A4.size_spec("150"));
    }

    #[test]
    fn cli_parses_render_flags() {
        let cli = Cli::try_parse_from([
            "fitframe", "render", "in.png", "--unit", "cm", "-a", "10", "-b", "15", "--mode",
            "cover", "-o", "out.jpg",
        ])
        .unwrap();
        match cli.command {
            Command::Render {
                size, look, output: out_flag, ..
            } => {
                assert_eq!(size.unit.as_deref(), Some("cm"));
                assert_eq!(size.value_a.as_deref(), Some("10"));
                assert_eq!(look.mode, Some(FitMode::Cover));
                assert_eq!(out_flag, Some(PathBuf::from("out.jpg")));
            }
            _ => panic!("expected render"),
        }
    }
}
