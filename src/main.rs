use clap::{Parser, Subcommand};
use listing_images::config::{self, IntakeConfig};
use listing_images::decode::inspect_selection;
use listing_images::export::export_gallery;
use listing_images::imaging::RustBackend;
use listing_images::intake::{ImageIntake, IntakeError, Phase};
use listing_images::media::{self, SelectedFile};
use listing_images::output::{self, AddEvent, TextGalleryView};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "listing-images")]
#[command(about = "Prepare product photos for a marketplace listing")]
#[command(long_about = "\
Prepare product photos for a marketplace listing

Every selected photo is downscaled so its longer edge fits the configured
bound, cropped to a centred square, and re-encoded as a 1000x1000 JPEG. The
results form an ordered gallery; the first image is the listing's preview.

  listing-images add front.jpg side.jpg back.png --output out/
  listing-images add shoot/ --remove 2 --output out/
  listing-images check shoot/

Exported galleries contain main.jpg, image_2.jpg, ... and a gallery.json
manifest with SHA-256 checksums.

Run 'listing-images gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (optional; stock defaults are used when it is missing)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run photos through downscale and crop, building a gallery
    Add {
        /// Image files or directories (walked for supported extensions)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Remove the gallery entry at position N (as listed, starting at 1) afterwards.
        /// Repeatable; applied in order
        #[arg(long = "remove", value_name = "N", value_parser = parse_position)]
        removals: Vec<usize>,

        /// Export the gallery to this directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the thumbnail strip and preview after every change
        #[arg(long, short)]
        verbose: bool,
    },
    /// Validate that inputs are supported images without processing them
    Check {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Add {
            paths,
            removals,
            output,
            verbose,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            run_add(config, &paths, &removals, output, verbose)?;
        }
        Command::Check { paths } => {
            let config = config::load_config(&cli.config)?;
            run_check(&config, &paths)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_add(
    config: IntakeConfig,
    paths: &[PathBuf],
    removals: &[usize],
    output_dir: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut intake = ImageIntake::new(config).with_view(TextGalleryView { verbose });

    for path in media::collect_inputs(paths) {
        let file = match SelectedFile::read(&path) {
            Ok(file) => file,
            Err(e) => {
                skip(path.display().to_string(), e.to_string());
                continue;
            }
        };
        let source = file.name.clone();

        match intake.select_and_decode(Some(file)) {
            Ok(Phase::Cropping) => {}
            Ok(_) => {
                skip(source, "empty file".into());
                continue;
            }
            Err(e) => {
                skip(source, e.to_string());
                continue;
            }
        }
        let Some(session) = intake.session() else {
            continue;
        };
        let original = session.image().original_dimensions;
        let selected = session.dimensions();

        match intake.commit_crop() {
            Ok(Some(handle)) => {
                let index = intake.gallery().len();
                let output = intake
                    .gallery()
                    .images()
                    .last()
                    .map(|image| image.dimensions)
                    .unwrap_or(selected);
                output::print_add_event(&AddEvent::Committed {
                    index,
                    handle,
                    source,
                    original,
                    selected,
                    output,
                });
            }
            Ok(None) => {}
            Err(e @ IntakeError::GalleryFull { .. }) | Err(e @ IntakeError::Backend(_)) => {
                intake.cancel_crop();
                skip(source, e.to_string());
            }
            Err(e) => return Err(e.into()),
        }
    }

    for &position in removals {
        match intake.remove_image(position - 1) {
            Ok(removed) => output::print_add_event(&AddEvent::Removed {
                index: position,
                handle: removed.handle,
            }),
            Err(e) => {
                log::warn!("--remove {}: {}", position, e);
                println!("Cannot remove {}: {}", position, e);
            }
        }
    }

    println!();
    output::print_gallery(intake.gallery());

    if let Some(dir) = output_dir {
        let manifest = export_gallery(intake.gallery(), &dir)?;
        println!();
        output::print_export(&manifest, &dir);
    }
    Ok(())
}

fn run_check(config: &IntakeConfig, paths: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::new();
    let limits = config.decode_limits();
    let (mut valid, mut rejected) = (0, 0);

    for path in media::collect_inputs(paths) {
        let source = path.display().to_string();
        let result = SelectedFile::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|file| {
                inspect_selection(&backend, &file, &limits).map_err(|e| e.to_string())
            });
        match &result {
            Ok(_) => valid += 1,
            Err(reason) => {
                log::warn!("rejected {}: {}", source, reason);
                rejected += 1;
            }
        }
        println!("{}", output::format_check_result(&source, &result));
    }

    println!("{}", output::format_check_summary(valid, rejected));
    if rejected > 0 {
        return Err(format!("{} input(s) rejected", rejected).into());
    }
    Ok(())
}

/// Parse a 1-based gallery position, the numbering `format_gallery` prints.
fn parse_position(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("positions start at 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn skip(source: String, reason: String) {
    log::warn!("skipped {}: {}", source, reason);
    output::print_add_event(&AddEvent::Skipped { source, reason });
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. Decode jobs run on this pool.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn removals(argv: &[&str]) -> Result<Vec<usize>, clap::Error> {
        let cli = Cli::try_parse_from(argv)?;
        match cli.command {
            Command::Add { removals, .. } => Ok(removals),
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn remove_takes_listed_positions() {
        let parsed = removals(&["listing-images", "add", "a.jpg", "--remove", "1", "--remove", "3"]);
        assert_eq!(parsed.unwrap(), vec![1, 3]);
    }

    #[test]
    fn remove_rejects_position_zero() {
        assert!(removals(&["listing-images", "add", "a.jpg", "--remove", "0"]).is_err());
        assert!(removals(&["listing-images", "add", "a.jpg", "--remove", "x"]).is_err());
    }
}
