use docopt::Docopt;
use env_logger::Env;
use error_chain::bail;
use log::{info, warn};
use rand::Rng;
use serde_derive::Deserialize;
use cycling_mazes::{
    generators::RecursiveBacktracker,
    renderers::{self, RenderOptionsBuilder, STILL_IMAGE_STEPS_PER_FRAME},
    units::{ColumnLength, Height, RowLength, Width},
};
use std::path::{Path, PathBuf};

const USAGE: &str = "Colour cycling mazes

Usage:
    maze_driver png [options]
    maze_driver bmp [options]
    maze_driver gif [options]
    maze_driver text [options]
    maze_driver -h | --help

Commands:
    png                      Save the finished maze as a PNG image.
    bmp                      Save the finished maze as a BMP image.
    gif                      Save the maze generation as a looping animated GIF.
    text                     Print the finished maze as text.

Options:
    -h --help                Show this screen.
    -w --window-size=<wxh>   Size of the image, e.g. 100x200 [default: 620x620].
    -g --grid-size=<wxh>     Dimensions of the grid, e.g. 10x10 [default: 15x15].
    --colour-speed=<s>       Colour change as HSV hue per generation step, 0 to 255 [default: 0.5].
    --start-colour=<h>       The colour to start at as a HSV hue, 0 to 255 [default: 100].
    --seed=<n>               A seed to determine the maze generated.
    -d --duration=<ms>       Duration between GIF frames in milliseconds [default: 40].
    --step=<n>               Number of generation steps per GIF frame [default: 1].
    --save-path=<path>       Path to save to, the extension is set by the command [default: out].
";

#[derive(Debug, Deserialize)]
struct MazeArgs {
    cmd_png: bool,
    cmd_bmp: bool,
    cmd_gif: bool,
    cmd_text: bool,
    flag_window_size: String,
    flag_grid_size: String,
    flag_colour_speed: f32,
    flag_start_colour: u8,
    flag_seed: Option<u64>,
    flag_duration: u32,
    flag_step: usize,
    flag_save_path: String,
}

mod errors {
    #![allow(deprecated)]
    use error_chain::*;
    error_chain! {

        links {
            Maze(::cycling_mazes::errors::Error, ::cycling_mazes::errors::ErrorKind);
        }

        foreign_links {
            DocOptFailure(::docopt::Error);
        }
    }
}
use crate::errors::*;

fn main() -> Result<()> {

    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args: MazeArgs = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    let (window_width, window_height) = parse_size(&args.flag_window_size)
        .chain_err(|| "Invalid --window-size")?;
    let (grid_width, grid_height) = parse_size(&args.flag_grid_size)
        .chain_err(|| "Invalid --grid-size")?;
    validate_window_fits_grid((window_width, window_height), (grid_width, grid_height))?;

    if !(0.0..=255.0).contains(&args.flag_colour_speed) {
        bail!("--colour-speed must be between 0 and 255");
    }
    if args.flag_duration == 0 || args.flag_step == 0 {
        bail!("--duration and --step must be at least 1");
    }

    let seed = args.flag_seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!("Using seed {}", seed);

    let mut generator = RecursiveBacktracker::from_grid_size(RowLength(grid_width),
                                                             ColumnLength(grid_height),
                                                             Some(seed))?;

    let options = RenderOptionsBuilder::new()
        .window_size(Width(window_width), Height(window_height))
        .colour_start(args.flag_start_colour)
        .colour_speed(args.flag_colour_speed)
        .frame_duration_ms(args.flag_duration)
        .steps_per_frame(if args.cmd_gif { args.flag_step } else { STILL_IMAGE_STEPS_PER_FRAME })
        .build();

    if args.cmd_text {
        generator.run_to_completion();
        println!("{}", generator.grid());
        println!("seed {}", seed);
    } else if args.cmd_gif {
        let path = save_path(&args.flag_save_path, "gif");
        renderers::save_gif(&mut generator, &options, &path)?;
        println!("{}", created_message("GIF", &path, seed));
    } else if args.cmd_png || args.cmd_bmp {
        let (extension, label) = if args.cmd_png { ("png", "PNG") } else { ("bmp", "BMP") };
        let path = save_path(&args.flag_save_path, extension);
        renderers::save_image(&mut generator, &options, &path)?;
        println!("{}", created_message(label, &path, seed));
    }

    Ok(())
}

/// Parse `WIDTHxHEIGHT`, both sides at least 2.
fn parse_size(value: &str) -> Result<(usize, usize)> {
    let mut sides = value.splitn(2, 'x');
    let (width, height) = match (sides.next(), sides.next()) {
        (Some(w), Some(h)) => (w.trim().parse::<usize>(), h.trim().parse::<usize>()),
        _ => bail!("Format must be WIDTHxHEIGHT, e.g. 100x50"),
    };
    match (width, height) {
        (Ok(w), Ok(h)) if w >= 2 && h >= 2 => Ok((w, h)),
        (Ok(_), Ok(_)) => bail!("height and width must be greater than 1"),
        _ => bail!("Format must be WIDTHxHEIGHT, e.g. 100x50"),
    }
}

fn validate_window_fits_grid(window: (usize, usize), grid: (usize, usize)) -> Result<()> {
    let display = |n: usize| n * 2 + 1;
    let ((window_width, window_height), (grid_width, grid_height)) = (window, grid);

    if display(grid_width) > window_width {
        bail!("window/image width is too small for that grid width");
    }
    if display(grid_height) > window_height {
        bail!("window/image height is too small for that grid height");
    }
    if window_width % display(grid_width) != 0 || window_height % display(grid_height) != 0 {
        warn!("Note: It is recommended that window size is a multiple of 2*grid_size+1");
    }
    Ok(())
}

fn save_path(path: &str, extension: &str) -> PathBuf {
    Path::new(path).with_extension(extension)
}

/// Completion line, with the seed to pass back as `--seed`.
fn created_message(label: &str, path: &Path, seed: u64) -> String {
    format!("{} created at {} (seed {})", label, path.display(), seed)
}
