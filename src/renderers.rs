use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, Rgb, RgbImage};
use itertools::iproduct;
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::cells::DisplayCoordinate;
use crate::colours::ColourCycle;
use crate::errors::*;
use crate::generators::{RecursiveBacktracker, StepOutcome};
use crate::units::{DisplayHeight, DisplayWidth, Height, Width};

pub const WALL_COLOUR: Rgb<u8> = Rgb([0, 0, 0]);
pub const SPACE_COLOUR: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);

/// How long the finished maze stays on screen before an animated export loops.
pub const FINAL_FRAME_MS: u32 = 2000;

/// Steps per frame used for still images, enough to finish typical mazes in one frame.
pub const STILL_IMAGE_STEPS_PER_FRAME: usize = 100_000;

/// One colour per display grid position.
#[derive(Debug, Clone)]
pub struct MazeCanvas {
    width: usize,
    height: usize,
    cells: Vec<Rgb<u8>>,
}

impl MazeCanvas {
    /// A canvas sized to the generator's display grid, painted with its current walls.
    pub fn new(generator: &RecursiveBacktracker) -> MazeCanvas {
        let (DisplayWidth(width), DisplayHeight(height)) = generator.display_size();
        let mut canvas = MazeCanvas {
            width,
            height,
            cells: vec![SPACE_COLOUR; width * height],
        };
        canvas.repaint(generator);
        canvas
    }

    /// Reset every position to spaces, fixed walls and the generator's standing walls.
    pub fn repaint(&mut self, generator: &RecursiveBacktracker) {
        for cell in self.cells.iter_mut() {
            *cell = SPACE_COLOUR;
        }

        for (x, y) in iproduct!(0..self.width, 0..self.height) {
            let coord = DisplayCoordinate::new(x as u32, y as u32);
            if coord.is_fixed_wall() {
                self.paint(coord, WALL_COLOUR);
            }
        }

        for wall in generator.walls() {
            self.paint(wall, WALL_COLOUR);
        }
    }

    #[inline]
    pub fn width(&self) -> DisplayWidth {
        DisplayWidth(self.width)
    }

    #[inline]
    pub fn height(&self) -> DisplayHeight {
        DisplayHeight(self.height)
    }

    pub fn colour_at(&self, coord: DisplayCoordinate) -> Option<Rgb<u8>> {
        self.index(coord).map(|index| self.cells[index])
    }

    /// Recolour the positions an outcome touched. Backtracks recolour the cell left and the
    /// wall position, carves also recolour the new cell.
    /// Returns true if the outcome says the maze is complete.
    pub fn apply(&mut self, outcome: &StepOutcome, colours: &mut ColourCycle) -> bool {
        match *outcome {
            StepOutcome::Completed => true,
            StepOutcome::Backtrack { from, wall, .. } => {
                self.paint(from, colours.next_colour());
                self.paint(wall, colours.next_colour());
                false
            }
            StepOutcome::Carved { from, wall, to } => {
                self.paint(from, colours.next_colour());
                self.paint(wall, colours.next_colour());
                self.paint(to, colours.next_colour());
                false
            }
        }
    }

    /// Run up to `steps` generation steps, painting each one. This is one animation frame.
    /// Returns true once the generator reports completion.
    pub fn advance(&mut self,
                   generator: &mut RecursiveBacktracker,
                   steps: usize,
                   colours: &mut ColourCycle)
                   -> bool {
        for _ in 0..steps {
            let outcome = generator.step();
            if self.apply(&outcome, colours) {
                return true;
            }
        }
        false
    }

    /// Scale the canvas up to an image. Display row 0 is drawn at the bottom of the image.
    ///
    /// When the image size is not a multiple of the display size, positions get a
    /// pixel more or less each, taken by flooring the pixel to position mapping.
    pub fn to_image(&self, width: Width, height: Height) -> RgbImage {
        let (Width(pixels_wide), Height(pixels_high)) = (width, height);
        let (w, h) = (self.width, self.height);

        RgbImage::from_fn(pixels_wide as u32, pixels_high as u32, |px, py| {
            let x = px as usize * w / pixels_wide;
            let y = (pixels_high - 1 - py as usize) * h / pixels_high;
            self.cells[y * w + x]
        })
    }

    fn paint(&mut self, coord: DisplayCoordinate, colour: Rgb<u8>) {
        if let Some(index) = self.index(coord) {
            self.cells[index] = colour;
        }
    }

    fn index(&self, coord: DisplayCoordinate) -> Option<usize> {
        let (x, y) = (coord.x as usize, coord.y as usize);
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    window_width: Width,
    window_height: Height,
    steps_per_frame: usize,
    frame_duration_ms: u32,
    colour_start: u8,
    colour_speed: f32,
}

impl RenderOptions {
    pub fn window_size(&self) -> (Width, Height) {
        (self.window_width, self.window_height)
    }

    pub fn steps_per_frame(&self) -> usize {
        self.steps_per_frame
    }

    pub fn frame_duration_ms(&self) -> u32 {
        self.frame_duration_ms
    }

    /// A fresh colour cycle for one render.
    pub fn colour_cycle(&self) -> ColourCycle {
        ColourCycle::new(self.colour_start, self.colour_speed)
    }
}

#[derive(Debug)]
pub struct RenderOptionsBuilder {
    options: RenderOptions,
}

impl RenderOptionsBuilder {
    pub fn new() -> RenderOptionsBuilder {
        RenderOptionsBuilder {
            options: RenderOptions {
                window_width: Width(620),
                window_height: Height(620),
                steps_per_frame: 1,
                frame_duration_ms: 40,
                colour_start: 100,
                colour_speed: 0.5,
            },
        }
    }

    /// Pixel size of the rendered images. Zero sized images are bumped to 1 pixel.
    pub fn window_size(mut self, width: Width, height: Height) -> RenderOptionsBuilder {
        self.options.window_width = Width(width.0.max(1));
        self.options.window_height = Height(height.0.max(1));
        self
    }

    pub fn steps_per_frame(mut self, steps: usize) -> RenderOptionsBuilder {
        self.options.steps_per_frame = steps.max(1);
        self
    }

    pub fn frame_duration_ms(mut self, duration: u32) -> RenderOptionsBuilder {
        self.options.frame_duration_ms = duration.max(1);
        self
    }

    pub fn colour_start(mut self, hue: u8) -> RenderOptionsBuilder {
        self.options.colour_start = hue;
        self
    }

    pub fn colour_speed(mut self, speed: f32) -> RenderOptionsBuilder {
        self.options.colour_speed = speed;
        self
    }

    pub fn build(self) -> RenderOptions {
        self.options
    }
}

impl Default for RenderOptionsBuilder {
    fn default() -> Self {
        RenderOptionsBuilder::new()
    }
}

/// Run the generator to completion and return the final frame.
pub fn render_final_frame(generator: &mut RecursiveBacktracker, options: &RenderOptions) -> RgbImage {
    let mut canvas = MazeCanvas::new(generator);
    let mut colours = options.colour_cycle();
    let mut frames = 0;
    while !canvas.advance(generator, options.steps_per_frame(), &mut colours) {
        frames += 1;
    }
    debug!("Maze finished after {} frames", frames + 1);

    let (width, height) = options.window_size();
    canvas.to_image(width, height)
}

/// Run the generator to completion and save the final frame. The image format follows the
/// path's extension.
pub fn save_image(generator: &mut RecursiveBacktracker,
                  options: &RenderOptions,
                  path: &Path)
                  -> Result<()> {
    let image = render_final_frame(generator, options);
    image.save(path)
         .chain_err(|| format!("Failed to save maze image to {}", path.display()))?;
    info!("Saved maze image to {}", path.display());
    Ok(())
}

/// Run the generator to completion, encoding one gif frame per animation frame. The last
/// frame is held for `FINAL_FRAME_MS` and the animation loops forever.
pub fn save_gif(generator: &mut RecursiveBacktracker,
                options: &RenderOptions,
                path: &Path)
                -> Result<()> {
    let file = File::create(path)
        .chain_err(|| format!("Failed to create gif file {}", path.display()))?;
    let frames = encode_gif(generator, options, BufWriter::new(file))
        .chain_err(|| format!("Failed to write gif to {}", path.display()))?;
    info!("Saved {} frame gif to {}", frames, path.display());
    Ok(())
}

/// Encode the animation as a gif into any writer. Returns the number of frames written.
pub fn encode_gif<W: std::io::Write>(generator: &mut RecursiveBacktracker,
                                     options: &RenderOptions,
                                     writer: W)
                                     -> Result<usize> {
    let (width, height) = options.window_size();
    let mut encoder = GifEncoder::new_with_speed(writer, 10);
    encoder.set_repeat(Repeat::Infinite)?;

    let mut canvas = MazeCanvas::new(generator);
    let mut colours = options.colour_cycle();
    let frame_delay = Delay::from_numer_denom_ms(options.frame_duration_ms(), 1);

    // One frame is held back so the final one can be given the longer delay.
    let mut pending: Option<RgbImage> = None;
    let mut frames_count = 0;
    loop {
        let done = canvas.advance(generator, options.steps_per_frame(), &mut colours);
        if let Some(previous) = pending.take() {
            encoder.encode_frame(gif_frame(previous, frame_delay))?;
            frames_count += 1;
        }
        pending = Some(canvas.to_image(width, height));
        if done {
            break;
        }
    }

    if let Some(last) = pending {
        encoder.encode_frame(gif_frame(last, Delay::from_numer_denom_ms(FINAL_FRAME_MS, 1)))?;
        frames_count += 1;
    }

    Ok(frames_count)
}

fn gif_frame(image: RgbImage, delay: Delay) -> Frame {
    Frame::from_parts(DynamicImage::ImageRgb8(image).to_rgba8(), 0, 0, delay)
}
