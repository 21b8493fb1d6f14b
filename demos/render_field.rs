use std::{error::Error, time::Instant};

use field_kernel::{export::to_gray_image, prelude::*};
use tracing::{info, Level};

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 1024;
const POINT: u32 = 8;
const FREQUENCY: f32 = 43000.0;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let gpu = GpuCompute::with_options(ComputeOptions::from_env())?;
    let params = SceneParameters::new(WIDTH, HEIGHT)
        .with_freq(FREQUENCY)
        .with_count(POINT);
    let mut pipeline = gpu.field_pipeline(ConstantField::default(), params.cell_count())?;

    let started = Instant::now();
    let cells = pipeline.read_output_blocking(&params)?;
    info!("compute done in {:?}, start extraction.", started.elapsed());

    let image = to_gray_image(&params, &cells)?;
    image.save("output.png")?;
    info!("saved output.png");
    Ok(())
}
