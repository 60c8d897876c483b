use std::error::Error;

use gnuplot::*;
use tracing_subscriber::EnvFilter;
use trapezoidal_motion::{GearLevel, Sample, TrapezoidalProfile};

fn main() -> Result<(), Box<dyn Error>> {
    // RUST_LOG=trapezoidal_motion=debug shows configuration and gear shifts,
    // =trace every sample.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // -----------------------
    // 1. Set up parameters
    // -----------------------
    let setpoint = 60.0; // Target displacement
    let sampling_rate = 100.0; // Control ticks per second

    // Low gear for pulling away, high gear once past 4 units/s.
    let gears = [
        GearLevel::new(5.0, 1.0, 0.0),
        GearLevel::new(10.0, 2.0, 4.0),
    ];

    // -------------------------
    // 2. Create and configure
    // -------------------------
    let mut profile = TrapezoidalProfile::new(setpoint, gears[0].max_velocity, gears[0].acceleration)?;
    profile.configure_shift(&gears)?;

    // --------------------------------
    // 3. Step the profile until done
    // --------------------------------
    let mut time_axis = Vec::new();
    let mut positions = Vec::new();
    let mut velocities = Vec::new();
    let mut accelerations = Vec::new();
    let mut shift_levels = Vec::new();

    let mut sample = Sample::zero();
    let mut tick = 0_u32;
    loop {
        let time = f64::from(tick) / sampling_rate;
        let status = profile.advance(&mut sample, time)?;

        time_axis.push(sample.time);
        positions.push(sample.distance);
        velocities.push(sample.velocity);
        accelerations.push(sample.acceleration);
        shift_levels.push(profile.current_shift_level() as f64);

        if status.is_done() {
            break;
        }
        tick += 1;
    }

    let position_error = (sample.distance - setpoint).abs();
    if position_error > 0.1 {
        eprintln!("Warning: final position is off by {position_error:.4} units.");
    }

    // --------------
    // 4. Plot data
    // --------------
    let mut fg = Figure::new();
    {
        let axes = fg.axes2d();
        axes.set_title("Trapezoidal profile with gear shifting", &[]);
        axes.set_x_label("Time (s)", &[]);
        axes.set_y_label("Position derivatives", &[]);
        axes.lines(&time_axis, &positions, &[Color("blue"), Caption("Position")]);
        axes.lines(&time_axis, &velocities, &[Color("red"), Caption("Velocity")]);
        axes.lines(&time_axis, &accelerations, &[Color("green"), Caption("Acceleration")]);
        axes.lines(&time_axis, &shift_levels, &[Color("black"), Caption("Gear")]);
    }

    fg.show().map_err(|e| format!("Failed to display plot: {e}"))?;

    println!(
        "Plot generated. Setpoint reached at {:.3} seconds, distance {:.4}.",
        sample.time, sample.distance
    );
    Ok(())
}
