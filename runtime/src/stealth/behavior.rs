//! Human-like input pacing.
//!
//! Random delays and jittered pointer paths for the `human_like` action.

use rand::Rng;
use std::time::Duration;

/// Generate a random delay between min_ms and max_ms.
pub fn random_delay(min_ms: u64, max_ms: u64) -> Duration {
    let mut rng = rand::thread_rng();
    let ms = rng.gen_range(min_ms..=max_ms);
    Duration::from_millis(ms)
}

/// Delay between pointer samples (20-140ms).
pub fn pointer_delay() -> Duration {
    random_delay(20, 140)
}

/// Delay between actions (150-400ms).
pub fn action_delay() -> Duration {
    random_delay(150, 400)
}

/// Typing delay between characters (60-180ms).
pub fn typing_delay() -> Duration {
    random_delay(60, 180)
}

pub async fn sleep_action_delay() {
    tokio::time::sleep(action_delay()).await;
}

pub async fn sleep_pointer_delay() {
    tokio::time::sleep(pointer_delay()).await;
}

pub async fn sleep_typing_delay() {
    tokio::time::sleep(typing_delay()).await;
}

/// A wandering pointer path of `steps` points inside a `width × height` box.
///
/// Each step travels 15-80 px in a slowly turning direction, so consecutive
/// samples never collapse into sub-pixel jitter.
pub fn jittered_path(steps: usize, width: f64, height: f64) -> Vec<(f64, f64)> {
    let mut rng = rand::thread_rng();
    let mut x = rng.gen_range(width * 0.2..width * 0.8);
    let mut y = rng.gen_range(height * 0.2..height * 0.8);
    let mut heading: f64 = rng.gen_range(0.0..std::f64::consts::TAU);

    let mut path = Vec::with_capacity(steps);
    for _ in 0..steps {
        heading += rng.gen_range(-0.6..0.6);
        let stride = rng.gen_range(15.0..80.0);
        x += heading.cos() * stride;
        y += heading.sin() * stride;

        // Bounce off the edges.
        if x < 1.0 || x > width - 1.0 {
            heading = std::f64::consts::PI - heading;
            x = x.clamp(1.0, width - 1.0);
        }
        if y < 1.0 || y > height - 1.0 {
            heading = -heading;
            y = y.clamp(1.0, height - 1.0);
        }
        path.push((x.round(), y.round()));
    }
    path
}

/// Row-major grid of pointer positions, `step_px` apart, starting at the
/// first step from the origin.
pub fn grid_path(cols: u32, rows: u32, step_px: f64) -> Vec<(f64, f64)> {
    (1..=rows)
        .flat_map(|r| (1..=cols).map(move |c| (c as f64 * step_px, r as f64 * step_px)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_bounds() {
        for _ in 0..50 {
            let d = pointer_delay().as_millis();
            assert!((20..=140).contains(&d));
            let t = typing_delay().as_millis();
            assert!((60..=180).contains(&t));
        }
    }

    #[test]
    fn test_jittered_path_stays_inside_and_moves() {
        let path = jittered_path(40, 800.0, 600.0);
        assert_eq!(path.len(), 40);
        for &(x, y) in &path {
            assert!((1.0..=799.0).contains(&x));
            assert!((1.0..=599.0).contains(&y));
        }
        let distinct = path.windows(2).filter(|w| w[0] != w[1]).count();
        assert!(distinct > 30);
    }

    #[test]
    fn test_grid_path_is_uniform() {
        let path = grid_path(3, 2, 50.0);
        assert_eq!(
            path,
            vec![(50.0, 50.0), (100.0, 50.0), (150.0, 50.0), (50.0, 100.0), (100.0, 100.0), (150.0, 100.0)]
        );
    }
}
