pub mod comparison;
pub mod sensitivity;
pub mod implied_vol;
pub mod payoff;
pub mod profile;

/// `points` evenly spaced values from `start` to `end`, both inclusive.
/// A single point yields `[start]`; zero points yield an empty vector.
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
