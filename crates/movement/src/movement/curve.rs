use serde::{Deserialize, Serialize};

/// Piecewise linear curve mapping climb progress in `[0, 1]` to a speed
/// multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedCurve {
    keys: Vec<(f32, f32)>,
}

const MIN_MULTIPLIER: f32 = 0.05;

impl Default for SpeedCurve {
    fn default() -> Self {
        Self::new(vec![(0.0, 0.6), (0.3, 1.0), (0.8, 1.0), (1.0, 0.5)])
    }
}

impl SpeedCurve {
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    pub fn constant(value: f32) -> Self {
        Self::new(vec![(0.0, value)])
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        let value = match self.keys.as_slice() {
            [] => 1.0,
            [(_, only)] => *only,
            keys => {
                let t = t.clamp(0.0, 1.0);
                let upper = keys.iter().position(|(key, _)| *key >= t);
                match upper {
                    None => keys[keys.len() - 1].1,
                    Some(0) => keys[0].1,
                    Some(index) => {
                        let (t0, v0) = keys[index - 1];
                        let (t1, v1) = keys[index];
                        let span = t1 - t0;
                        if span <= f32::EPSILON {
                            v1
                        } else {
                            crate::math::lerp(v0, v1, (t - t0) / span)
                        }
                    }
                }
            }
        };
        value.max(MIN_MULTIPLIER)
    }
}
