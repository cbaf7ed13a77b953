// Four-channel motor speed value and its wire format
//
// Channel order on the wire is X, Y, Z, W; each line is
// `<channel><sign><2 hex digits>\n`, e.g. `x+ff`, `y-00`.

/// Largest magnitude a channel may carry
pub const MAX_INTENSITY: i32 = 255;

/// Signed intensities for the four actuator channels
///
/// Intermediate results of `gain`/`lerp` may leave [-255, 255]; call
/// `limit` before using a value downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotorSpeed {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
}

impl MotorSpeed {
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    // Fully engaged states, fixed by the platform's actuator wiring
    pub const SNAPTURN_LEFT: Self = Self::new(255, 255, 255, 255);
    pub const SNAPTURN_RIGHT: Self = Self::new(-255, -255, -255, -255);
    pub const MOVE_FORWARD: Self = Self::new(255, -255, -255, 255);
    pub const MOVE_BACK: Self = Self::new(-255, 255, 255, -255);
    pub const MOVE_LEFT: Self = Self::new(-255, -255, 255, 255);
    pub const MOVE_RIGHT: Self = Self::new(255, 255, -255, -255);

    pub const fn new(x: i32, y: i32, z: i32, w: i32) -> Self {
        Self { x, y, z, w }
    }

    /// Returns channels as array [x, y, z, w]
    pub fn as_array(&self) -> [i32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Apply `f` to every channel
    pub fn map(self, f: impl Fn(i32) -> i32) -> Self {
        Self::new(f(self.x), f(self.y), f(self.z), f(self.w))
    }

    /// Apply `f` channel-wise to `self` and `other`
    pub fn combine(self, other: Self, f: impl Fn(i32, i32) -> i32) -> Self {
        Self::new(
            f(self.x, other.x),
            f(self.y, other.y),
            f(self.z, other.z),
            f(self.w, other.w),
        )
    }

    /// Scale every channel, truncating toward zero
    pub fn gain(self, g: f32) -> Self {
        self.map(|c| (c as f32 * g) as i32)
    }

    /// Per channel `a + trunc((b - a) * v)`; `v` is not range checked
    pub fn lerp(self, other: Self, v: f32) -> Self {
        self.combine(other, |a, b| a + ((b - a) as f32 * v) as i32)
    }

    /// Clamp every channel to [-255, 255]
    pub fn limit(self) -> Self {
        self.map(|c| c.clamp(-MAX_INTENSITY, MAX_INTENSITY))
    }

    /// Largest absolute channel value
    pub fn max_abs(&self) -> i32 {
        self.as_array().iter().map(|c| c.abs()).max().unwrap_or(0)
    }

    /// Encode as the four-line motor driver frame
    pub fn serialize(&self) -> String {
        let mut frame = String::with_capacity(20);
        for (label, value) in ['x', 'y', 'z', 'w'].into_iter().zip(self.as_array()) {
            let sign = if value < 0 { '-' } else { '+' };
            let magnitude = value.unsigned_abs().min(MAX_INTENSITY as u32);
            frame.push_str(&format!("{}{}{:02x}\n", label, sign, magnitude));
        }
        frame
    }
}
