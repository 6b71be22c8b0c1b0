//! Running standard deviation (Welford)

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StdDev {
    count: u32,
    mean: f32,
    sum_sq: f32,
}

impl StdDev {
    pub const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            sum_sq: 0.0,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn push(&mut self, x: f32) {
        self.count += 1;
        if self.count == 1 {
            self.mean = x;
            self.sum_sq = 0.0;
        } else {
            let old_mean = self.mean;
            self.mean = old_mean + (x - old_mean) / self.count as f32;
            self.sum_sq += (x - old_mean) * (x - self.mean);
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Sample variance, zero until two samples are seen
    pub fn variance(&self) -> f32 {
        if self.count > 1 {
            self.sum_sq / (self.count - 1) as f32
        } else {
            0.0
        }
    }

    pub fn standard_deviation(&self) -> f32 {
        libm::sqrtf(self.variance())
    }
}
