use rand::Rng;
use serde::{Deserialize, Serialize};

/// Bounds and quantization for generated bid amounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRange {
    pub min: u64,
    pub max: u64,
    pub step: u64,
}

impl BidRange {
    pub fn new(min: u64, max: u64, step: u64) -> Self {
        Self { min, max, step }
    }

    /// Lowest quantized point at or above `min`.
    pub fn start(&self) -> u64 {
        let step = self.step.max(1);
        self.min.div_ceil(step).saturating_mul(step)
    }

    /// Highest quantized point at or below `max`.
    pub fn end(&self) -> u64 {
        let step = self.step.max(1);
        (self.max / step) * step
    }

    /// Number of quantized points inside the range, `None` if there are none.
    pub fn points(&self) -> Option<u64> {
        let (start, end) = (self.start(), self.end());
        if end < start {
            None
        } else {
            Some((end - start) / self.step.max(1) + 1)
        }
    }

    /// Draw a uniformly random quantized amount.
    ///
    /// When no quantized point lies inside `[min, max]` this deterministically
    /// returns [`BidRange::start`], which is above `max`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        match self.points() {
            Some(points) => self.start() + rng.gen_range(0..points) * self.step.max(1),
            None => self.start(),
        }
    }

    pub fn contains(&self, amount: u64) -> bool {
        let step = self.step.max(1);
        amount >= self.start()
            && amount <= self.max
            && (amount - self.start()) % step == 0
    }
}

/// Wire payload of a single bid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRequest {
    #[serde(rename = "lelang_id")]
    pub auction_id: i64,
    #[serde(rename = "harga_penawaran")]
    pub amount: u64,
}
