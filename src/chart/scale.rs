/// Square-root scale from measure values to bubble radii, so bubble area grows
/// linearly with the value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SqrtScale {
    domain: (f64, f64),
    range: (f32, f32),
}

impl SqrtScale {
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    /// Builds the domain from every value; an empty input maps onto [0, 1].
    pub fn from_values(values: &[f64], range: (f32, f32)) -> Self {
        let min = values.iter().copied().reduce(f64::min).unwrap_or(0.0);
        let max = values.iter().copied().reduce(f64::max).unwrap_or(1.0);
        Self::new((min, max), range)
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn scale(&self, value: f64) -> f32 {
        let (start, end) = self.range;
        let low = signed_sqrt(self.domain.0);
        let high = signed_sqrt(self.domain.1);
        let span = high - low;

        // A collapsed domain maps everything onto the middle of the range.
        let t = if span.abs() < f64::EPSILON || !span.is_finite() {
            0.5
        } else {
            (signed_sqrt(value) - low) / span
        };

        start + (end - start) * t as f32
    }
}

fn signed_sqrt(value: f64) -> f64 {
    if value < 0.0 {
        -(-value).sqrt()
    } else {
        value.sqrt()
    }
}
