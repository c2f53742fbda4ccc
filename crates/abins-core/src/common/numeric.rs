/// `[0!, 1!, ..., (count - 1)!]` as floats.
pub fn factorial_table(count: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(count);
    let mut running = 1.0_f64;
    for n in 0..count {
        if n > 0 {
            running *= n as f64;
        }
        table.push(running);
    }
    table
}

/// Element-wise compensated accumulation of weighted rows.
#[derive(Debug, Clone)]
pub struct CompensatedRowSum {
    sum: Vec<f64>,
    correction: Vec<f64>,
}

impl CompensatedRowSum {
    pub fn zeros(len: usize) -> Self {
        Self {
            sum: vec![0.0; len],
            correction: vec![0.0; len],
        }
    }

    /// Rows shorter or longer than the accumulator are a caller bug; extra
    /// entries are ignored.
    pub fn add_weighted(&mut self, row: &[f64], weight: f64) {
        for ((sum, correction), value) in self.sum.iter_mut().zip(&mut self.correction).zip(row) {
            kahan_add(sum, correction, value * weight);
        }
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.sum
    }
}

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn relative_difference(lhs: f64, rhs: f64, relative_floor: f64) -> f64 {
    let scale = lhs.abs().max(rhs.abs()).max(relative_floor);
    (lhs - rhs).abs() / scale
}

pub fn within_tolerance(
    lhs: f64,
    rhs: f64,
    abs_tol: f64,
    rel_tol: f64,
    relative_floor: f64,
) -> bool {
    let abs_diff = (lhs - rhs).abs();
    abs_diff <= abs_tol || relative_difference(lhs, rhs, relative_floor) <= rel_tol
}
