//! Small numeric helpers over possibly empty samples. Empty input yields
//! `None` or 0, never NaN.

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

pub fn mean_or_zero(values: impl IntoIterator<Item = f64>) -> f64 {
    mean(values).unwrap_or(0.0)
}

fn sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.into_iter().filter(|x| x.is_finite()).collect();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let v = sorted(values);
    let n = v.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}

/// Linear-interpolated percentile, `p` in [0, 1].
pub fn percentile(values: impl IntoIterator<Item = f64>, p: f64) -> Option<f64> {
    let v = sorted(values);
    if v.is_empty() {
        return None;
    }
    let rank = p.clamp(0.0, 1.0) * (v.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(v[lo] + (v[hi] - v[lo]) * frac)
}

/// Fraction of `true` entries, 0 for an empty sample.
pub fn ratio_true<'a>(values: impl IntoIterator<Item = &'a bool>) -> f64 {
    let (hits, n) = values
        .into_iter()
        .fold((0usize, 0usize), |(h, n), ok| (h + usize::from(*ok), n + 1));
    if n == 0 {
        0.0
    } else {
        hits as f64 / n as f64
    }
}
