/// Maps a possibly out-of-range index onto `0..len` by mirroring at both
/// ends, repeating the edge sample (`[a b c]` extends to `b a | a b c | c b`).
fn reflect(index: isize, len: usize) -> usize {
    #[allow(clippy::cast_possible_wrap)]
    let period = 2 * len as isize;
    let m = index.rem_euclid(period);
    #[allow(clippy::cast_sign_loss)]
    let m = m as usize;
    if m < len {
        m
    } else {
        2 * len - 1 - m
    }
}

/// Trailing moving average of width `window` over a sequence of 3D samples.
///
/// Sample `k` of the output is the mean of input samples `k + 1 - window ..= k`,
/// with indices before the start mirrored back into the sequence. A window of
/// one (or zero) returns the input unchanged.
#[must_use]
pub fn moving_average(values: &[[f64; 3]], window: usize) -> Vec<[f64; 3]> {
    if window <= 1 || values.is_empty() {
        return values.to_vec();
    }

    let len = values.len();
    #[allow(clippy::cast_possible_wrap)]
    let w = window as isize;
    #[allow(clippy::cast_precision_loss)]
    let inv = 1.0 / window as f64;

    let mut sum = [0.0_f64; 3];
    for j in (1 - w)..=0 {
        let v = values[reflect(j, len)];
        for axis in 0..3 {
            sum[axis] += v[axis];
        }
    }

    let mut out = Vec::with_capacity(len);
    out.push([sum[0] * inv, sum[1] * inv, sum[2] * inv]);
    for k in 1..len {
        #[allow(clippy::cast_possible_wrap)]
        let k = k as isize;
        let incoming = values[reflect(k, len)];
        let outgoing = values[reflect(k - w, len)];
        for axis in 0..3 {
            sum[axis] += incoming[axis] - outgoing[axis];
        }
        out.push([sum[0] * inv, sum[1] * inv, sum[2] * inv]);
    }
    out
}

/// Moving average applied forward and then over the reversed sequence, which
/// cancels the lag a single trailing pass introduces.
#[must_use]
pub fn zero_phase_moving_average(values: &[[f64; 3]], window: usize) -> Vec<[f64; 3]> {
    let mut forward = moving_average(values, window);
    forward.reverse();
    let mut smoothed = moving_average(&forward, window);
    smoothed.reverse();
    smoothed
}
