use anyhow::{Context, Result, bail};
use sweepline_core::Sample;
use tracing::warn;

/// Parses a CSV gaze trace of `x,y,t` rows.
///
/// Blank lines and `#` comments are skipped, as is a single header row
/// before the first sample.
pub(super) fn parse_trace(text: &str) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();
    let mut header_seen = false;
    let mut backwards_steps = 0usize;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            bail!("line {line_no}: expected 3 fields `x,y,t`, found {}", fields.len());
        }

        if samples.is_empty() && !header_seen && fields[0].parse::<f64>().is_err() {
            header_seen = true;
            continue;
        }

        let x = fields[0]
            .parse::<f32>()
            .with_context(|| format!("line {line_no}: bad x `{}`", fields[0]))?;
        let y = fields[1]
            .parse::<f32>()
            .with_context(|| format!("line {line_no}: bad y `{}`", fields[1]))?;
        let t = fields[2]
            .parse::<f64>()
            .with_context(|| format!("line {line_no}: bad t `{}`", fields[2]))?;

        if samples.last().is_some_and(|prev: &Sample| t < prev.t) {
            backwards_steps += 1;
        }
        samples.push(Sample::new(x, y, t));
    }

    if backwards_steps > 0 {
        warn!(backwards_steps, "trace timestamps go backwards; those steps count as no motion");
    }

    Ok(samples)
}

/// Splits `--layout` style input such as `100, 140,180`.
pub(super) fn parse_centers(text: &str) -> Result<Vec<f32>> {
    text.split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| {
            field
                .parse::<f32>()
                .with_context(|| format!("bad line center `{field}`"))
        })
        .collect()
}
