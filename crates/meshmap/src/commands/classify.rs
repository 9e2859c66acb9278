//! Link classification handler.

use serde::Serialize;

use meshmap_core::LinkQuality;

use crate::cli::ClassifyArgs;
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Debug, Serialize)]
struct Classification {
    snr: f32,
    rssi: Option<i32>,
    quality: LinkQuality,
    color: &'static str,
}

pub fn handle(args: &ClassifyArgs, ctx: &Context) -> Result<(), CliError> {
    if !args.snr.is_finite() {
        return Err(CliError::Validation {
            field: "snr".into(),
            reason: "must be a finite number".into(),
        });
    }

    let quality = ctx.mesh.overlay.thresholds.classify(args.snr, args.rssi);
    let result = Classification {
        snr: args.snr,
        rssi: args.rssi,
        quality,
        color: quality.color(),
    };

    let out = output::render_single(
        ctx.output,
        &result,
        |c| {
            format!(
                "Quality: {}\nColor:   {}",
                output::paint_quality(c.quality, ctx.color),
                c.color
            )
        },
        |c| c.quality.to_string(),
    )?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
