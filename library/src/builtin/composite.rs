//! Binary compositing — overlays "aux" onto "input".

use crate::buffer::Buffer;
use crate::error::GraphError;
use crate::model::pad::{PadDefinition, PadFormat};
use crate::operation::{InputBuffers, Operation};

/// Porter-Duff "over" on premultiplied RGBA. The output takes the
/// background's geometry; with only one side present the op passes that
/// side through unchanged.
#[derive(Default)]
pub struct Over;

impl Operation for Over {
    fn op_type(&self) -> &'static str {
        "over"
    }

    fn pads(&self) -> Vec<PadDefinition> {
        vec![
            PadDefinition::input("input", PadFormat::Image),
            PadDefinition::input("aux", PadFormat::Image),
            PadDefinition::output("output", PadFormat::Image),
        ]
    }

    fn compute(&mut self, _output_pad: &str, inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        let background = inputs.get("input").filter(|b| !b.is_empty());
        let foreground = inputs.get("aux").filter(|b| !b.is_empty());

        let (background, foreground) = match (background, foreground) {
            (Some(bg), Some(fg)) => (bg, fg),
            (Some(bg), None) => return Ok(bg.acquire()),
            (None, Some(fg)) => return Ok(fg.acquire()),
            (None, None) => return Ok(Buffer::empty()),
        };

        let Some(mut out) = background.with_data(|d| d.clone()) else {
            return Ok(Buffer::empty());
        };
        foreground.with_data(|fg| {
            for y in 0..out.height.min(fg.height) {
                for x in 0..out.width.min(fg.width) {
                    let src = 4 * (y * fg.width + x);
                    let dst = 4 * (y * out.width + x);
                    let alpha = fg.pixels[src + 3];
                    for c in 0..4 {
                        out.pixels[dst + c] =
                            fg.pixels[src + c] + out.pixels[dst + c] * (1.0 - alpha);
                    }
                }
            }
        });
        Ok(Buffer::new(out))
    }
}
