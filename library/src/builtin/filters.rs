//! Point and area filters used as stand-ins for the real resampling
//! kernels. Each one reads its single "input" pad and produces a fresh
//! buffer; an absent or empty input degrades to an empty output.

use crate::buffer::{Buffer, BufferData};
use crate::error::GraphError;
use crate::model::pad::{PadDefinition, PadFormat};
use crate::operation::config::Config;
use crate::operation::subgraph::Subgraph;
use crate::operation::{InputBuffers, Operation};

fn image_pads() -> Vec<PadDefinition> {
    vec![
        PadDefinition::input("input", PadFormat::Image),
        PadDefinition::output("output", PadFormat::Image),
    ]
}

fn input_data(inputs: &InputBuffers) -> Option<BufferData> {
    inputs.get("input").and_then(|b| b.with_data(|d| d.clone()))
}

/// Multiplies all channels by a constant (premultiplied alpha).
pub struct Opacity {
    value: f64,
}

impl Default for Opacity {
    fn default() -> Self {
        Self { value: 1.0 }
    }
}

impl Operation for Opacity {
    fn op_type(&self) -> &'static str {
        "opacity"
    }

    fn pads(&self) -> Vec<PadDefinition> {
        image_pads()
    }

    fn config_keys(&self) -> &'static [&'static str] {
        &["value"]
    }

    fn prepare(&mut self, config: &Config, _internal: Option<&mut Subgraph>)
    -> Result<(), GraphError> {
        self.value = config.number_or("value", 1.0);
        Ok(())
    }

    fn compute(&mut self, _output_pad: &str, inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        let Some(mut data) = input_data(inputs) else {
            return Ok(Buffer::empty());
        };
        let value = self.value as f32;
        for px in &mut data.pixels {
            *px *= value;
        }
        Ok(Buffer::new(data))
    }
}

/// Adds a constant to the color channels, leaving alpha untouched.
#[derive(Default)]
pub struct Brighten {
    amount: f64,
}

impl Operation for Brighten {
    fn op_type(&self) -> &'static str {
        "brighten"
    }

    fn pads(&self) -> Vec<PadDefinition> {
        image_pads()
    }

    fn config_keys(&self) -> &'static [&'static str] {
        &["amount"]
    }

    fn prepare(&mut self, config: &Config, _internal: Option<&mut Subgraph>)
    -> Result<(), GraphError> {
        self.amount = config.number_or("amount", 0.0);
        Ok(())
    }

    fn compute(&mut self, _output_pad: &str, inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        let Some(mut data) = input_data(inputs) else {
            return Ok(Buffer::empty());
        };
        let amount = self.amount as f32;
        for chunk in data.pixels.chunks_mut(4) {
            chunk[0] += amount;
            chunk[1] += amount;
            chunk[2] += amount;
        }
        Ok(Buffer::new(data))
    }
}

/// Translates the image by whole pixels; vacated areas become transparent.
#[derive(Default)]
pub struct Shift {
    x: f64,
    y: f64,
}

impl Operation for Shift {
    fn op_type(&self) -> &'static str {
        "shift"
    }

    fn pads(&self) -> Vec<PadDefinition> {
        image_pads()
    }

    fn config_keys(&self) -> &'static [&'static str] {
        &["x", "y"]
    }

    fn prepare(&mut self, config: &Config, _internal: Option<&mut Subgraph>)
    -> Result<(), GraphError> {
        self.x = config.number_or("x", 0.0);
        self.y = config.number_or("y", 0.0);
        Ok(())
    }

    fn compute(&mut self, _output_pad: &str, inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        let Some(data) = input_data(inputs) else {
            return Ok(Buffer::empty());
        };
        let (dx, dy) = (self.x.round() as isize, self.y.round() as isize);
        let mut out = BufferData::new(data.width, data.height);
        for y in 0..data.height as isize {
            for x in 0..data.width as isize {
                let (sx, sy) = (x - dx, y - dy);
                if sx < 0 || sy < 0 || sx >= data.width as isize || sy >= data.height as isize {
                    continue;
                }
                let src = 4 * (sy as usize * data.width + sx as usize);
                let dst = 4 * (y as usize * data.width + x as usize);
                out.pixels[dst..dst + 4].copy_from_slice(&data.pixels[src..src + 4]);
            }
        }
        Ok(Buffer::new(out))
    }
}

/// Box blur with a clamped square window.
pub struct Blur {
    radius: i64,
}

impl Default for Blur {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

impl Operation for Blur {
    fn op_type(&self) -> &'static str {
        "blur"
    }

    fn pads(&self) -> Vec<PadDefinition> {
        image_pads()
    }

    fn config_keys(&self) -> &'static [&'static str] {
        &["radius"]
    }

    fn prepare(&mut self, config: &Config, _internal: Option<&mut Subgraph>)
    -> Result<(), GraphError> {
        let radius = config.number_or("radius", 1.0) as i64;
        if radius < 0 {
            return Err(GraphError::InvalidArgument(format!(
                "blur radius must be non-negative, got {radius}"
            )));
        }
        self.radius = radius;
        Ok(())
    }

    fn compute(&mut self, _output_pad: &str, inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        let Some(data) = input_data(inputs) else {
            return Ok(Buffer::empty());
        };
        let r = self.radius as isize;
        let (w, h) = (data.width as isize, data.height as isize);
        let mut out = BufferData::new(data.width, data.height);
        for y in 0..h {
            for x in 0..w {
                let mut acc = [0.0f32; 4];
                let mut n = 0u32;
                for sy in (y - r).max(0)..=(y + r).min(h - 1) {
                    for sx in (x - r).max(0)..=(x + r).min(w - 1) {
                        let idx = 4 * (sy * w + sx) as usize;
                        for c in 0..4 {
                            acc[c] += data.pixels[idx + c];
                        }
                        n += 1;
                    }
                }
                let dst = 4 * (y * w + x) as usize;
                for c in 0..4 {
                    out.pixels[dst + c] = acc[c] / n as f32;
                }
            }
        }
        Ok(Buffer::new(out))
    }
}
