//! Per-instance attribute values for each draw-call kind.
//!
//! Adding a `DrawCall` variant fails to compile here until its attributes are
//! described.

use crate::scene::shapes::{Placement, unit_depth};
use crate::scene::{DrawCall, ShapeKind, TextCall};
use crate::shader::ShaderError;
use crate::text::GlyphInstance;

use super::attribute::{AttributeBuffer, AttributeValue, StagedAttribute, StepRate};
use super::batch::Drain;
use super::error::RenderError;
use super::program::ProgramLayout;

/// Index into the group table, present in every shape shader.
pub const DATA_INDEX: &str = "dataIndex";

const PLACED: [&str; 7] = ["position", "size", "depth", "transform", "transform0", "transform1", "transform2"];

/// Whether draw calls of `kind` can fill the instance attribute `name`.
pub(crate) fn supplies(kind: ShapeKind, name: &str) -> bool {
    if name == DATA_INDEX {
        return true;
    }
    match kind {
        ShapeKind::Fill | ShapeKind::Ellipse => PLACED.contains(&name) || name == "color",
        ShapeKind::Outline => PLACED.contains(&name) || matches!(name, "color" | "weight"),
        ShapeKind::Image => PLACED.contains(&name) || name == "tint",
        ShapeKind::Text => matches!(name, "position" | "depth" | "glyph"),
    }
}

fn placement_value(p: &Placement, name: &str) -> Option<AttributeValue> {
    let cols = p.transform.to_cols_array_2d();
    Some(match name {
        "position" => p.position.into(),
        "size" => p.size.into(),
        "depth" => unit_depth(p.depth).into(),
        "transform" => p.transform.into(),
        "transform0" => AttributeValue::Vec3(cols[0]),
        "transform1" => AttributeValue::Vec3(cols[1]),
        "transform2" => AttributeValue::Vec3(cols[2]),
        _ => return None,
    })
}

/// Value of instance attribute `name` for a single-instance call.
pub(crate) fn instance_value(call: &DrawCall, name: &str, group: u32) -> Option<AttributeValue> {
    if name == DATA_INDEX {
        return Some(AttributeValue::Int(group as i32));
    }
    match call {
        DrawCall::Fill(c) => match name {
            "color" => Some(c.color.into()),
            _ => placement_value(&c.placement, name),
        },
        DrawCall::Ellipse(c) => match name {
            "color" => Some(c.color.into()),
            _ => placement_value(&c.placement, name),
        },
        DrawCall::Outline(c) => match name {
            "color" => Some(c.color.into()),
            "weight" => Some(c.weight.into()),
            _ => placement_value(&c.placement, name),
        },
        DrawCall::Image(c) => match name {
            "tint" => Some(c.tint.into()),
            _ => placement_value(&c.placement, name),
        },
        // Expands per glyph.
        DrawCall::Text(_) => None,
    }
}

/// Value of instance attribute `name` for one glyph of a text call.
pub(crate) fn glyph_value(call: &TextCall, glyph: &GlyphInstance, name: &str, group: u32) -> Option<AttributeValue> {
    Some(match name {
        DATA_INDEX => AttributeValue::Int(group as i32),
        "position" => (call.raster_origin() + glyph.position).into(),
        "depth" => unit_depth(call.depth).into(),
        "glyph" => AttributeValue::Int(glyph.slot as i32),
        _ => return None,
    })
}

/// Fills every instance attribute of `layout` for the calls in `drain`.
///
/// `glyphs` lays out text calls; it must return one entry per `char`.
/// Attributes come back in the program's instance-layout order.
pub fn populate(
    layout: &ProgramLayout,
    drain: &Drain,
    mut glyphs: impl FnMut(&TextCall) -> Vec<GlyphInstance>,
) -> Result<Vec<StagedAttribute>, RenderError> {
    let fields = layout.instance().fields();
    let mut buffers = fields
        .iter()
        .map(|f| AttributeBuffer::new(f.name.as_str(), f.ty, StepRate::Instance, drain.instance_count))
        .collect::<Result<Vec<_>, _>>()?;

    let missing = |name: &str| -> RenderError {
        ShaderError::invalid(
            layout.descriptor().name(),
            format!("no value for attribute `{name}` in a {} call", layout.kind().name()),
        )
        .into()
    };

    for drained in &drain.calls {
        match &drained.call {
            DrawCall::Text(text) => {
                for glyph in glyphs(text) {
                    for buf in &mut buffers {
                        let value = glyph_value(text, &glyph, buf.name(), drained.group)
                            .ok_or_else(|| missing(buf.name()))?;
                        buf.put(value)?;
                    }
                }
            }
            call => {
                for buf in &mut buffers {
                    let value = instance_value(call, buf.name(), drained.group)
                        .ok_or_else(|| missing(buf.name()))?;
                    buf.put(value)?;
                }
            }
        }
    }

    Ok(buffers.into_iter().map(AttributeBuffer::finish).collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use glam::{Mat3, Vec2};

    use super::*;
    use crate::coords::Rect;
    use crate::paint::Color;
    use crate::render::BatchAccumulator;
    use crate::render::attribute::interleave;
    use crate::render::error::AttributeError;
    use crate::render::program::ShaderSources;
    use crate::render::template::GeometryTemplate;
    use crate::scene::{FillCall, OutlineCall};
    use crate::text::FontId;

    fn layout(kind: ShapeKind) -> ProgramLayout {
        ProgramLayout::new(kind, &ShaderSources::for_kind(kind), &GeometryTemplate::for_kind(kind), None).unwrap()
    }

    fn floats(staged: &StagedAttribute) -> Vec<f32> {
        staged.bytes().chunks_exact(4).map(bytemuck::pod_read_unaligned).collect()
    }

    fn ints(staged: &StagedAttribute) -> Vec<i32> {
        staged.bytes().chunks_exact(4).map(bytemuck::pod_read_unaligned).collect()
    }

    fn find<'a>(staged: &'a [StagedAttribute], name: &str) -> &'a StagedAttribute {
        staged.iter().find(|s| s.name() == name).unwrap()
    }

    #[test]
    fn every_kind_supplies_its_shader_inputs() {
        // ProgramLayout::new rejects unsupplied attributes; constructing all
        // bundled programs is the check.
        for kind in ShapeKind::ALL {
            let l = layout(kind);
            assert!(l.instance().fields().iter().all(|f| supplies(kind, &f.name)));
        }
    }

    #[test]
    fn fill_attributes_follow_calls() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(FillCall::new(Rect::new(1.0, 2.0, 3.0, 4.0), Color::WHITE).depth(0.5).into());
        acc.add_shape(
            FillCall::new(Rect::new(5.0, 6.0, 7.0, 8.0), Color::BLACK)
                .transform(Mat3::from_translation(Vec2::new(10.0, 20.0)))
                .into(),
        );
        let drain = acc.drain_next(16).unwrap();
        let staged = populate(&layout(ShapeKind::Fill), &drain, |_| unreachable!()).unwrap();

        assert_eq!(floats(find(&staged, "position")), [1.0, 2.0, 5.0, 6.0]);
        assert_eq!(floats(find(&staged, "depth")), [0.5, 0.0]);
        assert_eq!(floats(find(&staged, "transform2"))[3..], [10.0, 20.0, 1.0]);
        assert_eq!(floats(find(&staged, "color"))[4..], Color::BLACK.to_array());

        let index = ints(find(&staged, DATA_INDEX));
        assert_eq!(index, [0, 0]);

        let stride = layout(ShapeKind::Fill).instance().stride() as usize;
        assert_eq!(interleave(&staged).len(), 2 * stride);
    }

    #[test]
    fn group_index_tracks_drain_tables() {
        let mut acc = BatchAccumulator::new();
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        acc.add_shape(OutlineCall::new(rect, Color::BLACK, 1.0).clip(Rect::new(0.0, 0.0, 5.0, 5.0)).into());
        acc.add_shape(OutlineCall::new(rect, Color::BLACK, 2.0).into());
        let drain = acc.drain_next(16).unwrap();
        let staged = populate(&layout(ShapeKind::Outline), &drain, |_| unreachable!()).unwrap();

        let index = ints(find(&staged, DATA_INDEX));
        assert_eq!(index, [0, 1]);
        // Most recent batch first.
        assert_eq!(floats(find(&staged, "weight")), [2.0, 1.0]);
    }

    #[test]
    fn deeper_call_is_populated_first() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(FillCall::new(Rect::new(0.0, 0.0, 100.0, 100.0), Color::WHITE).depth(0.9).into());
        acc.add_shape(
            FillCall::new(Rect::new(25.0, 25.0, 50.0, 50.0), Color::from_straight(1.0, 0.0, 0.0, 1.0))
                .depth(0.1)
                .clip(Rect::new(0.0, 0.0, 100.0, 100.0))
                .into(),
        );
        let mut drain = acc.drain_next(16).unwrap();
        drain.sort_back_to_front();
        let staged = populate(&layout(ShapeKind::Fill), &drain, |_| unreachable!()).unwrap();

        assert_eq!(floats(find(&staged, "depth")), [0.9, 0.1]);
        assert_eq!(floats(find(&staged, "position")), [0.0, 0.0, 25.0, 25.0]);
        // The background's group was opened first, so it drains second.
        assert_eq!(ints(find(&staged, DATA_INDEX)), [1, 0]);
    }

    #[test]
    fn depth_is_clamped_to_unit_range() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(FillCall::new(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE).depth(2.0).into());
        acc.add_shape(FillCall::new(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE).depth(-3.0).into());
        acc.add_shape(FillCall::new(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE).depth(f32::NAN).into());
        let drain = acc.drain_next(16).unwrap();
        let staged = populate(&layout(ShapeKind::Fill), &drain, |_| unreachable!()).unwrap();

        assert_eq!(floats(find(&staged, "depth")), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn text_expands_per_glyph() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(TextCall::new("abc", FontId(0), 16.0, Color::BLACK, Vec2::ZERO).depth(0.25).into());
        let drain = acc.drain_next(16).unwrap();
        let staged = populate(&layout(ShapeKind::Text), &drain, |call| {
            (0..call.glyph_count())
                .map(|i| GlyphInstance { position: Vec2::new(i as f32 * 10.0, 0.0), slot: i as u32 + 1 })
                .collect()
        })
        .unwrap();

        assert_eq!(floats(find(&staged, "position")), [0.0, 0.0, 10.0, 0.0, 20.0, 0.0]);
        assert_eq!(floats(find(&staged, "depth")), [0.25; 3]);
        let slots = ints(find(&staged, "glyph"));
        assert_eq!(slots, [1, 2, 3]);
    }

    #[test]
    fn text_origin_lands_in_glyph_positions() {
        let mut acc = BatchAccumulator::new();
        // 64 px is twice the raster size, so the origin is halved.
        acc.add_shape(TextCall::new("ab", FontId(0), 64.0, Color::BLACK, Vec2::new(100.0, 40.0)).into());
        acc.add_shape(TextCall::new("c", FontId(0), 64.0, Color::BLACK, Vec2::new(0.0, 200.0)).into());
        assert_eq!(acc.len(), 1);

        let drain = acc.drain_next(16).unwrap();
        let staged = populate(&layout(ShapeKind::Text), &drain, |call| {
            (0..call.glyph_count())
                .map(|i| GlyphInstance { position: Vec2::new(i as f32 * 10.0, 0.0), slot: 1 })
                .collect()
        })
        .unwrap();

        assert_eq!(floats(find(&staged, "position")), [50.0, 20.0, 60.0, 20.0, 0.0, 100.0]);
        assert_eq!(ints(find(&staged, DATA_INDEX)), [0, 0, 0]);
    }

    #[test]
    fn short_glyph_layout_is_underfill() {
        let mut acc = BatchAccumulator::new();
        acc.add_shape(TextCall::new("abc", FontId(0), 16.0, Color::BLACK, Vec2::ZERO).into());
        let drain = acc.drain_next(16).unwrap();
        let err = populate(&layout(ShapeKind::Text), &drain, |_| vec![GlyphInstance::EMPTY]).unwrap_err();
        assert!(matches!(err, RenderError::Attribute(AttributeError::Underfill { written: 1, expected: 3, .. })));
    }
}
