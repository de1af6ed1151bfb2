// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Triangle and line scan conversion.
//!
//! Vertices arrive in clip space. Triangles are clipped against the near
//! plane, mapped through the viewport and walked with edge functions over
//! their bounding box. Pixel centers sit at half-integer coordinates and
//! window `y` grows upwards.

use super::kernels::{Varyings, VertexOutput};
use umbra_core::math::{Vec2, Vec3, Vec4};
use umbra_core::renderer::Viewport;

/// Fixed-function state a primitive is rasterized with.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RasterState {
    pub viewport: Viewport,
    pub cull_back_faces: bool,
    pub target_width: u32,
    pub target_height: u32,
}

impl RasterState {
    /// Pixel rectangle `[x0, x1) x [y0, y1)` covered by both the viewport
    /// and the target.
    fn scissor(&self) -> (i32, i32, i32, i32) {
        let vp = self.viewport;
        let x0 = vp.x.max(0);
        let y0 = vp.y.max(0);
        let x1 = (vp.x + vp.width as i32).min(self.target_width as i32);
        let y1 = (vp.y + vp.height as i32).min(self.target_height as i32);
        (x0, y0, x1, y1)
    }
}

/// A covered pixel with its interpolated inputs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fragment {
    pub x: u32,
    pub y: u32,
    /// Window-space depth in `[0, 1]`.
    pub depth: f32,
    /// `(x + 0.5, y + 0.5, depth, 1 / w)`.
    pub frag_coord: Vec4,
    pub varyings: Varyings,
}

#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    clip: Vec4,
    varyings: Varyings,
}

impl ClipVertex {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut varyings = self.varyings;
        for (v, o) in varyings.iter_mut().zip(&other.varyings) {
            *v = v.lerp(*o, t);
        }
        Self {
            clip: self.clip.lerp(other.clip, t),
            varyings,
        }
    }

    /// Distance to the near plane `z = -w`, positive inside.
    fn near_distance(&self) -> f32 {
        self.clip.z + self.clip.w
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowVertex {
    position: Vec3,
    inv_w: f32,
    varyings: Varyings,
}

fn to_window(state: &RasterState, vertex: &ClipVertex) -> WindowVertex {
    let inv_w = 1.0 / vertex.clip.w;
    let ndc = vertex.clip.truncate() * inv_w;
    let vp = state.viewport;
    WindowVertex {
        position: Vec3::new(
            vp.x as f32 + (ndc.x + 1.0) * 0.5 * vp.width as f32,
            vp.y as f32 + (ndc.y + 1.0) * 0.5 * vp.height as f32,
            ndc.z * 0.5 + 0.5,
        ),
        inv_w,
        varyings: vertex.varyings,
    }
}

/// Sutherland-Hodgman against the near plane.
fn clip_near(polygon: &[ClipVertex]) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    for (i, current) in polygon.iter().enumerate() {
        let next = &polygon[(i + 1) % polygon.len()];
        let dc = current.near_distance();
        let dn = next.near_distance();
        if dc >= 0.0 {
            out.push(*current);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            out.push(current.lerp(next, dc / (dc - dn)));
        }
    }
    out
}

/// Edge function: twice the signed area of `(a, b, p)`, positive when `p`
/// is left of `a -> b`.
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Top-left rule for counter-clockwise triangles with `y` up: pixels
/// exactly on an edge belong to it only if it is a left edge (going down)
/// or a top edge (horizontal, going left).
fn owns_boundary(a: Vec2, b: Vec2) -> bool {
    let d = b - a;
    d.y < 0.0 || (d.y == 0.0 && d.x < 0.0)
}

/// Rasterizes one triangle. Counter-clockwise triangles are front facing.
pub(crate) fn draw_triangle(
    state: &RasterState,
    vertices: [&VertexOutput; 3],
    emit: &mut dyn FnMut(Fragment),
) {
    let polygon: Vec<ClipVertex> = vertices
        .iter()
        .map(|v| ClipVertex {
            clip: v.clip,
            varyings: v.varyings,
        })
        .collect();
    let clipped = clip_near(&polygon);
    if clipped.len() < 3 || clipped.iter().any(|v| v.clip.w <= 0.0) {
        return;
    }
    let window: Vec<WindowVertex> = clipped.iter().map(|v| to_window(state, v)).collect();
    for i in 1..window.len() - 1 {
        fill_triangle(state, [window[0], window[i], window[i + 1]], emit);
    }
}

fn fill_triangle(state: &RasterState, mut tri: [WindowVertex; 3], emit: &mut dyn FnMut(Fragment)) {
    let p = |v: &WindowVertex| v.position.truncate();
    let mut area = edge(p(&tri[0]), p(&tri[1]), p(&tri[2]));
    if area == 0.0 || !area.is_finite() {
        return;
    }
    if area < 0.0 {
        if state.cull_back_faces {
            return;
        }
        tri.swap(1, 2);
        area = -area;
    }

    let (sx0, sy0, sx1, sy1) = state.scissor();
    let min = p(&tri[0]).min(p(&tri[1])).min(p(&tri[2]));
    let max = p(&tri[0]).max(p(&tri[1])).max(p(&tri[2]));
    let x0 = (min.x.floor() as i32).max(sx0);
    let y0 = (min.y.floor() as i32).max(sy0);
    let x1 = (max.x.ceil() as i32).min(sx1);
    let y1 = (max.y.ceil() as i32).min(sy1);

    let [a, b, c] = [p(&tri[0]), p(&tri[1]), p(&tri[2])];
    let edges = [(b, c), (c, a), (a, b)];
    let owned = edges.map(|(from, to)| owns_boundary(from, to));

    for y in y0..y1 {
        for x in x0..x1 {
            let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let mut weights = [0.0; 3];
            let mut inside = true;
            for (i, (from, to)) in edges.iter().enumerate() {
                let e = edge(*from, *to, center);
                if e < 0.0 || (e == 0.0 && !owned[i]) {
                    inside = false;
                    break;
                }
                weights[i] = e / area;
            }
            if !inside {
                continue;
            }

            let depth = weights[0] * tri[0].position.z
                + weights[1] * tri[1].position.z
                + weights[2] * tri[2].position.z;
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }

            // Perspective-correct weights.
            let pw = [
                weights[0] * tri[0].inv_w,
                weights[1] * tri[1].inv_w,
                weights[2] * tri[2].inv_w,
            ];
            let inv_w = pw[0] + pw[1] + pw[2];
            let mut varyings = Varyings::default();
            for (slot, value) in varyings.iter_mut().enumerate() {
                *value = (tri[0].varyings[slot] * pw[0]
                    + tri[1].varyings[slot] * pw[1]
                    + tri[2].varyings[slot] * pw[2])
                    / inv_w;
            }

            emit(Fragment {
                x: x as u32,
                y: y as u32,
                depth,
                frag_coord: Vec4::new(center.x, center.y, depth, inv_w),
                varyings,
            });
        }
    }
}

/// Rasterizes a line segment with a DDA walk. Varyings are interpolated
/// linearly in window space.
pub(crate) fn draw_line(
    state: &RasterState,
    vertices: [&VertexOutput; 2],
    emit: &mut dyn FnMut(Fragment),
) {
    let mut a = ClipVertex {
        clip: vertices[0].clip,
        varyings: vertices[0].varyings,
    };
    let mut b = ClipVertex {
        clip: vertices[1].clip,
        varyings: vertices[1].varyings,
    };
    let (da, db) = (a.near_distance(), b.near_distance());
    if da < 0.0 && db < 0.0 {
        return;
    }
    if da < 0.0 {
        a = a.lerp(&b, da / (da - db));
    } else if db < 0.0 {
        b = b.lerp(&a, db / (db - da));
    }
    if a.clip.w <= 0.0 || b.clip.w <= 0.0 {
        return;
    }

    let (wa, wb) = (to_window(state, &a), to_window(state, &b));
    let delta = wb.position - wa.position;
    let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as u32;
    let (sx0, sy0, sx1, sy1) = state.scissor();

    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let position = wa.position.lerp(wb.position, t);
        let (x, y) = (position.x.floor() as i32, position.y.floor() as i32);
        if x < sx0 || y < sy0 || x >= sx1 || y >= sy1 || !(0.0..=1.0).contains(&position.z) {
            continue;
        }
        let mut varyings = wa.varyings;
        for (v, other) in varyings.iter_mut().zip(&wb.varyings) {
            *v = v.lerp(*other, t);
        }
        emit(Fragment {
            x: x as u32,
            y: y as u32,
            depth: position.z,
            frag_coord: Vec4::new(
                x as f32 + 0.5,
                y as f32 + 0.5,
                position.z,
                wa.inv_w + (wb.inv_w - wa.inv_w) * t,
            ),
            varyings,
        });
    }
}
