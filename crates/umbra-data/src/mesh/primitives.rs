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

//! Generators for simple shapes.
//!
//! Every generator returns a value-typed [`MeshData`] that the caller moves
//! into a device. Triangle meshes wind counter-clockwise when seen from
//! outside. Line meshes carry zeroed normals and texture coordinates.

use umbra_core::math::{Vec2, Vec3, TAU};
use umbra_core::renderer::{MeshData, PrimitiveTopology};

const MIN_DIVISIONS: u16 = 3;

fn clamp_divisions(divisions: u16) -> u16 {
    if divisions < MIN_DIVISIONS {
        log::warn!("{divisions} divisions is too few for a round shape, using {MIN_DIVISIONS}");
        MIN_DIVISIONS
    } else {
        divisions
    }
}

fn lines(positions: Vec<Vec3>, indices: Vec<u16>) -> MeshData {
    let count = positions.len();
    MeshData {
        positions,
        normals: vec![Vec3::ZERO; count],
        tex_coords: vec![Vec2::ZERO; count],
        indices,
        topology: PrimitiveTopology::Lines,
    }
}

/// A 2x2 quad in the XY plane facing +Z.
pub fn quad() -> MeshData {
    let positions = vec![
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, 1.0, 0.0),
    ];
    let tex_coords = positions
        .iter()
        .map(|p| Vec2::new(p.x, p.y) * 0.5 + 0.5)
        .collect();
    MeshData {
        normals: vec![Vec3::Z; 4],
        tex_coords,
        positions,
        indices: vec![0, 1, 2, 2, 3, 0],
        topology: PrimitiveTopology::Triangles,
    }
}

/// An axis-aligned box spanning `min..max`, with flat-shaded faces.
pub fn box_mesh(min: Vec3, max: Vec3) -> MeshData {
    // Four corners per face, counter-clockwise seen from outside.
    let faces: [([Vec3; 4], Vec3); 6] = [
        (
            [
                Vec3::new(min.x, min.y, min.z),
                Vec3::new(max.x, min.y, min.z),
                Vec3::new(max.x, min.y, max.z),
                Vec3::new(min.x, min.y, max.z),
            ],
            Vec3::NEG_Y,
        ),
        (
            [
                Vec3::new(min.x, max.y, max.z),
                Vec3::new(min.x, max.y, min.z),
                Vec3::new(min.x, min.y, min.z),
                Vec3::new(min.x, min.y, max.z),
            ],
            Vec3::NEG_X,
        ),
        (
            [
                Vec3::new(min.x, min.y, min.z),
                Vec3::new(min.x, max.y, min.z),
                Vec3::new(max.x, max.y, min.z),
                Vec3::new(max.x, min.y, min.z),
            ],
            Vec3::NEG_Z,
        ),
        (
            [
                Vec3::new(max.x, min.y, min.z),
                Vec3::new(max.x, max.y, min.z),
                Vec3::new(max.x, max.y, max.z),
                Vec3::new(max.x, min.y, max.z),
            ],
            Vec3::X,
        ),
        (
            [
                Vec3::new(max.x, min.y, max.z),
                Vec3::new(max.x, max.y, max.z),
                Vec3::new(min.x, max.y, max.z),
                Vec3::new(min.x, min.y, max.z),
            ],
            Vec3::Z,
        ),
        (
            [
                Vec3::new(min.x, max.y, min.z),
                Vec3::new(min.x, max.y, max.z),
                Vec3::new(max.x, max.y, max.z),
                Vec3::new(max.x, max.y, min.z),
            ],
            Vec3::Y,
        ),
    ];
    let corner_uvs = [Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];

    let mut mesh = MeshData::default();
    for (face, (corners, normal)) in faces.iter().enumerate() {
        let base = (face * 4) as u16;
        mesh.positions.extend_from_slice(corners);
        mesh.normals.extend_from_slice(&[*normal; 4]);
        mesh.tex_coords.extend_from_slice(&corner_uvs);
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    mesh
}

/// A unit cone standing on the XZ plane with its apex at `(0, 1, 0)`.
pub fn cone(divisions: u16) -> MeshData {
    let divisions = clamp_divisions(divisions);
    let delta_theta = TAU / f32::from(divisions);

    let mut mesh = MeshData::default();
    for i in 0..divisions {
        let theta = delta_theta * f32::from(i);
        let rim = Vec3::new(theta.cos(), 0.0, theta.sin());
        mesh.positions.push(rim);
        mesh.normals.push(rim);
        mesh.tex_coords
            .push(Vec2::new(f32::from(i) / f32::from(divisions), 0.0));
    }
    let apex = divisions;
    let base_center = divisions + 1;
    mesh.positions.extend_from_slice(&[Vec3::Y, Vec3::ZERO]);
    mesh.normals.extend_from_slice(&[Vec3::Y, Vec3::NEG_Y]);
    mesh.tex_coords.extend_from_slice(&[Vec2::new(0.5, 1.0), Vec2::splat(0.5)]);

    for i in 0..divisions {
        let next = (i + 1) % divisions;
        mesh.indices
            .extend_from_slice(&[i, apex, next, i, next, base_center]);
    }
    mesh
}

/// A cylinder of height 1 and radius 0.5 centered on the origin, with
/// capped ends.
pub fn cylinder(divisions: u16) -> MeshData {
    let divisions = clamp_divisions(divisions);
    let d = divisions;
    let delta_theta = TAU / f32::from(d);

    let ring: Vec<(f32, f32)> = (0..d)
        .map(|i| {
            let theta = delta_theta * f32::from(i);
            (theta.cos(), -theta.sin())
        })
        .collect();

    let mut mesh = MeshData::default();
    // Side rings (outward normals), then cap rings (axial normals).
    let rings = [
        (0.5, None),
        (-0.5, None),
        (0.5, Some(Vec3::Y)),
        (-0.5, Some(Vec3::NEG_Y)),
    ];
    for (y, cap_normal) in rings {
        for (i, &(x, z)) in ring.iter().enumerate() {
            mesh.positions.push(Vec3::new(x * 0.5, y, z * 0.5));
            mesh.normals
                .push(cap_normal.unwrap_or(Vec3::new(x, 0.0, z)));
            mesh.tex_coords
                .push(Vec2::new(i as f32 / f32::from(d), y + 0.5));
        }
    }
    let top_center = 4 * d;
    let bottom_center = 4 * d + 1;
    mesh.positions
        .extend_from_slice(&[Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, -0.5, 0.0)]);
    mesh.normals.extend_from_slice(&[Vec3::Y, Vec3::NEG_Y]);
    mesh.tex_coords.extend_from_slice(&[Vec2::splat(0.5); 2]);

    for i in 0..d {
        let next = (i + 1) % d;
        mesh.indices.extend_from_slice(&[
            i,
            i + d,
            next,
            next,
            i + d,
            next + d,
            i + 2 * d,
            next + 2 * d,
            top_center,
            next + 3 * d,
            i + 3 * d,
            bottom_center,
        ]);
    }
    mesh
}

/// A single segment from `start` to `end`.
pub fn line(start: Vec3, end: Vec3) -> MeshData {
    lines(vec![start, end], vec![0, 1])
}

/// A unit grid in the XY plane centered on the origin, with `divisions`
/// cells per side.
pub fn grid(divisions: u16) -> MeshData {
    let divisions = divisions.max(1);
    let n = divisions + 1;
    let scale = f32::from(divisions);
    let offset = Vec3::new(0.5, 0.5, 0.0);
    let at = |x: u16, y: u16| Vec3::new(f32::from(x), f32::from(y), 0.0) / scale - offset;

    // Bottom edge, left edge, top edge, right edge.
    let mut positions = Vec::with_capacity(usize::from(n) * 4);
    positions.extend((0..n).map(|j| at(j, 0)));
    positions.extend((0..n).map(|j| at(0, j)));
    positions.extend((0..n).map(|j| at(j, divisions)));
    positions.extend((0..n).map(|j| at(divisions, j)));

    // Each point of the first two edges connects to its opposite point.
    let indices = (0..2 * n).flat_map(|i| [i, i + 2 * n]).collect();
    lines(positions, indices)
}

/// A circle of radius 0.5 in the XY plane, as a closed line loop.
pub fn circle(divisions: u16) -> MeshData {
    let divisions = clamp_divisions(divisions);
    let delta_theta = TAU / f32::from(divisions);
    let positions = (0..divisions)
        .map(|i| {
            let theta = delta_theta * f32::from(i);
            Vec3::new(theta.cos(), theta.sin(), 0.0) * 0.5
        })
        .collect();
    let indices = (0..divisions)
        .flat_map(|i| [i, (i + 1) % divisions])
        .collect();
    lines(positions, indices)
}
