//! WGSL sources for the compute stages and the sprite renderer.
//!
//! Struct definitions are shared with the host through [`PARTICLE_WGSL`],
//! [`ATTRACTOR_WGSL`] and [`UNIFORMS_WGSL`] so both sides are generated from
//! the same text.

use crate::attractor::ATTRACTOR_WGSL;
use crate::particle::{PARTICLE_WGSL, WORKGROUP_SIZE};
use crate::uniforms::UNIFORMS_WGSL;

pub const RESET_ENTRY: &str = "reset";
pub const BUILD_GRID_ENTRY: &str = "build_grid";
pub const INTEGRATE_ENTRY: &str = "integrate";
pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Vertices per particle quad (two triangles).
pub const QUAD_VERTICES: u32 = 6;

/// Squared-pixel softening added to attractor distances.
const SOFTENING: f32 = 100.0;

/// The compute module holding all three stages.
///
/// Bindings:
/// - group 0: global uniforms
/// - group 1: particles, cell heads, per-particle next pointers
/// - group 2: simulation uniforms, static simulation uniforms, attractors
pub fn compute_shader_source() -> String {
    format!(
        r#"{PARTICLE_WGSL}
{ATTRACTOR_WGSL}
{UNIFORMS_WGSL}

const EMPTY: i32 = -1;
const SOFTENING: f32 = {SOFTENING:?};

@group(0) @binding(0) var<uniform> globals: GlobalUniforms;

@group(1) @binding(0) var<storage, read_write> particles: array<Particle>;
@group(1) @binding(1) var<storage, read_write> heads: array<atomic<i32>>;
@group(1) @binding(2) var<storage, read_write> lists: array<i32>;

@group(2) @binding(0) var<uniform> sim: SimulationUniforms;
@group(2) @binding(1) var<uniform> staticSim: StaticSimulationUniforms;
@group(2) @binding(2) var<storage, read> attractors: array<Attractor>;

fn cell_of(pos: vec2<f32>) -> vec2<i32> {{
    let cell = vec2<i32>(floor(pos / globals.gridCellSizeInPixels));
    return clamp(cell, vec2<i32>(0), globals.gridSize - vec2<i32>(1));
}}

fn cell_index(cell: vec2<i32>) -> i32 {{
    return cell.y * globals.gridSize.x + cell.x;
}}

fn is_active(index: u32) -> bool {{
    return index < globals.particleCount && index < arrayLength(&particles);
}}

// Acceleration towards `center`, magnitude attractorMass / r^2.
fn attraction(pos: vec2<f32>, center: vec2<f32>) -> vec2<f32> {{
    let delta = center - pos;
    let dist2 = dot(delta, delta) + SOFTENING;
    return delta * (staticSim.attractorMass / (dist2 * sqrt(dist2)));
}}

@compute @workgroup_size({WORKGROUP_SIZE})
fn {RESET_ENTRY}(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= arrayLength(&heads) {{
        return;
    }}
    atomicStore(&heads[index], EMPTY);
}}

@compute @workgroup_size({WORKGROUP_SIZE})
fn {BUILD_GRID_ENTRY}(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if !is_active(index) {{
        return;
    }}

    let cell = cell_of(particles[index].nextPos);
    particles[index].cellIndexStart = cell;

    // Swap ourselves in as the new head and link to the old one.
    let previous = atomicExchange(&heads[cell_index(cell)], i32(index));
    lists[index] = previous;
}}

@compute @workgroup_size({WORKGROUP_SIZE})
fn {INTEGRATE_ENTRY}(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if !is_active(index) {{
        return;
    }}

    let dt = sim.deltaTime;
    let selfIndex = i32(index);
    var p = particles[index];

    // Attractors, skipping the sentinel at 0
    var acceleration = vec2<f32>(0.0);
    let attractorCount = arrayLength(&attractors);
    for (var a = 1u; a < attractorCount; a++) {{
        let attractor = attractors[a];
        if attractor.direction != 0.0 {{
            acceleration += attraction(p.nextPos, attractor.pos) * attractor.direction;
        }}
    }}
    if sim.isAttractorEnabled != 0u {{
        acceleration += attraction(p.nextPos, sim.attractorPos);
    }}

    p.temperature = max(p.temperature - staticSim.cooldownRate * dt, 0.0);

    // Collisions against the shuffled 3x3 neighborhood
    let lastPartner = p.collisionOtherIndex;
    p.collisionOtherIndex = EMPTY;
    let contact = 2.0 * globals.particleSize;
    var collisions = 0u;

    for (var ix = 0; ix < 3 && collisions < staticSim.maxColl; ix++) {{
        for (var iy = 0; iy < 3 && collisions < staticSim.maxColl; iy++) {{
            let cell = p.cellIndexStart + vec2<i32>(p.cellsOffsetsX[ix], p.cellsOffsetsY[iy]);
            if any(cell < vec2<i32>(0)) || any(cell >= globals.gridSize) {{
                continue;
            }}

            var other = atomicLoad(&heads[cell_index(cell)]);
            while other != EMPTY && collisions < staticSim.maxColl {{
                if other != selfIndex && other != lastPartner {{
                    let q = particles[other];
                    let delta = q.nextPos - p.nextPos;
                    let dist2 = dot(delta, delta);
                    if dist2 > 0.0 && dist2 < contact * contact {{
                        let dist = sqrt(dist2);
                        let normal = delta / dist;
                        let approach = dot(p.nextVel - q.nextVel, normal);
                        if approach > 0.0 {{
                            let impulse = (1.0 + staticSim.E) * q.mass / (p.mass + q.mass) * approach;
                            p.nextVel -= impulse * normal;
                            p.nextPos -= normal * (contact - dist) * 0.5;
                            p.temperature += staticSim.tempOnHit;
                            p.collisionOtherIndex = other;
                            collisions++;
                        }}
                    }}
                }}
                other = lists[other];
            }}
        }}
    }}

    p.nextVel += acceleration * dt;
    p.nextPos += p.nextVel * dt;

    // Reflect off the canvas edges
    let bounds = globals.canvasSize;
    if p.nextPos.x < 0.0 {{
        p.nextVel.x = abs(p.nextVel.x);
    }} else if p.nextPos.x > bounds.x {{
        p.nextVel.x = -abs(p.nextVel.x);
    }}
    if p.nextPos.y < 0.0 {{
        p.nextVel.y = abs(p.nextVel.y);
    }} else if p.nextPos.y > bounds.y {{
        p.nextVel.y = -abs(p.nextVel.y);
    }}
    p.nextPos = clamp(p.nextPos, vec2<f32>(0.0), bounds);

    particles[index] = p;
}}
"#
    )
}

/// The sprite renderer. One instance per particle slot, six vertices each.
///
/// Bindings:
/// - group 0: global uniforms
/// - group 1: particles (read-only)
/// - group 2: sprite sampler, sprite texture, render uniforms
pub fn render_shader_source() -> String {
    format!(
        r#"{PARTICLE_WGSL}
{UNIFORMS_WGSL}

@group(0) @binding(0) var<uniform> globals: GlobalUniforms;

@group(1) @binding(0) var<storage, read> particles: array<Particle>;

@group(2) @binding(0) var spriteSampler: sampler;
@group(2) @binding(1) var spriteTexture: texture_2d<f32>;
@group(2) @binding(2) var<uniform> renderUniforms: RenderUniforms;

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec3<f32>,
}};

@vertex
fn {VERTEX_ENTRY}(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VertexOutput {{
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );

    var out: VertexOutput;
    out.uv = vec2<f32>(0.0);
    out.color = vec3<f32>(0.0);

    // Padding slot: park the quad outside the clip volume.
    if instance_index >= globals.particleCount {{
        out.clip_position = vec4<f32>(2.0, 2.0, 2.0, 1.0);
        return out;
    }}

    let corner = quad_vertices[vertex_index];
    let p = particles[instance_index];
    let pixel = p.nextPos + corner * globals.particleSize;
    let ndc = pixel / globals.canvasSize * 2.0 - vec2<f32>(1.0);

    out.clip_position = vec4<f32>(ndc, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x, -corner.y) * 0.5 + vec2<f32>(0.5);
    out.color = mix(renderUniforms.color1, renderUniforms.color2, clamp(p.temperature, 0.0, 1.0));
    return out;
}}

@fragment
fn {FRAGMENT_ENTRY}(in: VertexOutput) -> @location(0) vec4<f32> {{
    let sprite = textureSample(spriteTexture, spriteSampler, in.uv);
    return vec4<f32>(in.color * sprite.rgb, sprite.a);
}}
"#
    )
}
