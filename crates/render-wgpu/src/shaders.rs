const VOLUME_SHADER_HEAD: &str = r#"
struct Frame {
    mvp: mat4x4<f32>,
    inv_view: mat4x4<f32>,
    inv_model: mat4x4<f32>,
    viewport: vec4<f32>,
    camera_position: vec4<f32>,
    light_direction: vec4<f32>,
    reserved: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(0) @binding(1)
var volume_tex: texture_3d<f32>;

@group(0) @binding(2)
var volume_sampler: sampler;
"#;

const MATERIALS_BOUND: &str = r#"
@group(0) @binding(3)
var<storage, read> materials: array<vec4<f32>>;

fn material_tint() -> vec3<f32> {
    return materials[0].rgb;
}
"#;

const MATERIALS_UNBOUND: &str = r#"
fn material_tint() -> vec3<f32> {
    return vec3<f32>(1.0);
}
"#;

const VOLUME_SHADER_BODY: &str = r#"
struct VertexInput {
    @location(0) position: vec4<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) object_position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = frame.mvp * in.position;
    out.object_position = in.position.xyz;
    out.uv = in.uv;
    return out;
}

const STEPS: i32 = 128;
const DENSITY_SCALE: f32 = 6.0;

// Distance along the ray where it enters the [-1, 1] box, clamped to the eye.
fn box_entry(origin: vec3<f32>, dir: vec3<f32>) -> f32 {
    let inv = 1.0 / dir;
    let t0 = (vec3<f32>(-1.0) - origin) * inv;
    let t1 = (vec3<f32>(1.0) - origin) * inv;
    let near = min(t0, t1);
    return max(max(max(near.x, near.y), near.z), 0.0);
}

fn sample_volume(p: vec3<f32>) -> vec4<f32> {
    return textureSampleLevel(volume_tex, volume_sampler, p * 0.5 + 0.5, 0.0);
}

fn shade(p: vec3<f32>, base: vec3<f32>) -> vec3<f32> {
    if (frame.light_direction.w == 0.0) {
        return base;
    }
    let h = 1.0 / 128.0;
    let grad = vec3<f32>(
        sample_volume(p + vec3<f32>(h, 0.0, 0.0)).a - sample_volume(p - vec3<f32>(h, 0.0, 0.0)).a,
        sample_volume(p + vec3<f32>(0.0, h, 0.0)).a - sample_volume(p - vec3<f32>(0.0, h, 0.0)).a,
        sample_volume(p + vec3<f32>(0.0, 0.0, h)).a - sample_volume(p - vec3<f32>(0.0, 0.0, h)).a,
    );
    let len = length(grad);
    if (len < 1e-5) {
        return base;
    }
    let normal = -grad / len;
    let diffuse = max(dot(normal, -frame.light_direction.xyz), 0.0);
    return base * (0.3 + 0.7 * diffuse);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let origin = (frame.inv_model * vec4<f32>(frame.camera_position.xyz, 1.0)).xyz;
    let exit = in.object_position;
    let span = exit - origin;
    let t_end = length(span);
    if (t_end < 1e-6) {
        return vec4<f32>(0.0);
    }
    let dir = span / t_end;
    let t_start = box_entry(origin, dir);
    if (t_start >= t_end) {
        return vec4<f32>(0.0);
    }

    let step = (t_end - t_start) / f32(STEPS);
    let tint = material_tint();
    var color = vec3<f32>(0.0);
    var alpha = 0.0;
    for (var i = 0; i < STEPS; i++) {
        let p = origin + dir * (t_start + (f32(i) + 0.5) * step);
        let s = sample_volume(p);
        let a = clamp(s.a * step * DENSITY_SCALE, 0.0, 1.0);
        color += (1.0 - alpha) * a * shade(p, s.rgb * tint);
        alpha += (1.0 - alpha) * a;
        if (alpha > 0.99) {
            break;
        }
    }
    return vec4<f32>(color, alpha);
}
"#;

/// Ray-march shader source. `with_materials` declares binding 3 as a
/// read-only storage array whose first entry tints the volume.
pub fn volume_shader(with_materials: bool) -> String {
    let materials = if with_materials {
        MATERIALS_BOUND
    } else {
        MATERIALS_UNBOUND
    };
    [VOLUME_SHADER_HEAD, materials, VOLUME_SHADER_BODY].concat()
}
